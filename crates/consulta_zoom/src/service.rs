use consulta_common::services::{
    BoxFuture, CreatedMeeting, MeetingProvider, MeetingRequest, ProviderError,
};
use consulta_config::ZoomConfig;
use std::sync::Arc;

use crate::logic::ZoomClient;

/// Zoom-backed meeting provider
pub struct ZoomMeetingProvider {
    client: ZoomClient,
}

impl ZoomMeetingProvider {
    pub fn new(config: Arc<ZoomConfig>) -> Self {
        Self {
            client: ZoomClient::new(config),
        }
    }
}

impl MeetingProvider for ZoomMeetingProvider {
    fn create_meeting(
        &self,
        request: MeetingRequest,
    ) -> BoxFuture<'_, CreatedMeeting, ProviderError> {
        Box::pin(async move { Ok(self.client.create_meeting(&request).await?) })
    }

    fn delete_meeting(&self, meeting_id: &str) -> BoxFuture<'_, (), ProviderError> {
        let meeting_id = meeting_id.to_string();
        Box::pin(async move { Ok(self.client.delete_meeting(&meeting_id).await?) })
    }
}
