use chrono::{DateTime, Duration, SecondsFormat, Utc};
use consulta_common::services::{CreatedMeeting, MeetingRequest};
use consulta_common::HTTP_CLIENT;
use consulta_config::ZoomConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::ZoomError;

/// Tokens are refreshed this long before Zoom says they expire.
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Zoom meeting type for a meeting with a fixed start time.
const SCHEDULED_MEETING: u8 = 2;

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_after: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
struct MeetingSettings {
    join_before_host: bool,
    waiting_room: bool,
}

#[derive(Serialize, Debug)]
struct CreateMeetingBody<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    meeting_type: u8,
    start_time: String,
    duration: i64,
    timezone: &'a str,
    settings: MeetingSettings,
}

#[derive(Deserialize, Debug)]
struct MeetingResponse {
    /// Zoom returns numeric ids; large enough to need u64.
    id: u64,
    join_url: String,
    start_url: String,
}

/// Thin Zoom REST client holding a cached OAuth token.
pub struct ZoomClient {
    config: Arc<ZoomConfig>,
    token: Mutex<Option<CachedToken>>,
}

impl ZoomClient {
    pub fn new(config: Arc<ZoomConfig>) -> Self {
        Self {
            config,
            token: Mutex::new(None),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Returns a valid access token, fetching a new one when the cached token
    /// is missing or about to expire. Concurrent callers share one refresh.
    pub async fn access_token(&self) -> Result<String, ZoomError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }

        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(ZoomError::ConfigError(
                "zoom.client_id and zoom.client_secret are required".to_string(),
            ));
        }

        debug!("Requesting Zoom access token");
        let url = format!("{}/oauth/token", self.config.oauth_base.trim_end_matches('/'));
        let response = HTTP_CLIENT
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", self.config.account_id.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("Zoom token request returned {}: {}", status, body);
            return Err(ZoomError::AuthError(format!("{} - {}", status, body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECONDS).max(0);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_after: Utc::now() + Duration::seconds(lifetime),
        });
        Ok(token.access_token)
    }

    /// Schedules a meeting hosted by the configured Zoom user.
    pub async fn create_meeting(&self, request: &MeetingRequest) -> Result<CreatedMeeting, ZoomError> {
        let token = self.access_token().await?;
        let body = CreateMeetingBody {
            topic: &request.topic,
            meeting_type: SCHEDULED_MEETING,
            start_time: request.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            duration: request.duration_minutes,
            timezone: &request.time_zone,
            settings: MeetingSettings {
                join_before_host: false,
                waiting_room: true,
            },
        };

        let response = HTTP_CLIENT
            .post(self.api_url(&format!("/users/{}/meetings", self.config.user_id)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("Zoom meeting creation returned {}: {}", status, text);
            return Err(ZoomError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }

        let meeting: MeetingResponse = serde_json::from_str(&text)?;
        info!("Created Zoom meeting {} at {}", meeting.id, request.start);
        Ok(CreatedMeeting {
            id: meeting.id.to_string(),
            join_url: meeting.join_url,
            start_url: meeting.start_url,
        })
    }

    /// Deletes a meeting; a meeting Zoom no longer knows about counts as deleted.
    pub async fn delete_meeting(&self, meeting_id: &str) -> Result<(), ZoomError> {
        let token = self.access_token().await?;
        let response = HTTP_CLIENT
            .delete(self.api_url(&format!("/meetings/{}", meeting_id)))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            info!("Zoom meeting {} removed (status {})", meeting_id, status);
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        error!("Zoom meeting deletion returned {}: {}", status, text);
        Err(ZoomError::ApiError {
            status_code: status.as_u16(),
            message: text,
        })
    }
}
