//! External meeting and calendar artifacts for a booking.

use consulta_common::models::{Booking, MeetingDetails};
use consulta_common::services::{
    CalendarEventRequest, CalendarProvider, MeetingProvider, MeetingRequest, ProviderError,
    UserDirectory,
};
use consulta_config::AppConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of a best-effort teardown. Failures are recorded, never raised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub meeting_error: Option<String>,
    pub calendar_error: Option<String>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.meeting_error.is_none() && self.calendar_error.is_none()
    }
}

pub struct MeetingProvisioner {
    config: Arc<AppConfig>,
    meetings: Arc<dyn MeetingProvider>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    users: Arc<dyn UserDirectory>,
}

impl MeetingProvisioner {
    pub fn new(
        config: Arc<AppConfig>,
        meetings: Arc<dyn MeetingProvider>,
        calendar: Option<Arc<dyn CalendarProvider>>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            config,
            meetings,
            calendar,
            users,
        }
    }

    /// Creates the video meeting, then the calendar event pointing at it.
    /// Only the meeting is required; a calendar failure is logged and the
    /// details come back without an event id.
    pub async fn provision(
        &self,
        booking: &Booking,
        plan_name: &str,
    ) -> Result<MeetingDetails, ProviderError> {
        let meeting = self
            .meetings
            .create_meeting(MeetingRequest {
                topic: plan_name.to_string(),
                start: booking.starts_at,
                duration_minutes: booking.duration_minutes,
                time_zone: self.config.scheduling.time_zone.clone(),
            })
            .await?;
        info!("Meeting {} created for booking {}", meeting.id, booking.id);

        let calendar_event_id = match &self.calendar {
            Some(calendar) => {
                self.create_event(calendar.as_ref(), booking, plan_name, &meeting.join_url)
                    .await
            }
            None => None,
        };

        Ok(MeetingDetails {
            meeting_id: meeting.id,
            join_url: meeting.join_url,
            start_url: meeting.start_url,
            calendar_event_id,
        })
    }

    async fn create_event(
        &self,
        calendar: &dyn CalendarProvider,
        booking: &Booking,
        plan_name: &str,
        join_url: &str,
    ) -> Option<String> {
        let attendees = match self.users.get_user(&booking.user_id).await {
            Ok(Some(user)) => vec![user.email],
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Attendee lookup for booking {} failed: {}", booking.id, e);
                Vec::new()
            }
        };
        let mut description = format!("Join: {}", join_url);
        if let Some(notes) = booking.notes.as_deref().filter(|n| !n.is_empty()) {
            description.push_str("\n\n");
            description.push_str(notes);
        }

        let request = CalendarEventRequest {
            summary: plan_name.to_string(),
            description: Some(description),
            start: booking.starts_at,
            duration_minutes: booking.duration_minutes,
            attendees,
        };
        match calendar.create_event(request).await {
            Ok(event_id) => {
                info!("Calendar event {} created for booking {}", event_id, booking.id);
                Some(event_id)
            }
            Err(e) => {
                warn!(
                    "Calendar event for booking {} not created, continuing without it: {}",
                    booking.id, e
                );
                None
            }
        }
    }

    /// Deletes the meeting and calendar event concurrently. Either delete may
    /// fail without affecting the other.
    pub async fn teardown(&self, booking: &Booking) -> TeardownReport {
        let meeting = async {
            match booking.meeting_id.as_deref() {
                Some(id) => self.meetings.delete_meeting(id).await.err(),
                None => None,
            }
        };
        let calendar = async {
            match (&self.calendar, booking.calendar_event_id.as_deref()) {
                (Some(calendar), Some(id)) => calendar.delete_event(id).await.err(),
                _ => None,
            }
        };
        let (meeting_error, calendar_error) = tokio::join!(meeting, calendar);

        if let Some(e) = &meeting_error {
            warn!("Meeting teardown for booking {} failed: {}", booking.id, e);
        }
        if let Some(e) = &calendar_error {
            warn!("Calendar teardown for booking {} failed: {}", booking.id, e);
        }
        TeardownReport {
            meeting_error: meeting_error.map(|e| e.to_string()),
            calendar_error: calendar_error.map(|e| e.to_string()),
        }
    }
}
