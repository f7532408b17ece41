// --- File: crates/consulta_gcal/src/service.rs ---
//! Google Calendar implementation of the calendar provider.

use chrono::Duration;
use consulta_common::services::{BoxFuture, CalendarEventRequest, CalendarProvider, ProviderError};
use google_calendar3::api::{Event, EventAttendee, EventDateTime};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::HubType;
use crate::error::GcalError;

/// Google Calendar service implementation.
pub struct GoogleCalendarProvider {
    calendar_hub: Arc<HubType>,
    calendar_id: String,
    invite_attendees: bool,
}

impl GoogleCalendarProvider {
    pub fn new(calendar_hub: Arc<HubType>, calendar_id: String, invite_attendees: bool) -> Self {
        Self {
            calendar_hub,
            calendar_id,
            invite_attendees,
        }
    }
}

/// Translates an event request into the Calendar API shape. Times are sent in
/// UTC; Google renders them in each viewer's zone.
pub fn build_event(request: &CalendarEventRequest, invite_attendees: bool) -> Event {
    let end = request.start + Duration::minutes(request.duration_minutes);
    let attendees = if invite_attendees && !request.attendees.is_empty() {
        Some(
            request
                .attendees
                .iter()
                .map(|email| EventAttendee {
                    email: Some(email.clone()),
                    ..Default::default()
                })
                .collect(),
        )
    } else {
        None
    };

    Event {
        summary: Some(request.summary.clone()),
        description: request.description.clone(),
        start: Some(EventDateTime {
            date_time: Some(request.start),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(end),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        }),
        attendees,
        ..Default::default()
    }
}

impl CalendarProvider for GoogleCalendarProvider {
    fn create_event(&self, request: CalendarEventRequest) -> BoxFuture<'_, String, ProviderError> {
        Box::pin(async move {
            let event = build_event(&request, self.invite_attendees);
            let send_updates = if event.attendees.is_some() { "all" } else { "none" };

            let (_response, created) = self
                .calendar_hub
                .events()
                .insert(event, &self.calendar_id)
                .send_updates(send_updates)
                .doit()
                .await
                .map_err(GcalError::from)?;

            let event_id = created.id.ok_or(GcalError::MissingField("event id"))?;
            info!("Created calendar event {} at {}", event_id, request.start);
            Ok(event_id)
        })
    }

    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, (), ProviderError> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            let result = self
                .calendar_hub
                .events()
                .delete(&self.calendar_id, &event_id)
                .send_updates("none")
                .doit()
                .await;

            match result {
                Ok(_) => {
                    info!("Deleted calendar event {}", event_id);
                    Ok(())
                }
                Err(e) => {
                    let err = GcalError::from(e);
                    if err.is_gone() {
                        warn!("Calendar event {} was already gone", event_id);
                        return Ok(());
                    }
                    Err(err.into())
                }
            }
        })
    }
}
