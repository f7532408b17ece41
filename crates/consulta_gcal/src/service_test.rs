use crate::error::GcalError;
use crate::service::build_event;
use chrono::{TimeZone, Utc};
use consulta_common::services::{CalendarEventRequest, ProviderError};

fn request(attendees: Vec<&str>) -> CalendarEventRequest {
    CalendarEventRequest {
        summary: "Deep dive with Ada".to_string(),
        description: Some("Join: https://zoom.us/j/1".to_string()),
        start: Utc.with_ymd_and_hms(2031, 3, 4, 8, 0, 0).unwrap(),
        duration_minutes: 90,
        attendees: attendees.into_iter().map(String::from).collect(),
    }
}

#[test]
fn event_spans_the_session_in_utc() {
    let event = build_event(&request(vec![]), false);

    let start = event.start.unwrap();
    let end = event.end.unwrap();
    assert_eq!(
        start.date_time,
        Some(Utc.with_ymd_and_hms(2031, 3, 4, 8, 0, 0).unwrap())
    );
    assert_eq!(
        end.date_time,
        Some(Utc.with_ymd_and_hms(2031, 3, 4, 9, 30, 0).unwrap())
    );
    assert_eq!(start.time_zone.as_deref(), Some("UTC"));
    assert_eq!(
        event.description.as_deref(),
        Some("Join: https://zoom.us/j/1")
    );
}

#[test]
fn attendees_are_only_invited_when_enabled() {
    let without = build_event(&request(vec!["ada@example.com"]), false);
    assert!(without.attendees.is_none());

    let with = build_event(&request(vec!["ada@example.com"]), true);
    let emails: Vec<_> = with
        .attendees
        .unwrap()
        .into_iter()
        .filter_map(|a| a.email)
        .collect();
    assert_eq!(emails, vec!["ada@example.com".to_string()]);
}

#[test]
fn configuration_errors_are_not_treated_as_gone() {
    let err = GcalError::ConfigError("missing key".to_string());
    assert!(!err.is_gone());
    let provider_err: ProviderError = err.into();
    assert!(!provider_err.not_found);
    assert_eq!(provider_err.provider, "gcal");
}
