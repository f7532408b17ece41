//! Threshold reminders for upcoming sessions.
//!
//! A sweep may run at any frequency. Each of the three flags on a booking is
//! set only after its email went out, and storage flips it at most once, so
//! repeated or overlapping sweeps never send a threshold twice for the same
//! booking once it has been recorded.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use consulta_common::models::{Booking, ReminderThreshold};
use consulta_common::services::{EmailProvider, ReminderMessage, UserDirectory};
use consulta_config::AppConfig;
use consulta_db::BookingRepository;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::SchedulingError;

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepFailure {
    pub booking_id: String,
    /// `None` when the booking failed before any threshold was attempted.
    pub threshold: Option<String>,
    pub message: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SweepReport {
    /// Candidate bookings examined.
    pub processed: usize,
    /// Reminder emails delivered.
    pub sent: usize,
    pub failures: Vec<SweepFailure>,
}

/// Thresholds whose lead time has been reached and whose flag is still unset.
pub fn due_thresholds(booking: &Booking, now: DateTime<Utc>) -> Vec<ReminderThreshold> {
    let until_start = booking.starts_at - now;
    ReminderThreshold::ALL
        .into_iter()
        .filter(|t| until_start <= t.lead_time() && !booking.reminder_sent(*t))
        .collect()
}

pub struct ReminderScheduler {
    config: Arc<AppConfig>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserDirectory>,
    email: Arc<dyn EmailProvider>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(
        config: Arc<AppConfig>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserDirectory>,
        email: Arc<dyn EmailProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            bookings,
            users,
            email,
            clock,
        }
    }

    /// Sends every due reminder. Per-booking failures end up in the report;
    /// only a failure to list candidates aborts the sweep.
    pub async fn run_reminder_sweep(&self) -> Result<SweepReport, SchedulingError> {
        let now = self.clock.now();
        let horizon = now + ReminderThreshold::Hours72.lead_time();
        let time_zone = Tz::from_str(&self.config.scheduling.time_zone)
            .map_err(|e| SchedulingError::Validation(format!("invalid time zone: {}", e)))?;

        let candidates = self.bookings.list_reminder_candidates(now, horizon).await?;
        let mut report = SweepReport {
            processed: candidates.len(),
            ..SweepReport::default()
        };

        for booking in &candidates {
            let due = due_thresholds(booking, now);
            if due.is_empty() {
                continue;
            }
            self.remind(booking, &due, time_zone, &mut report).await;
        }

        info!(
            "Reminder sweep: {} bookings, {} sent, {} failures",
            report.processed,
            report.sent,
            report.failures.len()
        );
        Ok(report)
    }

    async fn remind(
        &self,
        booking: &Booking,
        due: &[ReminderThreshold],
        time_zone: Tz,
        report: &mut SweepReport,
    ) {
        let user = match self.users.get_user(&booking.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                report.failures.push(SweepFailure {
                    booking_id: booking.id.clone(),
                    threshold: None,
                    message: format!("user {} not found", booking.user_id),
                });
                return;
            }
            Err(e) => {
                warn!("Owner lookup for booking {} failed: {}", booking.id, e);
                report.failures.push(SweepFailure {
                    booking_id: booking.id.clone(),
                    threshold: None,
                    message: e.to_string(),
                });
                return;
            }
        };

        let local_start = booking.starts_at.with_timezone(&time_zone);
        let plan_name = self
            .config
            .plan(&booking.plan_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| booking.plan_id.clone());

        for threshold in due {
            let message = ReminderMessage {
                to_email: user.email.clone(),
                to_name: user.name.clone(),
                plan_name: plan_name.clone(),
                date: local_start.format("%Y-%m-%d").to_string(),
                time: local_start.format("%H:%M").to_string(),
                duration_minutes: booking.duration_minutes,
                time_zone: self.config.scheduling.time_zone.clone(),
                join_url: booking.join_url.clone(),
                lead_time_tag: threshold.tag().to_string(),
            };

            if let Err(e) = self.email.send_reminder(message).await {
                warn!(
                    "{} reminder for booking {} not sent: {}",
                    threshold, booking.id, e
                );
                report.failures.push(SweepFailure {
                    booking_id: booking.id.clone(),
                    threshold: Some(threshold.tag().to_string()),
                    message: e.to_string(),
                });
                continue;
            }
            report.sent += 1;

            match self.bookings.mark_reminder_sent(&booking.id, *threshold).await {
                Ok(true) => debug!("{} reminder recorded for booking {}", threshold, booking.id),
                Ok(false) => debug!(
                    "{} reminder for booking {} was already recorded by another sweep",
                    threshold, booking.id
                ),
                Err(e) => {
                    warn!(
                        "{} reminder for booking {} sent but not recorded: {}",
                        threshold, booking.id, e
                    );
                    report.failures.push(SweepFailure {
                        booking_id: booking.id.clone(),
                        threshold: Some(threshold.tag().to_string()),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}
