//! Atomic slot claims on top of the booking repository.

use chrono::{DateTime, Utc};
use consulta_common::models::Booking;
use consulta_db::{BookingRepository, NewBooking, ReservationOutcome};
use std::sync::Arc;
use tracing::{debug, info};

use crate::availability::AvailabilityCalculator;
use crate::error::SchedulingError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRequest {
    pub user_id: String,
    pub purchase_id: String,
    pub plan_id: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    /// A new pending booking now holds the interval.
    Created(Booking),
    /// The purchase already backed an active booking, which is returned unchanged.
    AlreadyBooked(Booking),
}

pub struct SlotReservation {
    calculator: Arc<AvailabilityCalculator>,
    bookings: Arc<dyn BookingRepository>,
}

impl SlotReservation {
    pub fn new(calculator: Arc<AvailabilityCalculator>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self {
            calculator,
            bookings,
        }
    }

    /// Claims `[starts_at, starts_at + duration)` for the purchase.
    ///
    /// The start is re-checked against the current availability before the
    /// write, so a slot the client saw earlier but which has since been taken
    /// or blocked yields `SlotConflict`. The write itself is the repository's
    /// atomic check-and-insert, which enforces the configured buffers as well.
    pub async fn reserve(&self, request: ReservationRequest) -> Result<Reservation, SchedulingError> {
        let rules = self.calculator.rules()?;
        let local_date = request
            .starts_at
            .with_timezone(&rules.time_zone)
            .date_naive();
        let open = self
            .calculator
            .compute_slots(local_date, request.duration_minutes)
            .await?;
        if !open.contains(&request.starts_at) {
            debug!(
                "Start {} is not among {} open slots on {}",
                request.starts_at,
                open.len(),
                local_date
            );
            return Err(SchedulingError::SlotConflict(format!(
                "{} is no longer available, please choose another slot",
                request.starts_at.with_timezone(&rules.time_zone).format("%Y-%m-%d %H:%M")
            )));
        }

        let outcome = self
            .bookings
            .reserve_slot(NewBooking {
                user_id: request.user_id,
                purchase_id: request.purchase_id,
                plan_id: request.plan_id,
                starts_at: request.starts_at,
                duration_minutes: request.duration_minutes,
                notes: request.notes,
                buffer_after_minutes: rules.buffer_after.num_minutes(),
                buffer_before_minutes: rules.buffer_before.num_minutes(),
            })
            .await?;

        match outcome {
            ReservationOutcome::Reserved(booking) => {
                info!(
                    "Reserved {} for booking {} (purchase {})",
                    booking.starts_at, booking.id, booking.purchase_id
                );
                Ok(Reservation::Created(booking))
            }
            ReservationOutcome::PurchaseAlreadyBooked(booking) => {
                info!(
                    "Purchase {} already backs booking {}",
                    booking.purchase_id, booking.id
                );
                Ok(Reservation::AlreadyBooked(booking))
            }
            ReservationOutcome::SlotTaken => Err(SchedulingError::SlotConflict(
                "the slot was just taken, please choose another slot".to_string(),
            )),
        }
    }
}
