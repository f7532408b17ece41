//! Booking repository trait

use crate::error::DbError;
use chrono::{DateTime, Utc};
use consulta_common::models::{Booking, MeetingDetails, ReminderThreshold};
use consulta_common::services::BoxFuture;

/// Input for a slot reservation. The booking starts out `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: String,
    pub purchase_id: String,
    pub plan_id: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub notes: Option<String>,
    /// Minimum gap to an earlier active booking's end.
    pub buffer_after_minutes: i64,
    /// Minimum gap to a later active booking's start.
    pub buffer_before_minutes: i64,
}

/// Result of an atomic check-and-insert.
#[derive(Debug, Clone, PartialEq)]
pub enum ReservationOutcome {
    Reserved(Booking),
    /// Another active booking overlaps the requested interval; nothing was written.
    SlotTaken,
    /// The purchase already backs an active booking; nothing was written.
    PurchaseAlreadyBooked(Booking),
}

pub trait BookingRepository: Send + Sync {
    /// Inserts a pending booking unless its interval, widened by the buffers,
    /// overlaps an active booking or its purchase already has one. Concurrent callers for the same interval
    /// see exactly one `Reserved`.
    fn reserve_slot(&self, booking: NewBooking) -> BoxFuture<'_, ReservationOutcome, DbError>;

    fn find_booking(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, DbError>;

    fn find_active_booking_for_purchase(
        &self,
        purchase_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError>;

    /// Pending and confirmed bookings overlapping `[start, end)`, earliest first.
    fn list_active_bookings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError>;

    /// Moves a pending booking to confirmed and records its meeting artifacts.
    /// `None` when the booking is missing or no longer pending.
    fn confirm_booking(
        &self,
        booking_id: &str,
        meeting: MeetingDetails,
    ) -> BoxFuture<'_, Option<Booking>, DbError>;

    /// Cancels the booking and releases its slot. `None` when the booking is
    /// missing or already cancelled.
    fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError>;

    /// Confirmed bookings starting in `(now, until]` with at least one reminder unsent.
    fn list_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError>;

    /// Sets one reminder flag. Returns true only for the call that flipped it.
    fn mark_reminder_sent(
        &self,
        booking_id: &str,
        threshold: ReminderThreshold,
    ) -> BoxFuture<'_, bool, DbError>;
}
