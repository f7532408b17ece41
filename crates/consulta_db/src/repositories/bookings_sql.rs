//! SQL implementation of the booking repository
//!
//! Reservation is a single transaction: purchase check, overlap check, booking
//! insert, then one `slot_claims` row per occupied cell. The claim table's
//! primary key rejects any overlapping insert that slipped past the check, so
//! the guarantee holds across processes as well. Buffers between bookings are
//! checked by the overlap query only; claims cover the bare interval.

use crate::error::{is_unique_violation, DbError};
use crate::repositories::bookings::{BookingRepository, NewBooking, ReservationOutcome};
use crate::repositories::rows::{
    booking_from_row, column, from_timestamp, to_timestamp, BOOKING_COLUMNS,
};
use crate::schema::claim_cells;
use crate::DbClient;
use chrono::{DateTime, Duration, Utc};
use consulta_common::models::{Booking, BookingStatus, MeetingDetails, ReminderThreshold};
use consulta_common::services::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

/// SQL implementation of the booking repository
#[derive(Debug, Clone)]
pub struct SqlBookingRepository {
    db_client: DbClient,
    /// Serializes reservations from this process so SQLite writers queue
    /// instead of failing with SQLITE_BUSY.
    reservation_lock: Arc<Mutex<()>>,
}

impl SqlBookingRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self {
            db_client,
            reservation_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn fetch_booking(&self, booking_id: &str) -> Result<Option<Booking>, DbError> {
        let query = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        let row = sqlx::query(&query)
            .bind(booking_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load booking {}: {}", booking_id, e);
                DbError::QueryError(e.to_string())
            })?;
        row.as_ref().map(booking_from_row).transpose()
    }
}

fn reminder_column(threshold: ReminderThreshold) -> &'static str {
    match threshold {
        ReminderThreshold::Hours72 => "reminder_72h_sent",
        ReminderThreshold::Hours24 => "reminder_24h_sent",
        ReminderThreshold::Hours1 => "reminder_1h_sent",
    }
}

impl BookingRepository for SqlBookingRepository {
    fn reserve_slot(&self, booking: NewBooking) -> BoxFuture<'_, ReservationOutcome, DbError> {
        Box::pin(async move {
            let _guard = self.reservation_lock.lock().await;

            // Second precision, matching what a reload from storage yields.
            let now = from_timestamp("bookings", to_timestamp(Utc::now()))?;
            let starts_at = to_timestamp(booking.starts_at);
            let ends_at =
                to_timestamp(booking.starts_at + Duration::minutes(booking.duration_minutes));
            debug!(
                "Reserving [{}, {}) for purchase {}",
                booking.starts_at, ends_at, booking.purchase_id
            );

            let mut tx = self.db_client.begin().await?;

            let existing_query = format!(
                "SELECT {} FROM bookings WHERE purchase_id = $1 AND status IN ('pending', 'confirmed')",
                BOOKING_COLUMNS
            );
            if let Some(row) = sqlx::query(&existing_query)
                .bind(&booking.purchase_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?
            {
                let existing = booking_from_row(&row)?;
                tx.rollback().await?;
                info!(
                    "Purchase {} already backs booking {}",
                    booking.purchase_id, existing.id
                );
                return Ok(ReservationOutcome::PurchaseAlreadyBooked(existing));
            }

            // Existing bookings must end buffer_after before this start and
            // begin buffer_before after this end.
            let overlap_row = sqlx::query(
                "SELECT COUNT(*) AS overlapping FROM bookings \
                 WHERE status IN ('pending', 'confirmed') AND starts_at < $1 AND ends_at > $2",
            )
            .bind(ends_at + booking.buffer_before_minutes.max(0) * 60)
            .bind(starts_at - booking.buffer_after_minutes.max(0) * 60)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
            let overlapping: i64 = column(&overlap_row, "bookings", "overlapping")?;
            if overlapping > 0 {
                tx.rollback().await?;
                debug!("Interval starting {} is already taken", booking.starts_at);
                return Ok(ReservationOutcome::SlotTaken);
            }

            let id = Uuid::new_v4().to_string();
            let insert = sqlx::query(
                r#"
                INSERT INTO bookings (
                    id, user_id, purchase_id, plan_id, starts_at, ends_at, duration_minutes,
                    status, notes, reminder_72h_sent, reminder_24h_sent, reminder_1h_sent,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, 0, $10, $10)
                "#,
            )
            .bind(&id)
            .bind(&booking.user_id)
            .bind(&booking.purchase_id)
            .bind(&booking.plan_id)
            .bind(starts_at)
            .bind(ends_at)
            .bind(booking.duration_minutes)
            .bind(BookingStatus::Pending.as_str())
            .bind(booking.notes.clone())
            .bind(to_timestamp(now))
            .execute(&mut *tx)
            .await;

            if let Err(e) = insert {
                if is_unique_violation(&e) {
                    // Lost a race on the one-active-booking-per-purchase index.
                    tx.rollback().await?;
                    return match self.find_active_booking_for_purchase(&booking.purchase_id).await? {
                        Some(existing) => Ok(ReservationOutcome::PurchaseAlreadyBooked(existing)),
                        None => Ok(ReservationOutcome::SlotTaken),
                    };
                }
                error!("Failed to insert booking: {}", e);
                return Err(DbError::QueryError(e.to_string()));
            }

            for cell in claim_cells(starts_at, ends_at) {
                let claim = sqlx::query("INSERT INTO slot_claims (slot_start, booking_id) VALUES ($1, $2)")
                    .bind(cell)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await;
                if let Err(e) = claim {
                    tx.rollback().await?;
                    if is_unique_violation(&e) {
                        debug!("Claim on cell {} already held", cell);
                        return Ok(ReservationOutcome::SlotTaken);
                    }
                    error!("Failed to claim slot cell {}: {}", cell, e);
                    return Err(DbError::QueryError(e.to_string()));
                }
            }

            tx.commit().await?;
            info!("Booking {} reserved at {}", id, booking.starts_at);

            Ok(ReservationOutcome::Reserved(Booking {
                id,
                user_id: booking.user_id,
                purchase_id: booking.purchase_id,
                plan_id: booking.plan_id,
                starts_at: booking.starts_at,
                duration_minutes: booking.duration_minutes,
                status: BookingStatus::Pending,
                meeting_id: None,
                join_url: None,
                start_url: None,
                calendar_event_id: None,
                notes: booking.notes,
                reminder_72h_sent: false,
                reminder_24h_sent: false,
                reminder_1h_sent: false,
                cancellation_reason: None,
                created_at: now,
                updated_at: now,
            }))
        })
    }

    fn find_booking(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move { self.fetch_booking(&booking_id).await })
    }

    fn find_active_booking_for_purchase(
        &self,
        purchase_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let purchase_id = purchase_id.to_string();
        Box::pin(async move {
            let query = format!(
                "SELECT {} FROM bookings WHERE purchase_id = $1 AND status IN ('pending', 'confirmed')",
                BOOKING_COLUMNS
            );
            let row = sqlx::query(&query)
                .bind(&purchase_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            row.as_ref().map(booking_from_row).transpose()
        })
    }

    fn list_active_bookings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError> {
        Box::pin(async move {
            let query = format!(
                "SELECT {} FROM bookings \
                 WHERE status IN ('pending', 'confirmed') AND starts_at < $1 AND ends_at > $2 \
                 ORDER BY starts_at",
                BOOKING_COLUMNS
            );
            let rows = sqlx::query(&query)
                .bind(to_timestamp(end))
                .bind(to_timestamp(start))
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            rows.iter().map(booking_from_row).collect()
        })
    }

    fn confirm_booking(
        &self,
        booking_id: &str,
        meeting: MeetingDetails,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                UPDATE bookings
                SET status = 'confirmed', meeting_id = $1, join_url = $2, start_url = $3,
                    calendar_event_id = $4, updated_at = $5
                WHERE id = $6 AND status = 'pending'
                "#,
            )
            .bind(&meeting.meeting_id)
            .bind(&meeting.join_url)
            .bind(&meeting.start_url)
            .bind(meeting.calendar_event_id.clone())
            .bind(to_timestamp(Utc::now()))
            .bind(&booking_id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to confirm booking {}: {}", booking_id, e);
                DbError::QueryError(e.to_string())
            })?;

            if result.rows_affected() == 0 {
                return Ok(None);
            }
            info!("Booking {} confirmed", booking_id);
            self.fetch_booking(&booking_id).await
        })
    }

    fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        let reason = reason.to_string();
        Box::pin(async move {
            let mut tx = self.db_client.begin().await?;

            let result = sqlx::query(
                "UPDATE bookings SET status = 'cancelled', cancellation_reason = $1, updated_at = $2 \
                 WHERE id = $3 AND status <> 'cancelled'",
            )
            .bind(&reason)
            .bind(to_timestamp(Utc::now()))
            .bind(&booking_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(None);
            }

            sqlx::query("DELETE FROM slot_claims WHERE booking_id = $1")
                .bind(&booking_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

            tx.commit().await?;
            info!("Booking {} cancelled: {}", booking_id, reason);
            self.fetch_booking(&booking_id).await
        })
    }

    fn list_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError> {
        Box::pin(async move {
            let query = format!(
                "SELECT {} FROM bookings \
                 WHERE status = 'confirmed' AND starts_at > $1 AND starts_at <= $2 \
                 AND (reminder_72h_sent = 0 OR reminder_24h_sent = 0 OR reminder_1h_sent = 0) \
                 ORDER BY starts_at",
                BOOKING_COLUMNS
            );
            let rows = sqlx::query(&query)
                .bind(to_timestamp(now))
                .bind(to_timestamp(until))
                .fetch_all(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            rows.iter().map(booking_from_row).collect()
        })
    }

    fn mark_reminder_sent(
        &self,
        booking_id: &str,
        threshold: ReminderThreshold,
    ) -> BoxFuture<'_, bool, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let flag = reminder_column(threshold);
            let query = format!(
                "UPDATE bookings SET {flag} = 1, updated_at = $1 WHERE id = $2 AND {flag} = 0"
            );
            let result = sqlx::query(&query)
                .bind(to_timestamp(Utc::now()))
                .bind(&booking_id)
                .execute(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;
            Ok(result.rows_affected() == 1)
        })
    }
}
