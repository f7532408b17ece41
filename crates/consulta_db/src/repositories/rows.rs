//! Manual row mapping shared by the SQL repositories.

use crate::error::DbError;
use chrono::{DateTime, Utc};
use consulta_common::models::{Booking, BookingStatus, Purchase, PurchaseStatus};
use sqlx::any::AnyRow;
use sqlx::Row;

pub(crate) const BOOKING_COLUMNS: &str = "id, user_id, purchase_id, plan_id, starts_at, \
    duration_minutes, status, meeting_id, join_url, start_url, calendar_event_id, notes, \
    reminder_72h_sent, reminder_24h_sent, reminder_1h_sent, cancellation_reason, \
    created_at, updated_at";

pub(crate) const PURCHASE_COLUMNS: &str =
    "id, user_id, product_id, payment_session_id, status, created_at";

pub(crate) fn to_timestamp(value: DateTime<Utc>) -> i64 {
    value.timestamp()
}

pub(crate) fn from_timestamp(table: &'static str, secs: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| DbError::CorruptRow {
        table,
        message: format!("timestamp {} out of range", secs),
    })
}

pub(crate) fn column<'r, T>(row: &'r AnyRow, table: &'static str, name: &str) -> Result<T, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get(name).map_err(|e| DbError::CorruptRow {
        table,
        message: format!("column {}: {}", name, e),
    })
}

pub(crate) fn booking_from_row(row: &AnyRow) -> Result<Booking, DbError> {
    const TABLE: &str = "bookings";
    let status: String = column(row, TABLE, "status")?;
    let status = status
        .parse::<BookingStatus>()
        .map_err(|message| DbError::CorruptRow { table: TABLE, message })?;

    Ok(Booking {
        id: column(row, TABLE, "id")?,
        user_id: column(row, TABLE, "user_id")?,
        purchase_id: column(row, TABLE, "purchase_id")?,
        plan_id: column(row, TABLE, "plan_id")?,
        starts_at: from_timestamp(TABLE, column(row, TABLE, "starts_at")?)?,
        duration_minutes: column(row, TABLE, "duration_minutes")?,
        status,
        meeting_id: column(row, TABLE, "meeting_id")?,
        join_url: column(row, TABLE, "join_url")?,
        start_url: column(row, TABLE, "start_url")?,
        calendar_event_id: column(row, TABLE, "calendar_event_id")?,
        notes: column(row, TABLE, "notes")?,
        reminder_72h_sent: column::<i64>(row, TABLE, "reminder_72h_sent")? != 0,
        reminder_24h_sent: column::<i64>(row, TABLE, "reminder_24h_sent")? != 0,
        reminder_1h_sent: column::<i64>(row, TABLE, "reminder_1h_sent")? != 0,
        cancellation_reason: column(row, TABLE, "cancellation_reason")?,
        created_at: from_timestamp(TABLE, column(row, TABLE, "created_at")?)?,
        updated_at: from_timestamp(TABLE, column(row, TABLE, "updated_at")?)?,
    })
}

pub(crate) fn purchase_from_row(row: &AnyRow) -> Result<Purchase, DbError> {
    const TABLE: &str = "purchases";
    let status: String = column(row, TABLE, "status")?;
    let status = status
        .parse::<PurchaseStatus>()
        .map_err(|message| DbError::CorruptRow { table: TABLE, message })?;

    Ok(Purchase {
        id: column(row, TABLE, "id")?,
        user_id: column(row, TABLE, "user_id")?,
        product_id: column(row, TABLE, "product_id")?,
        payment_session_id: column(row, TABLE, "payment_session_id")?,
        status,
        created_at: from_timestamp(TABLE, column(row, TABLE, "created_at")?)?,
    })
}
