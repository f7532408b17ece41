//! Table layout shared by all SQL repositories.
//!
//! Timestamps are unix seconds and flags are 0/1, both as BIGINT, because the
//! `Any` driver cannot decode chrono or bool columns portably.

/// Width of one cell in `slot_claims`, in seconds.
///
/// Slot grids, plan durations and zone offsets are all whole minutes, so every
/// bookable boundary falls on a cell edge and adjacent bookings never share one.
pub const CLAIM_CELL_SECONDS: i64 = 60;

pub(crate) const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS purchases (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        product_id TEXT NOT NULL,
        payment_session_id TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        purchase_id TEXT NOT NULL,
        plan_id TEXT NOT NULL,
        starts_at BIGINT NOT NULL,
        ends_at BIGINT NOT NULL,
        duration_minutes BIGINT NOT NULL,
        status TEXT NOT NULL,
        meeting_id TEXT,
        join_url TEXT,
        start_url TEXT,
        calendar_event_id TEXT,
        notes TEXT,
        reminder_72h_sent BIGINT NOT NULL DEFAULT 0,
        reminder_24h_sent BIGINT NOT NULL DEFAULT 0,
        reminder_1h_sent BIGINT NOT NULL DEFAULT 0,
        cancellation_reason TEXT,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bookings_starts_at ON bookings (starts_at)",
    // A purchase pays for exactly one live session.
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_purchase
        ON bookings (purchase_id)
        WHERE status IN ('pending', 'confirmed')
    "#,
    // One row per occupied cell; the primary key is the no-overlap guarantee.
    r#"
    CREATE TABLE IF NOT EXISTS slot_claims (
        slot_start BIGINT PRIMARY KEY,
        booking_id TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_slot_claims_booking ON slot_claims (booking_id)",
    r#"
    CREATE TABLE IF NOT EXISTS availability_windows (
        id TEXT PRIMARY KEY,
        weekday BIGINT NOT NULL,
        start_minute BIGINT NOT NULL,
        end_minute BIGINT NOT NULL,
        active BIGINT NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendar_blocks (
        id TEXT PRIMARY KEY,
        starts_at BIGINT NOT NULL,
        ends_at BIGINT NOT NULL,
        reason TEXT
    )
    "#,
];

/// Start of every claim cell touched by `[start, end)`, both in unix seconds.
pub fn claim_cells(start: i64, end: i64) -> Vec<i64> {
    let mut cells = Vec::new();
    let mut cell = start.div_euclid(CLAIM_CELL_SECONDS) * CLAIM_CELL_SECONDS;
    while cell < end {
        cells.push(cell);
        cell += CLAIM_CELL_SECONDS;
    }
    cells
}
