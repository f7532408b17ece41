// --- File: crates/consulta_common/src/models.rs ---
//! Domain records shared by the storage layer and the scheduling core.

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a booking. Only `Pending` and `Confirmed` occupy their interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Whether a booking in this state holds its slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            "no_show" => Ok(BookingStatus::NoShow),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Active,
    Cancelled,
    Refunded,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Active => "active",
            PurchaseStatus::Cancelled => "cancelled",
            PurchaseStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PurchaseStatus::Active),
            "cancelled" => Ok(PurchaseStatus::Cancelled),
            "refunded" => Ok(PurchaseStatus::Refunded),
            other => Err(format!("unknown purchase status '{}'", other)),
        }
    }
}

/// The three fixed reminder lead times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderThreshold {
    #[serde(rename = "72h")]
    Hours72,
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "1h")]
    Hours1,
}

impl ReminderThreshold {
    /// Longest lead time first.
    pub const ALL: [ReminderThreshold; 3] = [
        ReminderThreshold::Hours72,
        ReminderThreshold::Hours24,
        ReminderThreshold::Hours1,
    ];

    pub fn lead_time(&self) -> Duration {
        match self {
            ReminderThreshold::Hours72 => Duration::hours(72),
            ReminderThreshold::Hours24 => Duration::hours(24),
            ReminderThreshold::Hours1 => Duration::hours(1),
        }
    }

    /// Short tag used in templates and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ReminderThreshold::Hours72 => "72h",
            ReminderThreshold::Hours24 => "24h",
            ReminderThreshold::Hours1 => "1h",
        }
    }
}

impl fmt::Display for ReminderThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A reserved advisory session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub purchase_id: String,
    pub plan_id: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub status: BookingStatus,
    pub meeting_id: Option<String>,
    pub join_url: Option<String>,
    pub start_url: Option<String>,
    pub calendar_event_id: Option<String>,
    pub notes: Option<String>,
    pub reminder_72h_sent: bool,
    pub reminder_24h_sent: bool,
    pub reminder_1h_sent: bool,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(self.duration_minutes)
    }

    /// Half-open interval overlap with `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.starts_at < end && self.ends_at() > start
    }

    pub fn reminder_sent(&self, threshold: ReminderThreshold) -> bool {
        match threshold {
            ReminderThreshold::Hours72 => self.reminder_72h_sent,
            ReminderThreshold::Hours24 => self.reminder_24h_sent,
            ReminderThreshold::Hours1 => self.reminder_1h_sent,
        }
    }

    pub fn fully_reminded(&self) -> bool {
        ReminderThreshold::ALL
            .iter()
            .all(|threshold| self.reminder_sent(*threshold))
    }
}

/// Meeting artifacts written onto a booking when it is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub meeting_id: String,
    pub join_url: String,
    pub start_url: String,
    pub calendar_event_id: Option<String>,
}

/// Proof that a user paid for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub payment_session_id: String,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}

/// Recurring open hours on one weekday, in the advisor's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAvailabilityWindow {
    pub id: String,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub active: bool,
}

/// An explicit exception (vacation, holiday) that removes availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarBlock {
    pub id: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}
