// --- File: crates/consulta_common/src/services.rs ---
//! Collaborator abstractions for external services.
//!
//! The scheduling core only talks to payment, meeting, calendar, email and
//! user-directory backends through these traits. Concrete adapters live in
//! their own crates and are injected as `Arc<dyn ...>` at startup, which also
//! lets tests substitute in-memory fakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::models::UserProfile;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Failure reported by any external collaborator.
///
/// Adapters flatten their own error enums into this so the core can log and
/// collect failures without knowing which backend produced them.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} error: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub message: String,
    /// True when the remote side reported that the resource does not exist.
    pub not_found: bool,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            not_found: false,
        }
    }

    pub fn not_found(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            not_found: true,
        }
    }
}

// --- Payment ---

/// What the payment provider knows about a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub id: String,
    pub paid: bool,
    /// Product family tag from the session metadata (e.g. "advisory").
    pub product_tag: Option<String>,
    /// Internal product id from the session metadata.
    pub product_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub product_id: String,
    pub product_tag: String,
    pub product_name: String,
    /// Price in the smallest currency unit.
    pub unit_amount: i64,
    pub currency: String,
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

pub trait PaymentProvider: Send + Sync {
    /// Fetch a checkout session by id.
    fn retrieve_session(&self, session_id: &str) -> BoxFuture<'_, PaymentSession, ProviderError>;

    /// Start a hosted checkout for one product.
    fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> BoxFuture<'_, CheckoutSession, ProviderError>;

    /// Open the provider's self-service portal for a customer; returns its URL.
    fn create_portal_session(&self, customer_id: &str) -> BoxFuture<'_, String, ProviderError>;
}

// --- Video meetings ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRequest {
    pub topic: String,
    pub start: DateTime<Utc>,
    pub duration_minutes: i64,
    /// IANA zone the meeting is displayed in.
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedMeeting {
    pub id: String,
    pub join_url: String,
    pub start_url: String,
}

pub trait MeetingProvider: Send + Sync {
    fn create_meeting(&self, request: MeetingRequest)
        -> BoxFuture<'_, CreatedMeeting, ProviderError>;

    /// Deleting a meeting that no longer exists is not an error.
    fn delete_meeting(&self, meeting_id: &str) -> BoxFuture<'_, (), ProviderError>;
}

// --- Calendar ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub duration_minutes: i64,
    pub attendees: Vec<String>,
}

pub trait CalendarProvider: Send + Sync {
    /// Returns the id of the created event.
    fn create_event(&self, request: CalendarEventRequest) -> BoxFuture<'_, String, ProviderError>;

    /// Deleting an event that no longer exists is not an error.
    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, (), ProviderError>;
}

// --- Email ---

/// Everything a reminder email needs, already formatted for the advisor's zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub plan_name: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub duration_minutes: i64,
    pub time_zone: String,
    pub join_url: Option<String>,
    /// "72h", "24h" or "1h".
    pub lead_time_tag: String,
}

pub trait EmailProvider: Send + Sync {
    fn send_reminder(&self, message: ReminderMessage) -> BoxFuture<'_, (), ProviderError>;
}

// --- Users ---

pub trait UserDirectory: Send + Sync {
    /// Returns the id of the user with this email, creating the user if needed.
    fn find_or_create_user(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> BoxFuture<'_, String, ProviderError>;

    fn get_user(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, ProviderError>;
}
