// --- File: crates/consulta_gcal/src/lib.rs ---
pub mod auth;
pub mod error;
pub mod service;

#[cfg(test)]
mod service_test;

pub use auth::{create_calendar_hub, HubType};
pub use error::GcalError;
pub use service::GoogleCalendarProvider;
