// --- File: crates/consulta_scheduling/src/lib.rs ---
//! Advisory session scheduling.
//!
//! Components, leaf first:
//! - [`AvailabilityCalculator`]: bookable start times for a day
//! - [`SlotReservation`]: atomic claim of one interval
//! - [`PaymentReconciler`]: payment session to purchase, with bounded retry
//! - [`MeetingProvisioner`]: video meeting and calendar event per booking
//! - [`BookingOrchestrator`]: booking creation and cancellation
//! - [`ReminderScheduler`]: 72h / 24h / 1h reminder sweep
//!
//! Storage and external services are injected as trait objects; the axum
//! routes in [`routes`] expose the operations over HTTP.

pub mod auth; // Shared-secret guard for internal routes
pub mod availability;
pub mod clock;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod provisioner;
pub mod reconciler;
pub mod reminders;
pub mod reservation;
pub mod routes;
#[cfg(feature = "openapi")]
pub mod doc;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod reconciler_test;

pub use availability::AvailabilityCalculator;
pub use clock::{Clock, Delay, SystemClock, TokioDelay};
pub use error::SchedulingError;
pub use handlers::SchedulingState;
pub use orchestrator::BookingOrchestrator;
pub use provisioner::MeetingProvisioner;
pub use reconciler::PaymentReconciler;
pub use reminders::ReminderScheduler;
pub use reservation::SlotReservation;
pub use routes::routes;
