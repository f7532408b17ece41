//! Repository modules for database access
//!
//! Each entity has an object-safe trait (so the scheduling core can hold an
//! `Arc<dyn ...>`) and a SQL implementation backed by [`crate::DbClient`].

pub mod availability;
pub mod availability_sql;
pub mod bookings;
pub mod bookings_sql;
pub mod purchases;
pub mod purchases_sql;
mod rows;
pub mod users_sql;

#[cfg(test)]
mod availability_sql_test;

pub use availability::AvailabilityRepository;
pub use availability_sql::SqlAvailabilityRepository;
pub use bookings::{BookingRepository, NewBooking, ReservationOutcome};
pub use bookings_sql::SqlBookingRepository;
pub use purchases::{NewPurchase, PurchaseRepository};
pub use purchases_sql::SqlPurchaseRepository;
pub use users_sql::SqlUserDirectory;
