//! Persistence for Consulta
//!
//! This crate owns the relational schema and the SQL repositories behind the
//! scheduling core: bookings (with the slot-claim table that makes reservations
//! atomic), purchases, weekly availability, calendar blocks and local users.
//! It talks to the database through SQLx's `Any` driver, so the same code runs
//! against SQLite (default) and PostgreSQL.
//!
//! # Example
//!
//! ```rust,no_run
//! use consulta_db::{DbClient, SqlBookingRepository};
//!
//! async fn setup() -> Result<SqlBookingRepository, consulta_db::error::DbError> {
//!     let db_client = DbClient::from_url("sqlite://data/consulta.db").await?;
//!     db_client.init_schema().await?;
//!     Ok(SqlBookingRepository::new(db_client))
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod schema;

// Register the SQLite driver when the crate is loaded
#[cfg(feature = "sqlite")]
mod sqlite_driver {
    #[allow(unused_imports)]
    use sqlx::sqlite::SqlitePoolOptions as _;
}

pub use client::DbClient;
pub use error::DbError;
pub use repositories::{
    AvailabilityRepository, BookingRepository, NewBooking, NewPurchase, PurchaseRepository,
    ReservationOutcome, SqlAvailabilityRepository, SqlBookingRepository, SqlPurchaseRepository,
    SqlUserDirectory,
};
