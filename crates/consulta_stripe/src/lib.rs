// --- File: crates/consulta_stripe/src/lib.rs ---

pub mod error;
pub mod logic;
pub mod service;

#[cfg(test)]
mod logic_test;

pub use error::StripeError;
pub use logic::{parse_paid_checkout, verify_stripe_signature};
pub use service::StripePaymentProvider;
