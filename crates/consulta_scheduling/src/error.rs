// --- File: crates/consulta_scheduling/src/error.rs ---
use axum::response::{IntoResponse, Response};
use consulta_common::{external_service_error, ConsultaError, HttpStatusCode};
use consulta_db::DbError;
use thiserror::Error;

/// Failures of the scheduling operations, one variant per caller-visible outcome.
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// Malformed or out-of-range input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Payment session unknown, unpaid, or not for an advisory product
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// Paid session lacks the identity fields needed to record the purchase
    #[error("Incomplete payment data: {0}")]
    IncompletePaymentData(String),

    #[error("Purchase {0} is not active")]
    InactivePurchase(String),

    /// Requested interval is taken; re-query availability and retry
    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Video meeting could not be created; the reservation was released
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl HttpStatusCode for SchedulingError {
    fn status_code(&self) -> u16 {
        match self {
            SchedulingError::Validation(_) => 400,
            SchedulingError::InvalidPayment(_) => 400,
            SchedulingError::IncompletePaymentData(_) => 400,
            SchedulingError::InactivePurchase(_) => 403,
            SchedulingError::SlotConflict(_) => 409,
            SchedulingError::NotFound(_) => 404,
            SchedulingError::ProvisioningFailed(_) => 502,
            SchedulingError::Unauthorized(_) => 403,
            SchedulingError::Storage(_) => 500,
        }
    }
}

impl From<SchedulingError> for ConsultaError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(msg) => ConsultaError::ValidationError(msg),
            SchedulingError::InvalidPayment(msg) => ConsultaError::PaymentError(msg),
            SchedulingError::IncompletePaymentData(msg) => ConsultaError::PaymentError(msg),
            SchedulingError::InactivePurchase(id) => {
                ConsultaError::ForbiddenError(format!("Purchase {} is not active", id))
            }
            SchedulingError::SlotConflict(msg) => ConsultaError::ConflictError(msg),
            SchedulingError::NotFound(msg) => ConsultaError::NotFoundError(msg),
            SchedulingError::ProvisioningFailed(msg) => {
                external_service_error("Meeting provider", msg)
            }
            SchedulingError::Unauthorized(msg) => ConsultaError::ForbiddenError(msg),
            SchedulingError::Storage(e) => e.into(),
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        ConsultaError::from(self).into_response()
    }
}
