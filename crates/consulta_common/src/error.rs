// --- File: crates/consulta_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Consulta errors.
///
/// This enum provides the HTTP-facing error taxonomy. Each crate keeps its own
/// error enum and implements `From<SpecificError> for ConsultaError`.
#[derive(Error, Debug)]
pub enum ConsultaError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller could not be authenticated
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// The caller is known but not allowed to act on the resource
    #[error("Forbidden: {0}")]
    ForbiddenError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A payment reference could not be used
    #[error("Payment error: {0}")]
    PaymentError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., slot already taken)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for ConsultaError {
    fn status_code(&self) -> u16 {
        match self {
            ConsultaError::HttpError(_) => 500,
            ConsultaError::ParseError(_) => 400,
            ConsultaError::ConfigError(_) => 500,
            ConsultaError::AuthError(_) => 401,
            ConsultaError::ForbiddenError(_) => 403,
            ConsultaError::ValidationError(_) => 400,
            ConsultaError::PaymentError(_) => 400,
            ConsultaError::DatabaseError(_) => 500,
            ConsultaError::ExternalServiceError { .. } => 502,
            ConsultaError::ConflictError(_) => 409,
            ConsultaError::NotFoundError(_) => 404,
            ConsultaError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for ConsultaError {
    fn from(err: reqwest::Error) -> Self {
        ConsultaError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for ConsultaError {
    fn from(err: serde_json::Error) -> Self {
        ConsultaError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> ConsultaError {
    ConsultaError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> ConsultaError {
    ConsultaError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> ConsultaError {
    ConsultaError::NotFoundError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> ConsultaError {
    ConsultaError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> ConsultaError {
    ConsultaError::InternalError(message.to_string())
}
