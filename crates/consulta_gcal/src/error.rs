use consulta_common::services::ProviderError;
use consulta_common::{external_service_error, ConsultaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Google authentication error: {0}")]
    AuthError(String),
    #[error("Google Calendar configuration error: {0}")]
    ConfigError(String),
    #[error("Google API response missing {0}")]
    MissingField(&'static str),
}

impl GcalError {
    /// Whether Google reported the event as unknown (404) or already deleted (410).
    pub fn is_gone(&self) -> bool {
        match self {
            GcalError::ApiError(e) => {
                let text = e.to_string();
                text.contains("404") || text.contains("410")
            }
            _ => false,
        }
    }
}

impl From<GcalError> for ConsultaError {
    fn from(err: GcalError) -> Self {
        match err {
            GcalError::ConfigError(msg) => ConsultaError::ConfigError(msg),
            other => external_service_error("Google Calendar", other.to_string()),
        }
    }
}

impl From<GcalError> for ProviderError {
    fn from(err: GcalError) -> Self {
        if err.is_gone() {
            ProviderError::not_found("gcal", err.to_string())
        } else {
            ProviderError::new("gcal", err.to_string())
        }
    }
}
