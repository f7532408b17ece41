use consulta_common::services::ProviderError;
use consulta_common::{external_service_error, ConsultaError, HttpStatusCode};
use thiserror::Error;

/// Zoom-specific error types.
#[derive(Error, Debug)]
pub enum ZoomError {
    #[error("Zoom API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Zoom API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse Zoom API response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Zoom OAuth token request failed: {0}")]
    AuthError(String),

    #[error("Zoom configuration missing or incomplete: {0}")]
    ConfigError(String),
}

impl From<ZoomError> for ConsultaError {
    fn from(err: ZoomError) -> Self {
        match err {
            ZoomError::ConfigError(msg) => ConsultaError::ConfigError(msg),
            other => external_service_error("Zoom", other.to_string()),
        }
    }
}

impl From<ZoomError> for ProviderError {
    fn from(err: ZoomError) -> Self {
        match &err {
            ZoomError::ApiError {
                status_code: 404, ..
            } => ProviderError::not_found("zoom", err.to_string()),
            _ => ProviderError::new("zoom", err.to_string()),
        }
    }
}

impl HttpStatusCode for ZoomError {
    fn status_code(&self) -> u16 {
        match self {
            ZoomError::ConfigError(_) => 500,
            _ => 502,
        }
    }
}
