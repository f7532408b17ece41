// --- File: crates/consulta_stripe/src/error.rs ---
use consulta_common::services::ProviderError;
use consulta_common::{external_service_error, ConsultaError, HttpStatusCode};
use thiserror::Error;

/// Stripe-specific error types.
#[derive(Error, Debug)]
pub enum StripeError {
    /// Error occurred during a Stripe API request
    #[error("Stripe API request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Error returned by the Stripe API
    #[error("Stripe API returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Error parsing Stripe API response
    #[error("Failed to parse Stripe API response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing or incomplete Stripe configuration
    #[error("Stripe configuration missing or incomplete: {0}")]
    ConfigError(String),

    /// Webhook signature verification failed
    #[error("Stripe webhook signature verification failed: {0}")]
    WebhookSignatureError(String),

    /// Webhook payload could not be interpreted
    #[error("Stripe webhook event processing error: {0}")]
    WebhookProcessingError(String),

    /// Stripe answered 2xx but without a field we rely on
    #[error("Stripe response missing {0}")]
    MissingField(&'static str),
}

impl StripeError {
    fn is_not_found(&self) -> bool {
        matches!(self, StripeError::ApiError { status_code: 404, .. })
    }
}

/// Convert StripeError to ConsultaError
impl From<StripeError> for ConsultaError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::RequestError(e) => {
                ConsultaError::HttpError(format!("Stripe request error: {}", e))
            }
            StripeError::ApiError {
                status_code,
                message,
            } => external_service_error(
                "Stripe API",
                format!("Status: {}, Message: {}", status_code, message),
            ),
            StripeError::ParseError(e) => {
                ConsultaError::ParseError(format!("Stripe response parse error: {}", e))
            }
            StripeError::ConfigError(msg) => ConsultaError::ConfigError(msg),
            StripeError::WebhookSignatureError(msg) => {
                ConsultaError::AuthError(format!("Stripe webhook signature error: {}", msg))
            }
            StripeError::WebhookProcessingError(msg) => ConsultaError::ValidationError(msg),
            StripeError::MissingField(field) => {
                external_service_error("Stripe API", format!("response missing {}", field))
            }
        }
    }
}

/// Collaborator-facing flattening used by the payment provider adapter.
impl From<StripeError> for ProviderError {
    fn from(err: StripeError) -> Self {
        if err.is_not_found() {
            ProviderError::not_found("stripe", err.to_string())
        } else {
            ProviderError::new("stripe", err.to_string())
        }
    }
}

impl HttpStatusCode for StripeError {
    fn status_code(&self) -> u16 {
        match self {
            StripeError::RequestError(_) => 502,
            StripeError::ApiError { .. } => 502,
            StripeError::ParseError(_) => 502,
            StripeError::ConfigError(_) => 500,
            StripeError::WebhookSignatureError(_) => 401,
            StripeError::WebhookProcessingError(_) => 400,
            StripeError::MissingField(_) => 502,
        }
    }
}
