use consulta_common::services::ProviderError;
use consulta_common::{external_service_error, ConsultaError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("SendGrid request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("SendGrid returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Mailer configuration missing or incomplete: {0}")]
    ConfigError(String),
}

impl From<MailerError> for ConsultaError {
    fn from(err: MailerError) -> Self {
        match err {
            MailerError::ConfigError(msg) => ConsultaError::ConfigError(msg),
            other => external_service_error("SendGrid", other.to_string()),
        }
    }
}

impl From<MailerError> for ProviderError {
    fn from(err: MailerError) -> Self {
        ProviderError::new("sendgrid", err.to_string())
    }
}
