// File: crates/consulta_gcal/src/auth.rs
use consulta_config::GcalConfig;
use google_calendar3::{
    hyper_rustls::{self, HttpsConnectorBuilder},
    hyper_util::client::legacy::connect::HttpConnector,
    hyper_util::client::legacy::Client,
    yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator},
    CalendarHub,
};
use std::path::Path;
use tracing::info;

use crate::error::GcalError;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

/// Builds a Calendar hub authenticated as the service account in `key_path`.
pub async fn create_calendar_hub(config: &GcalConfig) -> Result<HubType, GcalError> {
    let key_path = config
        .key_path
        .as_deref()
        .ok_or_else(|| GcalError::ConfigError("Missing gcal.key_path".to_string()))?;

    let sa_key = read_service_account_key(Path::new(key_path))
        .await
        .map_err(|e| GcalError::AuthError(format!("cannot read {}: {}", key_path, e)))?;

    let auth = ServiceAccountAuthenticator::builder(sa_key)
        .build()
        .await
        .map_err(|e| GcalError::AuthError(e.to_string()))?;

    let https = HttpsConnectorBuilder::new()
        .with_native_roots()
        .map_err(|e| GcalError::AuthError(format!("TLS roots: {}", e)))?
        .https_or_http()
        .enable_http1()
        .build();

    let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

    info!("Google Calendar hub created from {}", key_path);
    Ok(CalendarHub::new(client, auth))
}
