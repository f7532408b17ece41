// --- File: crates/consulta_scheduling/src/auth.rs ---

use axum::{
    body::Body as AxumBody,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const INTERNAL_AUTH_HEADER: &str = "X-Internal-Auth-Secret";

/// Shared secret guarding one group of internal routes (cron trigger, admin).
#[derive(Clone)]
pub struct SharedSecretAuthState {
    /// Name of the route group, used in logs.
    pub scope: &'static str,
    pub expected_secret: Option<String>,
}

/// Rejects requests whose `X-Internal-Auth-Secret` header does not match the
/// configured secret. An unconfigured secret disables the routes entirely.
pub async fn shared_secret_auth_middleware(
    State(auth_state): State<Arc<SharedSecretAuthState>>,
    req: Request<AxumBody>,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.expected_secret.as_deref().filter(|s| !s.is_empty()) else {
        error!("{} secret is not configured", auth_state.scope);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Server configuration error for {} auth.", auth_state.scope),
        )
            .into_response();
    };

    let provided = req
        .headers()
        .get(INTERNAL_AUTH_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => {
            debug!("{} request authenticated", auth_state.scope);
            next.run(req).await
        }
        Some(_) => {
            warn!("{} request with invalid secret", auth_state.scope);
            (
                StatusCode::UNAUTHORIZED,
                "Unauthorized: Invalid credentials.".to_string(),
            )
                .into_response()
        }
        None => {
            warn!(
                "{} request without '{}' header",
                auth_state.scope, INTERNAL_AUTH_HEADER
            );
            (
                StatusCode::UNAUTHORIZED,
                format!("Unauthorized: Missing {} header.", INTERNAL_AUTH_HEADER),
            )
                .into_response()
        }
    }
}
