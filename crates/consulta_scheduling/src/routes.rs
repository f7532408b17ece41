// --- File: crates/consulta_scheduling/src/routes.rs ---

use crate::auth::{shared_secret_auth_middleware, SharedSecretAuthState};
use crate::handlers::{
    add_block_handler, billing_portal_handler, cancel_booking_handler, create_booking_handler,
    create_checkout_handler, delete_block_handler, get_availability_handler, get_booking_handler,
    list_windows_handler, reminder_sweep_handler, replace_windows_handler, stripe_webhook_handler,
    SchedulingState,
};

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Creates the router for all scheduling routes, to be nested under `/api`.
///
/// Public routes are open; the reminder trigger and availability
/// administration each sit behind their own shared secret.
pub fn routes(state: Arc<SchedulingState>) -> Router {
    let cron_auth = Arc::new(SharedSecretAuthState {
        scope: "cron",
        expected_secret: state.config.security.cron_secret.clone(),
    });
    let admin_auth = Arc::new(SharedSecretAuthState {
        scope: "admin",
        expected_secret: state.config.security.admin_secret.clone(),
    });

    let public = Router::new()
        .route("/availability", get(get_availability_handler))
        .route("/bookings", post(create_booking_handler))
        .route("/bookings/{id}", get(get_booking_handler))
        .route("/bookings/{id}/cancel", post(cancel_booking_handler))
        .route("/checkout", post(create_checkout_handler))
        .route("/billing-portal", post(billing_portal_handler))
        .route("/stripe/webhook", post(stripe_webhook_handler));

    let cron = Router::new()
        .route("/cron/reminders", post(reminder_sweep_handler))
        .layer(middleware::from_fn_with_state(
            cron_auth,
            shared_secret_auth_middleware,
        ));

    let admin = Router::new()
        .route(
            "/admin/availability/windows",
            get(list_windows_handler).put(replace_windows_handler),
        )
        .route("/admin/availability/blocks", post(add_block_handler))
        .route("/admin/availability/blocks/{id}", delete(delete_block_handler))
        .layer(middleware::from_fn_with_state(
            admin_auth,
            shared_secret_auth_middleware,
        ));

    info!("💡 Scheduling: routes for availability, bookings, checkout, webhook, cron and admin");

    public.merge(cron).merge(admin).with_state(state)
}
