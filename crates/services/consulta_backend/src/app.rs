// --- File: crates/services/consulta_backend/src/app.rs ---
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use consulta_db::DbClient;
use consulta_scheduling::SchedulingState;
use serde_json::{json, Value};
use std::sync::Arc;

/// Liveness plus a database ping; 503 when the pool cannot answer.
async fn health(State(db): State<DbClient>) -> (StatusCode, Json<Value>) {
    if db.is_healthy().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "unreachable" })),
        )
    }
}

pub fn health_routes(db: DbClient) -> Router {
    Router::new().route("/health", get(health)).with_state(db)
}

/// The full application: scheduling API under `/api`, health at the root.
pub fn build_app(state: Arc<SchedulingState>, db: DbClient) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Consulta API!" }))
        .merge(consulta_scheduling::routes(state));

    #[allow(unused_mut)] // only reassigned with the openapi feature
    let mut app = Router::new()
        .nest("/api", api_router)
        .merge(health_routes(db));

    #[cfg(feature = "openapi")]
    {
        use consulta_scheduling::doc::SchedulingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Consulta API",
                version = "0.1.0",
                description = "Advisory session booking API",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(SchedulingApiDoc::openapi());
        tracing::info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app
}
