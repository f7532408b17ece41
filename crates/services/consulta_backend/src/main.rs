// File: services/consulta_backend/src/main.rs
use consulta_common::error::ConsultaError;
use consulta_config::load_config;
use consulta_db::DbClient;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

mod app;
mod service_factory;

#[cfg(test)]
mod app_test;

use service_factory::ConsultaServiceFactory;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // The subscriber may not be up yet when config loading fails.
        eprintln!("consulta-backend failed: {}", err);
        error!("consulta-backend failed: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ConsultaError> {
    let config = Arc::new(load_config().map_err(|e| ConsultaError::ConfigError(e.to_string()))?);
    // Keep the guard alive so the file writer flushes on shutdown.
    let _log_guard = consulta_common::init_from_config(config.logging.as_ref());

    let db = DbClient::new(&config).await?;
    db.init_schema().await?;
    info!("Database ready");

    let factory = ConsultaServiceFactory::new(&config, db.clone()).await?;
    let state = Arc::new(factory.scheduling_state(config.clone()));
    let app = app::build_app(state, db).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ConsultaError::ConfigError(format!("cannot bind {}: {}", addr, e)))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| ConsultaError::InternalError(e.to_string()))
}
