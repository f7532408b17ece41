use crate::app::{build_app, health_routes};
use crate::service_factory::ConsultaServiceFactory;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use consulta_config::{AppConfig, MailerConfig, SecurityConfig, StripeConfig, ZoomConfig};
use consulta_db::DbClient;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn memory_db() -> DbClient {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();
    db.init_schema().await.unwrap();
    db
}

fn wired_config() -> AppConfig {
    AppConfig {
        stripe: Some(StripeConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: Some("whsec_test".to_string()),
            success_url: "https://consulta.example/ok".to_string(),
            cancel_url: "https://consulta.example/cancel".to_string(),
            portal_return_url: None,
            default_currency: Some("chf".to_string()),
            api_base: "http://127.0.0.1:9".to_string(),
        }),
        zoom: Some(ZoomConfig {
            account_id: "acc".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            api_base: "http://127.0.0.1:9/v2".to_string(),
            oauth_base: "http://127.0.0.1:9".to_string(),
            user_id: "me".to_string(),
        }),
        mailer: Some(MailerConfig {
            api_key: "SG.test".to_string(),
            from_email: "advisor@consulta.example".to_string(),
            from_name: None,
            api_base: "http://127.0.0.1:9".to_string(),
        }),
        security: SecurityConfig {
            cron_secret: Some("cron".to_string()),
            admin_secret: Some("admin".to_string()),
        },
        ..AppConfig::default()
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_database_ok() {
    let response = health_routes(memory_db().await)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["database"], "ok");
}

#[tokio::test]
async fn missing_provider_section_fails_startup() {
    let mut config = wired_config();
    config.zoom = None;

    let err = ConsultaServiceFactory::new(&config, memory_db().await)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("zoom"));
}

#[tokio::test]
async fn wired_app_serves_scheduling_routes_under_api() {
    let config = Arc::new(wired_config());
    let db = memory_db().await;
    let factory = ConsultaServiceFactory::new(&config, db.clone()).await.unwrap();
    assert!(factory.calendar.is_none());
    let app = build_app(Arc::new(factory.scheduling_state(config)), db);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/availability/windows")
                .header("X-Internal-Auth-Secret", "admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));

    let unauthorized = app
        .oneshot(
            Request::post("/api/cron/reminders")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
}
