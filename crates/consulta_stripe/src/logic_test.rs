use crate::error::StripeError;
use crate::logic::{
    compute_signature, create_checkout_session, parse_paid_checkout, retrieve_checkout_session,
    verify_stripe_signature_at,
};
use crate::service::StripePaymentProvider;
use consulta_common::services::{CheckoutRequest, PaymentProvider};
use consulta_config::StripeConfig;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "whsec_test";

fn config(api_base: String) -> StripeConfig {
    StripeConfig {
        secret_key: "sk_test_123".to_string(),
        webhook_secret: Some(SECRET.to_string()),
        success_url: "https://consulta.example/success".to_string(),
        cancel_url: "https://consulta.example/cancel".to_string(),
        portal_return_url: None,
        default_currency: Some("chf".to_string()),
        api_base,
    }
}

fn paid_session_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "checkout.session",
        "payment_status": "paid",
        "status": "complete",
        "customer_details": { "email": "ada@example.com", "name": "Ada" },
        "metadata": { "product_tag": "advisory", "product_id": "deep-dive" }
    })
}

fn signed_header(payload: &[u8], timestamp: i64) -> String {
    let sig = compute_signature(SECRET, &timestamp.to_string(), payload).unwrap();
    format!("t={},v1={}", timestamp, sig)
}

#[tokio::test]
async fn retrieve_maps_metadata_and_customer_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_1"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(paid_session_json("cs_1")))
        .mount(&server)
        .await;

    let provider = StripePaymentProvider::new(Arc::new(config(server.uri())));
    let session = provider.retrieve_session("cs_1").await.unwrap();

    assert!(session.paid);
    assert_eq!(session.product_tag.as_deref(), Some("advisory"));
    assert_eq!(session.product_id.as_deref(), Some("deep-dive"));
    assert_eq!(session.customer_email.as_deref(), Some("ada@example.com"));
    assert_eq!(session.customer_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn unknown_session_is_reported_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/checkout/sessions/cs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "No such checkout.session: 'cs_missing'" }
        })))
        .mount(&server)
        .await;

    let cfg = config(server.uri());
    match retrieve_checkout_session(&cfg, "cs_missing").await {
        Err(StripeError::ApiError {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, 404);
            assert!(message.contains("No such checkout.session"));
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let provider = StripePaymentProvider::new(Arc::new(cfg));
    let err = provider.retrieve_session("cs_missing").await.unwrap_err();
    assert!(err.not_found);
}

#[tokio::test]
async fn checkout_carries_product_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("metadata%5Bproduct_tag%5D=advisory"))
        .and(body_string_contains("metadata%5Bproduct_id%5D=deep-dive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_new",
            "url": "https://checkout.stripe.test/cs_new"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CheckoutRequest {
        product_id: "deep-dive".to_string(),
        product_tag: "advisory".to_string(),
        product_name: "Deep dive".to_string(),
        unit_amount: 25000,
        currency: "CHF".to_string(),
        customer_email: None,
    };
    let session = create_checkout_session(&config(server.uri()), &request)
        .await
        .unwrap();
    assert_eq!(session.session_id, "cs_new");
    assert_eq!(session.url, "https://checkout.stripe.test/cs_new");
}

#[test]
fn valid_signature_is_accepted() {
    let payload = br#"{"id":"evt_1"}"#;
    let now = 1_900_000_000;
    let header = signed_header(payload, now);
    assert!(verify_stripe_signature_at(payload, Some(&header), SECRET, now + 5).is_ok());
}

#[test]
fn tampered_payload_is_rejected() {
    let now = 1_900_000_000;
    let header = signed_header(br#"{"id":"evt_1"}"#, now);
    let result = verify_stripe_signature_at(br#"{"id":"evt_2"}"#, Some(&header), SECRET, now);
    assert!(matches!(result, Err(StripeError::WebhookSignatureError(_))));
}

#[test]
fn stale_signature_is_rejected() {
    let payload = br#"{"id":"evt_1"}"#;
    let now = 1_900_000_000;
    let header = signed_header(payload, now - 3600);
    assert!(verify_stripe_signature_at(payload, Some(&header), SECRET, now).is_err());
}

#[test]
fn missing_header_is_rejected() {
    assert!(verify_stripe_signature_at(b"{}", None, SECRET, 0).is_err());
}

#[test]
fn completed_paid_checkout_yields_payment_session() {
    let event = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": { "object": paid_session_json("cs_1") }
    });
    let payload = serde_json::to_vec(&event).unwrap();
    let session = parse_paid_checkout(&payload).unwrap().unwrap();
    assert_eq!(session.id, "cs_1");
    assert!(session.paid);
}

#[test]
fn other_events_and_unpaid_sessions_are_ignored() {
    let other = json!({
        "id": "evt_2",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_1" } }
    });
    assert!(parse_paid_checkout(&serde_json::to_vec(&other).unwrap())
        .unwrap()
        .is_none());

    let mut unpaid = paid_session_json("cs_2");
    unpaid["payment_status"] = json!("unpaid");
    let event = json!({
        "id": "evt_3",
        "type": "checkout.session.completed",
        "data": { "object": unpaid }
    });
    assert!(parse_paid_checkout(&serde_json::to_vec(&event).unwrap())
        .unwrap()
        .is_none());
}
