// --- File: crates/consulta_stripe/src/logic.rs ---
use chrono::Utc;
use consulta_common::services::{CheckoutRequest, CheckoutSession, PaymentSession};
use consulta_common::HTTP_CLIENT;
use consulta_config::StripeConfig;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::error::StripeError;

/// Metadata key carrying the product family ("advisory").
pub const METADATA_PRODUCT_TAG: &str = "product_tag";
/// Metadata key carrying the internal product (plan) id.
pub const METADATA_PRODUCT_ID: &str = "product_id";

/// Signed webhooks older or newer than this are rejected.
const SIGNATURE_TOLERANCE_SECONDS: i64 = 600;

// --- Data Structures ---

/// Represents the `data` field within a Stripe Event.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEventData {
    /// Shape depends on the event type.
    pub object: serde_json::Value,
}

/// Represents the outer Stripe Event object.
#[derive(Deserialize, Debug, Clone)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String, // e.g., "checkout.session.completed"
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// The subset of a Checkout Session we read, both from the API and from
/// `checkout.session.completed` events.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StripeCheckoutSessionData {
    pub id: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer: Option<String>,
    pub customer_email: Option<String>,
    pub customer_details: Option<StripeCustomerDetails>,
    pub metadata: Option<HashMap<String, String>>,
    pub payment_status: Option<String>, // e.g., "paid", "unpaid", "no_payment_required"
    pub status: Option<String>,         // e.g., "open", "complete", "expired"
    pub url: Option<String>,
}

impl StripeCheckoutSessionData {
    fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata.as_ref().and_then(|m| m.get(key).cloned())
    }

    /// Collapses the Stripe view into what the booking core needs.
    pub fn to_payment_session(&self) -> PaymentSession {
        let details = self.customer_details.clone().unwrap_or_default();
        PaymentSession {
            id: self.id.clone(),
            paid: self.payment_status.as_deref() == Some("paid"),
            product_tag: self.metadata_value(METADATA_PRODUCT_TAG),
            product_id: self.metadata_value(METADATA_PRODUCT_ID),
            customer_email: details.email.or_else(|| self.customer_email.clone()),
            customer_name: details.name,
        }
    }
}

#[derive(Deserialize, Debug)]
struct StripePortalSessionResponse {
    url: Option<String>,
}

fn api_url(stripe_config: &StripeConfig, path: &str) -> String {
    format!("{}{}", stripe_config.api_base.trim_end_matches('/'), path)
}

fn ensure_secret_key(stripe_config: &StripeConfig) -> Result<&str, StripeError> {
    if stripe_config.secret_key.is_empty() {
        return Err(StripeError::ConfigError(
            "stripe.secret_key is empty".to_string(),
        ));
    }
    Ok(&stripe_config.secret_key)
}

/// Turns a non-2xx Stripe response body into an `ApiError`, preferring the
/// `error.message` field when the body is JSON.
fn api_error(status: reqwest::StatusCode, body_text: String) -> StripeError {
    let message = match serde_json::from_str::<serde_json::Value>(&body_text) {
        Ok(json_body) => json_body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or(body_text),
        Err(_) => body_text,
    };
    StripeError::ApiError {
        status_code: status.as_u16(),
        message,
    }
}

// --- API Calls ---

/// Retrieves a Checkout Session by id.
pub async fn retrieve_checkout_session(
    stripe_config: &StripeConfig,
    session_id: &str,
) -> Result<StripeCheckoutSessionData, StripeError> {
    debug!("[Stripe Logic] Retrieving Checkout Session {}", session_id);
    let secret_key = ensure_secret_key(stripe_config)?;

    let response = HTTP_CLIENT
        .get(api_url(
            stripe_config,
            &format!("/v1/checkout/sessions/{}", session_id),
        ))
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;

    if status.is_success() {
        let session: StripeCheckoutSessionData = serde_json::from_str(&body_text)?;
        if session.payment_status.as_deref() != Some("paid") {
            info!(
                "[Stripe Logic] Checkout session {} status is {:?}, payment_status is {:?}",
                session_id, session.status, session.payment_status
            );
        }
        Ok(session)
    } else {
        let err = api_error(status, body_text);
        error!(
            "[Stripe Logic] Failed to retrieve session {}: {}",
            session_id, err
        );
        Err(err)
    }
}

/// Creates a hosted Checkout Session for one product. The product tag and id
/// travel in the session metadata so a later lookup can tell what was bought.
pub async fn create_checkout_session(
    stripe_config: &StripeConfig,
    request: &CheckoutRequest,
) -> Result<CheckoutSession, StripeError> {
    info!(
        "[Stripe Logic] Creating Checkout Session for product {} ({} {})",
        request.product_id, request.unit_amount, request.currency
    );
    let secret_key = ensure_secret_key(stripe_config)?;

    let mut form_body: Vec<(String, String)> = vec![
        ("payment_method_types[]".to_string(), "card".to_string()),
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), stripe_config.success_url.clone()),
        ("cancel_url".to_string(), stripe_config.cancel_url.clone()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.to_lowercase(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.product_name.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.unit_amount.to_string(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        (
            format!("metadata[{}]", METADATA_PRODUCT_TAG),
            request.product_tag.clone(),
        ),
        (
            format!("metadata[{}]", METADATA_PRODUCT_ID),
            request.product_id.clone(),
        ),
    ];
    if let Some(email) = &request.customer_email {
        form_body.push(("customer_email".to_string(), email.clone()));
    }

    let response = HTTP_CLIENT
        .post(api_url(stripe_config, "/v1/checkout/sessions"))
        .basic_auth(secret_key, None::<&str>)
        .form(&form_body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;
    debug!("[Stripe Logic] Stripe API response status: {}", status);

    if !status.is_success() {
        let err = api_error(status, body_text);
        error!("[Stripe Logic] Checkout session creation failed: {}", err);
        return Err(err);
    }

    let session: StripeCheckoutSessionData = serde_json::from_str(&body_text)?;
    let url = session.url.ok_or(StripeError::MissingField("checkout url"))?;
    info!("[Stripe Logic] Checkout Session {} created", session.id);
    Ok(CheckoutSession {
        session_id: session.id,
        url,
    })
}

/// Opens a billing portal session for an existing Stripe customer.
pub async fn create_portal_session(
    stripe_config: &StripeConfig,
    customer_id: &str,
) -> Result<String, StripeError> {
    let secret_key = ensure_secret_key(stripe_config)?;
    let return_url = stripe_config
        .portal_return_url
        .clone()
        .unwrap_or_else(|| stripe_config.success_url.clone());

    let form_body = [
        ("customer", customer_id.to_string()),
        ("return_url", return_url),
    ];

    let response = HTTP_CLIENT
        .post(api_url(stripe_config, "/v1/billing_portal/sessions"))
        .basic_auth(secret_key, None::<&str>)
        .form(&form_body)
        .send()
        .await?;

    let status = response.status();
    let body_text = response.text().await?;
    if !status.is_success() {
        let err = api_error(status, body_text);
        error!(
            "[Stripe Logic] Portal session for customer {} failed: {}",
            customer_id, err
        );
        return Err(err);
    }

    let portal: StripePortalSessionResponse = serde_json::from_str(&body_text)?;
    portal.url.ok_or(StripeError::MissingField("portal url"))
}

// --- Webhook Processing Logic ---

/// Verifies the `Stripe-Signature` header of an incoming webhook against the
/// current time.
pub fn verify_stripe_signature(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
) -> Result<(), StripeError> {
    verify_stripe_signature_at(payload_bytes, sig_header, secret, Utc::now().timestamp())
}

/// Same as [`verify_stripe_signature`] with an explicit "now" in unix seconds.
pub fn verify_stripe_signature_at(
    payload_bytes: &[u8],
    sig_header: Option<&str>,
    secret: &str,
    now_secs: i64,
) -> Result<(), StripeError> {
    let sig_header_value = sig_header.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing Stripe-Signature header".to_string())
    })?;

    let mut timestamp_str: Option<&str> = None;
    let mut v1_signatures_hex: Vec<&str> = Vec::new();

    for item in sig_header_value.split(',') {
        if let Some((key, value)) = item.trim().split_once('=') {
            match key {
                "t" => timestamp_str = Some(value),
                "v1" => v1_signatures_hex.push(value),
                _ => {} // v0 and unknown schemes are ignored
            }
        }
    }

    let timestamp_str = timestamp_str.ok_or_else(|| {
        StripeError::WebhookSignatureError("Missing timestamp 't' in Stripe-Signature".to_string())
    })?;
    let parsed_timestamp = timestamp_str.parse::<i64>().map_err(|_| {
        StripeError::WebhookSignatureError(
            "Invalid timestamp format in Stripe-Signature".to_string(),
        )
    })?;

    if v1_signatures_hex.is_empty() {
        return Err(StripeError::WebhookSignatureError(
            "Missing v1 signature in Stripe-Signature".to_string(),
        ));
    }

    if (now_secs - parsed_timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
        warn!(
            "[Stripe Webhook] Timestamp outside tolerance. Current: {}, Event: {}",
            now_secs, parsed_timestamp
        );
        return Err(StripeError::WebhookSignatureError(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let calculated_signature_hex = compute_signature(secret, timestamp_str, payload_bytes)?;

    if v1_signatures_hex.iter().any(|provided| {
        constant_time_eq::constant_time_eq(calculated_signature_hex.as_bytes(), provided.as_bytes())
    }) {
        return Ok(());
    }

    warn!("[Stripe Webhook] Signature mismatch");
    Err(StripeError::WebhookSignatureError(
        "Signature mismatch".to_string(),
    ))
}

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`.
pub fn compute_signature(
    secret: &str,
    timestamp: &str,
    payload_bytes: &[u8],
) -> Result<String, StripeError> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        StripeError::WebhookSignatureError("Invalid webhook secret format for HMAC".to_string())
    })?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload_bytes);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Extracts the paid checkout from a verified webhook body.
///
/// Returns `Ok(None)` for other event types and for completed but unpaid
/// sessions; neither is an error from Stripe's point of view.
pub fn parse_paid_checkout(payload_bytes: &[u8]) -> Result<Option<PaymentSession>, StripeError> {
    let event: StripeEvent = serde_json::from_slice(payload_bytes)?;
    info!(
        "[Stripe Webhook] Received event {} of type {}",
        event.id, event.event_type
    );

    if event.event_type != "checkout.session.completed" {
        debug!("[Stripe Webhook] Ignoring event type {}", event.event_type);
        return Ok(None);
    }

    let session: StripeCheckoutSessionData = serde_json::from_value(event.data.object)
        .map_err(|e| {
            StripeError::WebhookProcessingError(format!(
                "Failed to parse checkout session object: {}",
                e
            ))
        })?;

    let payment = session.to_payment_session();
    if !payment.paid {
        info!(
            "[Stripe Webhook] Checkout session {} completed with payment status {:?}",
            session.id, session.payment_status
        );
        return Ok(None);
    }
    Ok(Some(payment))
}
