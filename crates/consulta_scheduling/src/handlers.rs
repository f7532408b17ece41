// --- File: crates/consulta_scheduling/src/handlers.rs ---

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use consulta_common::models::{Booking, CalendarBlock, WeeklyAvailabilityWindow};
use consulta_common::services::{CheckoutRequest, PaymentProvider};
use consulta_common::{external_service_error, ConsultaError};
use consulta_config::AppConfig;
use consulta_db::AvailabilityRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityCalculator;
use crate::error::SchedulingError;
use crate::orchestrator::{BookingOrchestrator, CreateBookingRequest, CreatedBooking};
use crate::reconciler::{ClientIdentity, PaymentReconciler};
use crate::reminders::{ReminderScheduler, SweepReport};

pub const USER_ID_HEADER: &str = "X-User-Id";
const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Everything the scheduling routes need, built once at startup.
#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub calculator: Arc<AvailabilityCalculator>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub reconciler: Arc<PaymentReconciler>,
    pub reminders: Arc<ReminderScheduler>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub payments: Arc<dyn PaymentProvider>,
}

// --- Request / response bodies ---

#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD` in the advisor's time zone
    pub date: String,
    pub plan_id: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityResponse {
    pub date: String,
    pub time_zone: String,
    /// Local `HH:MM` start times
    pub slots: Vec<String>,
    /// The same starts as UTC instants
    pub starts: Vec<DateTime<Utc>>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct CreateBookingBody {
    pub payment_session_id: String,
    pub plan_id: String,
    pub date: String,
    pub time: String,
    pub notes: Option<String>,
    pub client_email: Option<String>,
    pub client_name: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub booking: Booking,
    pub join_url: Option<String>,
}

impl From<CreatedBooking> for BookingResponse {
    fn from(created: CreatedBooking) -> Self {
        Self {
            booking: created.booking,
            join_url: created.join_url,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Deserialize)]
pub struct CancelBookingBody {
    pub reason: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub plan_id: String,
    pub customer_email: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct PortalBody {
    pub customer_id: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize, Deserialize)]
pub struct PortalResponse {
    pub url: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct WindowBody {
    /// "Mon" .. "Sun"
    pub weekday: String,
    /// `HH:MM`
    pub start: String,
    /// `HH:MM`
    pub end: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct ReplaceWindowsBody {
    pub windows: Vec<WindowBody>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct BlockBody {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reason: Option<String>,
}

// --- Helpers ---

fn requester_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require_requester(headers: &HeaderMap) -> Result<String, SchedulingError> {
    requester_id(headers).ok_or_else(|| {
        SchedulingError::Unauthorized(format!("missing {} header", USER_ID_HEADER))
    })
}

fn parse_window(body: WindowBody) -> Result<WeeklyAvailabilityWindow, SchedulingError> {
    let weekday: Weekday = body
        .weekday
        .parse()
        .map_err(|_| SchedulingError::Validation(format!("invalid weekday '{}'", body.weekday)))?;
    let parse_time = |value: &str| {
        NaiveTime::parse_from_str(value, "%H:%M")
            .map_err(|_| SchedulingError::Validation(format!("invalid time '{}' (HH:MM)", value)))
    };
    let start = parse_time(&body.start)?;
    let end = parse_time(&body.end)?;
    if start >= end {
        return Err(SchedulingError::Validation(format!(
            "window {} {}-{} ends before it starts",
            body.weekday, body.start, body.end
        )));
    }
    Ok(WeeklyAvailabilityWindow {
        id: Uuid::new_v4().to_string(),
        weekday,
        start,
        end,
        active: body.active,
    })
}

// --- Public handlers ---

pub async fn get_availability_handler(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, SchedulingError> {
    let plan = state
        .config
        .plan(&query.plan_id)
        .ok_or_else(|| SchedulingError::NotFound(format!("plan '{}'", query.plan_id)))?;
    let date = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d")
        .map_err(|_| SchedulingError::Validation("Invalid date format (YYYY-MM-DD)".to_string()))?;

    let rules = state.calculator.rules()?;
    let starts = state
        .calculator
        .compute_slots(date, plan.duration_minutes)
        .await?;
    let slots = starts
        .iter()
        .map(|s| s.with_timezone(&rules.time_zone).format("%H:%M").to_string())
        .collect();

    Ok(Json(AvailabilityResponse {
        date: date.format("%Y-%m-%d").to_string(),
        time_zone: state.config.scheduling.time_zone.clone(),
        slots,
        starts,
    }))
}

pub async fn create_booking_handler(
    State(state): State<Arc<SchedulingState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingBody>,
) -> Result<Json<BookingResponse>, SchedulingError> {
    let created = state
        .orchestrator
        .create_booking(CreateBookingRequest {
            payment_session_id: body.payment_session_id,
            plan_id: body.plan_id,
            date: body.date,
            time: body.time,
            notes: body.notes,
            client: ClientIdentity {
                email: body.client_email,
                name: body.client_name,
            },
            requester_id: requester_id(&headers),
        })
        .await?;
    Ok(Json(created.into()))
}

pub async fn get_booking_handler(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Booking>, SchedulingError> {
    let requester = require_requester(&headers)?;
    let booking = state.orchestrator.get_booking(&booking_id, &requester).await?;
    Ok(Json(booking))
}

pub async fn cancel_booking_handler(
    State(state): State<Arc<SchedulingState>>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<CancelBookingBody>>,
) -> Result<Json<Booking>, SchedulingError> {
    let requester = require_requester(&headers)?;
    let reason = body.and_then(|Json(b)| b.reason);
    let booking = state
        .orchestrator
        .cancel(&booking_id, &requester, reason)
        .await?;
    Ok(Json(booking))
}

pub async fn create_checkout_handler(
    State(state): State<Arc<SchedulingState>>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, ConsultaError> {
    let plan = state
        .config
        .plan(&body.plan_id)
        .ok_or_else(|| SchedulingError::NotFound(format!("plan '{}'", body.plan_id)))?;
    let currency = plan
        .currency
        .clone()
        .or_else(|| state.config.stripe.as_ref().and_then(|s| s.default_currency.clone()))
        .unwrap_or_else(|| "chf".to_string());

    let session = state
        .payments
        .create_checkout_session(CheckoutRequest {
            product_id: plan.id.clone(),
            product_tag: state.config.scheduling.advisory_product_tag.clone(),
            product_name: plan.name.clone(),
            unit_amount: plan.unit_amount,
            currency,
            customer_email: body.customer_email,
        })
        .await
        .map_err(|e| {
            error!("Checkout session for plan {} failed: {}", plan.id, e);
            external_service_error("Payment provider", e.message)
        })?;
    info!("Checkout session {} created for plan {}", session.session_id, plan.id);

    Ok(Json(CheckoutResponse {
        session_id: session.session_id,
        url: session.url,
    }))
}

pub async fn billing_portal_handler(
    State(state): State<Arc<SchedulingState>>,
    Json(body): Json<PortalBody>,
) -> Result<Json<PortalResponse>, ConsultaError> {
    if body.customer_id.trim().is_empty() {
        return Err(ConsultaError::ValidationError(
            "customer_id must not be empty".to_string(),
        ));
    }
    let url = state
        .payments
        .create_portal_session(&body.customer_id)
        .await
        .map_err(|e| {
            error!("Portal session for {} failed: {}", body.customer_id, e);
            external_service_error("Payment provider", e.message)
        })?;
    Ok(Json(PortalResponse { url }))
}

/// Payment notifications. A verified paid checkout for the advisory product
/// records its purchase; every other event is acknowledged and ignored.
pub async fn stripe_webhook_handler(
    State(state): State<Arc<SchedulingState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state
        .config
        .stripe
        .as_ref()
        .and_then(|s| s.webhook_secret.as_deref())
        .filter(|s| !s.is_empty())
    else {
        error!("Stripe webhook secret is not configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Webhook secret not configured.".to_string(),
        )
            .into_response();
    };

    let sig_header = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());
    if let Err(e) = consulta_stripe::verify_stripe_signature(&body, sig_header, secret) {
        warn!("Stripe webhook signature verification failed: {}", e);
        return (StatusCode::BAD_REQUEST, format!("Invalid signature: {}", e)).into_response();
    }

    let session = match consulta_stripe::parse_paid_checkout(&body) {
        Ok(Some(session)) => session,
        Ok(None) => return StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Stripe webhook payload rejected: {}", e);
            return (StatusCode::BAD_REQUEST, "Invalid payload format".to_string()).into_response();
        }
    };

    match state.reconciler.accept_notification(&session).await {
        Ok(Some(purchase)) => {
            info!(
                "Webhook recorded purchase {} for session {}",
                purchase.id, session.id
            );
            StatusCode::OK.into_response()
        }
        Ok(None) => StatusCode::OK.into_response(),
        // Stripe retries non-2xx deliveries, so storage errors surface as 500.
        Err(e) => e.into_response(),
    }
}

// --- Internal handlers (shared secret) ---

pub async fn reminder_sweep_handler(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<SweepReport>, SchedulingError> {
    let report = state.reminders.run_reminder_sweep().await?;
    Ok(Json(report))
}

pub async fn list_windows_handler(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<Vec<WeeklyAvailabilityWindow>>, SchedulingError> {
    Ok(Json(state.availability.list_windows().await?))
}

pub async fn replace_windows_handler(
    State(state): State<Arc<SchedulingState>>,
    Json(body): Json<ReplaceWindowsBody>,
) -> Result<Json<Vec<WeeklyAvailabilityWindow>>, SchedulingError> {
    let windows = body
        .windows
        .into_iter()
        .map(parse_window)
        .collect::<Result<Vec<_>, _>>()?;
    state.availability.replace_windows(windows.clone()).await?;
    info!("Weekly availability replaced with {} windows", windows.len());
    Ok(Json(windows))
}

pub async fn add_block_handler(
    State(state): State<Arc<SchedulingState>>,
    Json(body): Json<BlockBody>,
) -> Result<(StatusCode, Json<CalendarBlock>), SchedulingError> {
    if body.starts_at >= body.ends_at {
        return Err(SchedulingError::Validation(
            "block must end after it starts".to_string(),
        ));
    }
    let block = state
        .availability
        .add_block(CalendarBlock {
            id: Uuid::new_v4().to_string(),
            starts_at: body.starts_at,
            ends_at: body.ends_at,
            reason: body.reason,
        })
        .await?;
    info!("Calendar block {} added", block.id);
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn delete_block_handler(
    State(state): State<Arc<SchedulingState>>,
    Path(block_id): Path<String>,
) -> Result<StatusCode, SchedulingError> {
    if state.availability.delete_block(&block_id).await? {
        info!("Calendar block {} removed", block_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(SchedulingError::NotFound(format!("block {}", block_id)))
    }
}
