// --- File: crates/consulta_scheduling/src/doc.rs ---

#![cfg(feature = "openapi")]
#![allow(dead_code)]

use utoipa::OpenApi;

use crate::handlers::{
    AvailabilityQuery, AvailabilityResponse, BlockBody, BookingResponse, CancelBookingBody,
    CheckoutBody, CheckoutResponse, CreateBookingBody, PortalBody, PortalResponse,
    ReplaceWindowsBody, WindowBody,
};
use crate::reminders::{SweepFailure, SweepReport};

#[utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Bookable start times for the day", body = AvailabilityResponse, example = json!({
            "date": "2031-03-04",
            "time_zone": "Europe/Zurich",
            "slots": ["09:00", "09:30"],
            "starts": ["2031-03-04T08:00:00Z", "2031-03-04T08:30:00Z"]
        })),
        (status = 400, description = "Invalid date or date outside the bookable range"),
        (status = 404, description = "Unknown plan")
    ),
    tag = "Scheduling"
)]
fn doc_get_availability() {}

#[utoipa::path(
    post,
    path = "/bookings",
    request_body(
        content = CreateBookingBody,
        example = json!({
            "payment_session_id": "cs_test_123",
            "plan_id": "deep-dive",
            "date": "2031-03-04",
            "time": "09:00",
            "notes": "Pension planning"
        })
    ),
    params(
        ("X-User-Id" = Option<String>, Header, description = "Authenticated user id; must own the purchase when present")
    ),
    responses(
        (status = 200, description = "Booking confirmed, or the existing booking for this payment session", body = BookingResponse),
        (status = 400, description = "Invalid input or payment"),
        (status = 403, description = "Purchase inactive or owned by another user"),
        (status = 409, description = "Slot taken; query availability again"),
        (status = 502, description = "Meeting could not be created; the slot was released")
    ),
    tag = "Scheduling"
)]
fn doc_create_booking() {}

#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(
        ("id" = String, Path, description = "Booking id"),
        ("X-User-Id" = String, Header, description = "Owner of the booking")
    ),
    responses(
        (status = 200, description = "The booking", body = Object),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown booking")
    ),
    tag = "Scheduling"
)]
fn doc_get_booking() {}

#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    request_body = CancelBookingBody,
    params(
        ("id" = String, Path, description = "Booking id"),
        ("X-User-Id" = String, Header, description = "Owner of the booking")
    ),
    responses(
        (status = 200, description = "Cancelled booking", body = Object),
        (status = 400, description = "Already cancelled"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown booking")
    ),
    tag = "Scheduling"
)]
fn doc_cancel_booking() {}

#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "Hosted checkout created", body = CheckoutResponse),
        (status = 404, description = "Unknown plan"),
        (status = 502, description = "Payment provider error")
    ),
    tag = "Payments"
)]
fn doc_create_checkout() {}

#[utoipa::path(
    post,
    path = "/billing-portal",
    request_body = PortalBody,
    responses(
        (status = 200, description = "Portal session URL", body = PortalResponse),
        (status = 502, description = "Payment provider error")
    ),
    tag = "Payments"
)]
fn doc_billing_portal() {}

#[utoipa::path(
    post,
    path = "/stripe/webhook",
    params(
        ("Stripe-Signature" = String, Header, description = "Stripe webhook signature")
    ),
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Invalid signature or payload"),
        (status = 500, description = "Purchase could not be recorded; Stripe will retry")
    ),
    tag = "Payments"
)]
fn doc_stripe_webhook() {}

#[utoipa::path(
    post,
    path = "/cron/reminders",
    params(
        ("X-Internal-Auth-Secret" = String, Header, description = "Cron shared secret")
    ),
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport, example = json!({
            "processed": 4,
            "sent": 2,
            "failures": []
        })),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Internal"
)]
fn doc_reminder_sweep() {}

#[utoipa::path(
    get,
    path = "/admin/availability/windows",
    params(
        ("X-Internal-Auth-Secret" = String, Header, description = "Admin shared secret")
    ),
    responses(
        (status = 200, description = "Weekly windows", body = Object),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Internal"
)]
fn doc_list_windows() {}

#[utoipa::path(
    put,
    path = "/admin/availability/windows",
    request_body(
        content = ReplaceWindowsBody,
        example = json!({
            "windows": [
                { "weekday": "Tue", "start": "09:00", "end": "17:00", "active": true }
            ]
        })
    ),
    params(
        ("X-Internal-Auth-Secret" = String, Header, description = "Admin shared secret")
    ),
    responses(
        (status = 200, description = "Stored windows", body = Object),
        (status = 400, description = "Invalid window"),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Internal"
)]
fn doc_replace_windows() {}

#[utoipa::path(
    post,
    path = "/admin/availability/blocks",
    request_body = BlockBody,
    params(
        ("X-Internal-Auth-Secret" = String, Header, description = "Admin shared secret")
    ),
    responses(
        (status = 201, description = "Block created", body = Object),
        (status = 400, description = "Block ends before it starts"),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Internal"
)]
fn doc_add_block() {}

#[utoipa::path(
    delete,
    path = "/admin/availability/blocks/{id}",
    params(
        ("id" = String, Path, description = "Block id"),
        ("X-Internal-Auth-Secret" = String, Header, description = "Admin shared secret")
    ),
    responses(
        (status = 204, description = "Block removed"),
        (status = 404, description = "Unknown block"),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Internal"
)]
fn doc_delete_block() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_get_availability,
        doc_create_booking,
        doc_get_booking,
        doc_cancel_booking,
        doc_create_checkout,
        doc_billing_portal,
        doc_stripe_webhook,
        doc_reminder_sweep,
        doc_list_windows,
        doc_replace_windows,
        doc_add_block,
        doc_delete_block
    ),
    components(
        schemas(
            AvailabilityResponse,
            CreateBookingBody,
            BookingResponse,
            CancelBookingBody,
            CheckoutBody,
            CheckoutResponse,
            PortalBody,
            PortalResponse,
            WindowBody,
            ReplaceWindowsBody,
            BlockBody,
            SweepReport,
            SweepFailure
        )
    ),
    tags(
        (name = "Scheduling", description = "Availability and bookings"),
        (name = "Payments", description = "Checkout and payment notifications"),
        (name = "Internal", description = "Cron trigger and availability administration")
    )
)]
pub struct SchedulingApiDoc;
