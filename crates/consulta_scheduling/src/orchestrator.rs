// --- File: crates/consulta_scheduling/src/orchestrator.rs ---
//! Booking creation and cancellation.
//!
//! Creation runs validate, resolve purchase, reserve, provision, confirm. A
//! failure at any step leaves no pending booking behind: a reservation whose
//! provisioning failed is cancelled before the error is returned.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use consulta_common::models::{Booking, BookingStatus, PurchaseStatus};
use consulta_config::AppConfig;
use consulta_db::BookingRepository;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::availability::SlotRules;
use crate::error::SchedulingError;
use crate::provisioner::MeetingProvisioner;
use crate::reconciler::{ClientIdentity, PaymentReconciler};
use crate::reservation::{Reservation, ReservationRequest, SlotReservation};

pub const PROVISIONING_FAILED_REASON: &str = "provisioning failed";
const RELEASE_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateBookingRequest {
    pub payment_session_id: String,
    pub plan_id: String,
    /// `YYYY-MM-DD` in the advisor's time zone.
    pub date: String,
    /// `HH:MM` in the advisor's time zone.
    pub time: String,
    pub notes: Option<String>,
    pub client: ClientIdentity,
    /// User id the caller claims to be, if authenticated.
    pub requester_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub join_url: Option<String>,
}

impl From<Booking> for CreatedBooking {
    fn from(booking: Booking) -> Self {
        let join_url = booking.join_url.clone();
        Self { booking, join_url }
    }
}

pub struct BookingOrchestrator {
    config: Arc<AppConfig>,
    reconciler: Arc<PaymentReconciler>,
    reservation: Arc<SlotReservation>,
    provisioner: Arc<MeetingProvisioner>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingOrchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        reconciler: Arc<PaymentReconciler>,
        reservation: Arc<SlotReservation>,
        provisioner: Arc<MeetingProvisioner>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            config,
            reconciler,
            reservation,
            provisioner,
            bookings,
        }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<CreatedBooking, SchedulingError> {
        // validating
        let plan = self
            .config
            .plan(&request.plan_id)
            .ok_or_else(|| SchedulingError::NotFound(format!("plan '{}'", request.plan_id)))?;
        let rules = SlotRules::from_config(&self.config)?;
        let date = NaiveDate::parse_from_str(&request.date, "%Y-%m-%d").map_err(|_| {
            SchedulingError::Validation("Invalid date format (YYYY-MM-DD)".to_string())
        })?;
        let time = NaiveTime::parse_from_str(&request.time, "%H:%M").map_err(|_| {
            SchedulingError::Validation("Invalid time format (HH:MM)".to_string())
        })?;
        let starts_at = rules
            .time_zone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                SchedulingError::Validation(format!(
                    "{} {} does not exist in {}",
                    request.date, request.time, rules.time_zone
                ))
            })?;

        let purchase = self
            .reconciler
            .resolve_purchase(&request.payment_session_id, &request.client)
            .await?;
        if purchase.status != PurchaseStatus::Active {
            return Err(SchedulingError::InactivePurchase(purchase.id));
        }
        if let Some(requester) = request.requester_id.as_deref() {
            if requester != purchase.user_id {
                return Err(SchedulingError::Unauthorized(
                    "purchase belongs to another user".to_string(),
                ));
            }
        }

        if let Some(existing) = self
            .bookings
            .find_active_booking_for_purchase(&purchase.id)
            .await?
        {
            info!(
                "Session {} already booked as {}, returning it",
                request.payment_session_id, existing.id
            );
            return Ok(existing.into());
        }

        // reservingSlot
        let booking = match self
            .reservation
            .reserve(ReservationRequest {
                user_id: purchase.user_id.clone(),
                purchase_id: purchase.id.clone(),
                plan_id: plan.id.clone(),
                starts_at,
                duration_minutes: plan.duration_minutes,
                notes: request.notes.clone(),
            })
            .await?
        {
            Reservation::Created(booking) => booking,
            Reservation::AlreadyBooked(existing) => return Ok(existing.into()),
        };

        // provisioning
        let details = match self.provisioner.provision(&booking, &plan.name).await {
            Ok(details) => details,
            Err(e) => {
                error!("Provisioning booking {} failed: {}", booking.id, e);
                if self.release_unprovisioned(&booking.id).await {
                    return Err(SchedulingError::ProvisioningFailed(e.to_string()));
                }
                return Err(SchedulingError::ProvisioningFailed(format!(
                    "{}; booking {} could not be released and may still hold its slot",
                    e, booking.id
                )));
            }
        };

        // persisted
        match self
            .bookings
            .confirm_booking(&booking.id, details.clone())
            .await?
        {
            Some(confirmed) => {
                info!(
                    "Booking {} confirmed for {} ({} min)",
                    confirmed.id, confirmed.starts_at, confirmed.duration_minutes
                );
                Ok(confirmed.into())
            }
            None => {
                // Cancelled while the meeting was being created.
                warn!(
                    "Booking {} left pending state during provisioning, removing meeting",
                    booking.id
                );
                let mut orphan = booking;
                orphan.meeting_id = Some(details.meeting_id);
                orphan.calendar_event_id = details.calendar_event_id;
                self.provisioner.teardown(&orphan).await;
                Err(SchedulingError::SlotConflict(
                    "the booking was cancelled while it was being confirmed".to_string(),
                ))
            }
        }
    }

    fn check_owner(booking: &Booking, requester_id: &str) -> Result<(), SchedulingError> {
        if booking.user_id != requester_id {
            return Err(SchedulingError::Unauthorized(format!(
                "booking {} belongs to another user",
                booking.id
            )));
        }
        Ok(())
    }

    /// Cancels a reservation whose meeting could not be created, retrying the
    /// write once. Returns false when the booking may still be pending.
    async fn release_unprovisioned(&self, booking_id: &str) -> bool {
        for attempt in 1..=RELEASE_ATTEMPTS {
            match self
                .bookings
                .cancel_booking(booking_id, PROVISIONING_FAILED_REASON)
                .await
            {
                Ok(_) => return true,
                Err(e) => error!(
                    "Releasing booking {} after failed provisioning failed (attempt {}/{}): {}",
                    booking_id, attempt, RELEASE_ATTEMPTS, e
                ),
            }
        }
        false
    }

    /// Owner-only lookup.
    pub async fn get_booking(
        &self,
        booking_id: &str,
        requester_id: &str,
    ) -> Result<Booking, SchedulingError> {
        let booking = self
            .bookings
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound(format!("booking {}", booking_id)))?;
        Self::check_owner(&booking, requester_id)?;
        Ok(booking)
    }

    /// Tears down external artifacts (best effort) and cancels the booking,
    /// which frees its interval.
    pub async fn cancel(
        &self,
        booking_id: &str,
        requester_id: &str,
        reason: Option<String>,
    ) -> Result<Booking, SchedulingError> {
        let booking = self.get_booking(booking_id, requester_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(SchedulingError::Validation(format!(
                "booking {} is already cancelled",
                booking_id
            )));
        }

        let report = self.provisioner.teardown(&booking).await;
        if !report.is_clean() {
            warn!(
                "Cancelling booking {} with incomplete external cleanup: {:?}",
                booking_id, report
            );
        }

        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| self.config.scheduling.default_cancellation_reason.clone());
        let cancelled = self
            .bookings
            .cancel_booking(booking_id, &reason)
            .await?
            .ok_or_else(|| {
                SchedulingError::Validation(format!("booking {} is already cancelled", booking_id))
            })?;
        info!("Booking {} cancelled: {}", booking_id, reason);
        Ok(cancelled)
    }
}
