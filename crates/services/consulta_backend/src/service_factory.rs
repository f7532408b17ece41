// --- File: crates/services/consulta_backend/src/service_factory.rs ---
//! Builds the concrete adapters and wires them into the scheduling core.
use consulta_common::error::ConsultaError;
use consulta_common::services::{
    CalendarProvider, EmailProvider, MeetingProvider, PaymentProvider, UserDirectory,
};
use consulta_config::AppConfig;
use consulta_db::{
    AvailabilityRepository, BookingRepository, DbClient, PurchaseRepository,
    SqlAvailabilityRepository, SqlBookingRepository, SqlPurchaseRepository, SqlUserDirectory,
};
use consulta_mailer::SendGridEmailProvider;
use consulta_scheduling::{
    AvailabilityCalculator, BookingOrchestrator, MeetingProvisioner, PaymentReconciler,
    ReminderScheduler, SchedulingState, SlotReservation, SystemClock, TokioDelay,
};
use consulta_stripe::StripePaymentProvider;
use consulta_zoom::ZoomMeetingProvider;
use std::sync::Arc;

/// External services and repositories the scheduling core depends on.
pub struct ConsultaServiceFactory {
    pub bookings: Arc<dyn BookingRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub users: Arc<dyn UserDirectory>,
    pub payments: Arc<dyn PaymentProvider>,
    pub meetings: Arc<dyn MeetingProvider>,
    pub calendar: Option<Arc<dyn CalendarProvider>>,
    pub email: Arc<dyn EmailProvider>,
}

fn required<T: Clone>(section: Option<&T>, name: &str) -> Result<Arc<T>, ConsultaError> {
    section
        .cloned()
        .map(Arc::new)
        .ok_or_else(|| ConsultaError::ConfigError(format!("missing [{}] section", name)))
}

impl ConsultaServiceFactory {
    /// Create the adapters. Payments, meetings and email are required; the
    /// calendar is only set up when `use_gcal` is on.
    pub async fn new(config: &AppConfig, db: DbClient) -> Result<Self, ConsultaError> {
        let stripe = required(config.stripe.as_ref(), "stripe")?;
        let zoom = required(config.zoom.as_ref(), "zoom")?;
        let mailer = required(config.mailer.as_ref(), "mailer")?;

        Ok(Self {
            bookings: Arc::new(SqlBookingRepository::new(db.clone())),
            purchases: Arc::new(SqlPurchaseRepository::new(db.clone())),
            availability: Arc::new(SqlAvailabilityRepository::new(db.clone())),
            users: Arc::new(SqlUserDirectory::new(db)),
            payments: Arc::new(StripePaymentProvider::new(stripe)),
            meetings: Arc::new(ZoomMeetingProvider::new(zoom)),
            calendar: calendar_provider(config).await?,
            email: Arc::new(SendGridEmailProvider::new(mailer)),
        })
    }

    /// Assemble the scheduling components on top of these adapters.
    pub fn scheduling_state(&self, config: Arc<AppConfig>) -> SchedulingState {
        let clock = Arc::new(SystemClock);

        let calculator = Arc::new(AvailabilityCalculator::new(
            config.clone(),
            self.availability.clone(),
            self.bookings.clone(),
            clock.clone(),
        ));
        let reservation = Arc::new(SlotReservation::new(
            calculator.clone(),
            self.bookings.clone(),
        ));
        let reconciler = Arc::new(PaymentReconciler::new(
            config.clone(),
            self.payments.clone(),
            self.purchases.clone(),
            self.users.clone(),
            Arc::new(TokioDelay),
        ));
        let provisioner = Arc::new(MeetingProvisioner::new(
            config.clone(),
            self.meetings.clone(),
            self.calendar.clone(),
            self.users.clone(),
        ));
        let orchestrator = Arc::new(BookingOrchestrator::new(
            config.clone(),
            reconciler.clone(),
            reservation,
            provisioner,
            self.bookings.clone(),
        ));
        let reminders = Arc::new(ReminderScheduler::new(
            config.clone(),
            self.bookings.clone(),
            self.users.clone(),
            self.email.clone(),
            clock,
        ));

        SchedulingState {
            config,
            calculator,
            orchestrator,
            reconciler,
            reminders,
            availability: self.availability.clone(),
            payments: self.payments.clone(),
        }
    }
}

#[cfg(feature = "gcal")]
async fn calendar_provider(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CalendarProvider>>, ConsultaError> {
    use consulta_gcal::{create_calendar_hub, GoogleCalendarProvider};
    use tracing::info;

    let gcal = match config.gcal.as_ref() {
        Some(gcal) if config.use_gcal => gcal,
        _ => return Ok(None),
    };
    info!("Initializing Google Calendar provider...");
    let hub = create_calendar_hub(gcal).await?;
    let calendar_id = gcal
        .calendar_id
        .clone()
        .unwrap_or_else(|| "primary".to_string());
    Ok(Some(Arc::new(GoogleCalendarProvider::new(
        Arc::new(hub),
        calendar_id,
        gcal.invite_attendees,
    ))))
}

#[cfg(not(feature = "gcal"))]
async fn calendar_provider(
    config: &AppConfig,
) -> Result<Option<Arc<dyn CalendarProvider>>, ConsultaError> {
    if config.use_gcal {
        tracing::warn!("use_gcal is set but the backend was built without the gcal feature");
    }
    Ok(None)
}
