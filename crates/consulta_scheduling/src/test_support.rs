//! In-memory fakes of every repository and collaborator, plus a harness that
//! wires them into the scheduling components.

use chrono::{DateTime, NaiveTime, TimeZone, Utc, Weekday};
use consulta_common::models::{
    Booking, BookingStatus, CalendarBlock, MeetingDetails, Purchase, PurchaseStatus,
    ReminderThreshold, UserProfile, WeeklyAvailabilityWindow,
};
use consulta_common::services::{
    BoxFuture, CalendarEventRequest, CalendarProvider, CheckoutRequest, CheckoutSession,
    CreatedMeeting, EmailProvider, MeetingProvider, MeetingRequest, PaymentProvider,
    PaymentSession, ProviderError, ReminderMessage, UserDirectory,
};
use consulta_config::{AppConfig, PlanConfig, SchedulingConfig, SecurityConfig};
use consulta_db::{
    AvailabilityRepository, BookingRepository, DbError, NewBooking, NewPurchase,
    PurchaseRepository, ReservationOutcome,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::availability::AvailabilityCalculator;
use crate::clock::{Clock, Delay};
use crate::handlers::SchedulingState;
use crate::orchestrator::BookingOrchestrator;
use crate::provisioner::MeetingProvisioner;
use crate::reconciler::PaymentReconciler;
use crate::reminders::ReminderScheduler;
use crate::reservation::SlotReservation;

pub const CRON_SECRET: &str = "cron-secret";
pub const ADMIN_SECRET: &str = "admin-secret";

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn window(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> WeeklyAvailabilityWindow {
    WeeklyAvailabilityWindow {
        id: format!("{}-{}", weekday, start),
        weekday,
        start,
        end,
        active: true,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        scheduling: SchedulingConfig {
            time_zone: "Europe/Zurich".to_string(),
            ..SchedulingConfig::default()
        },
        plans: vec![
            PlanConfig {
                id: "deep-dive".to_string(),
                name: "Deep dive".to_string(),
                duration_minutes: 90,
                unit_amount: 24000,
                currency: Some("chf".to_string()),
            },
            PlanConfig {
                id: "intro".to_string(),
                name: "Intro call".to_string(),
                duration_minutes: 30,
                unit_amount: 0,
                currency: None,
            },
        ],
        security: SecurityConfig {
            cron_secret: Some(CRON_SECRET.to_string()),
            admin_secret: Some(ADMIN_SECRET.to_string()),
        },
        ..AppConfig::default()
    }
}

// --- Time ---

pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Records requested waits instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits: Mutex<Vec<Duration>>,
}

impl Delay for RecordingDelay {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.waits.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

// --- Storage ---

#[derive(Default)]
pub struct InMemoryBookings {
    pub rows: Mutex<Vec<Booking>>,
    next_id: AtomicUsize,
    /// Number of upcoming `cancel_booking` calls that fail.
    pub cancel_failures: AtomicUsize,
}

impl InMemoryBookings {
    pub fn all(&self) -> Vec<Booking> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert(&self, booking: Booking) {
        self.rows.lock().unwrap().push(booking);
    }
}

pub fn booking_fixture(id: &str, user_id: &str, starts_at: DateTime<Utc>, minutes: i64) -> Booking {
    Booking {
        id: id.to_string(),
        user_id: user_id.to_string(),
        purchase_id: format!("purchase-{}", id),
        plan_id: "deep-dive".to_string(),
        starts_at,
        duration_minutes: minutes,
        status: BookingStatus::Confirmed,
        meeting_id: Some(format!("meeting-{}", id)),
        join_url: Some(format!("https://zoom.example/j/{}", id)),
        start_url: Some(format!("https://zoom.example/s/{}", id)),
        calendar_event_id: Some(format!("event-{}", id)),
        notes: None,
        reminder_72h_sent: false,
        reminder_24h_sent: false,
        reminder_1h_sent: false,
        cancellation_reason: None,
        created_at: starts_at,
        updated_at: starts_at,
    }
}

impl BookingRepository for InMemoryBookings {
    fn reserve_slot(&self, booking: NewBooking) -> BoxFuture<'_, ReservationOutcome, DbError> {
        Box::pin(async move {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows
                .iter()
                .find(|b| b.purchase_id == booking.purchase_id && b.status.is_active())
            {
                return Ok(ReservationOutcome::PurchaseAlreadyBooked(existing.clone()));
            }
            let end = booking.starts_at + chrono::Duration::minutes(booking.duration_minutes);
            let padded_start =
                booking.starts_at - chrono::Duration::minutes(booking.buffer_after_minutes);
            let padded_end = end + chrono::Duration::minutes(booking.buffer_before_minutes);
            if rows
                .iter()
                .any(|b| b.status.is_active() && b.overlaps(padded_start, padded_end))
            {
                return Ok(ReservationOutcome::SlotTaken);
            }
            let id = format!("booking-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let now = Utc::now();
            let created = Booking {
                id,
                user_id: booking.user_id,
                purchase_id: booking.purchase_id,
                plan_id: booking.plan_id,
                starts_at: booking.starts_at,
                duration_minutes: booking.duration_minutes,
                status: BookingStatus::Pending,
                meeting_id: None,
                join_url: None,
                start_url: None,
                calendar_event_id: None,
                notes: booking.notes,
                reminder_72h_sent: false,
                reminder_24h_sent: false,
                reminder_1h_sent: false,
                cancellation_reason: None,
                created_at: now,
                updated_at: now,
            };
            rows.push(created.clone());
            Ok(ReservationOutcome::Reserved(created))
        })
    }

    fn find_booking(&self, booking_id: &str) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == booking_id)
                .cloned())
        })
    }

    fn find_active_booking_for_purchase(
        &self,
        purchase_id: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let purchase_id = purchase_id.to_string();
        Box::pin(async move {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.purchase_id == purchase_id && b.status.is_active())
                .cloned())
        })
    }

    fn list_active_bookings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError> {
        Box::pin(async move {
            let mut found: Vec<Booking> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.status.is_active() && b.overlaps(start, end))
                .cloned()
                .collect();
            found.sort_by_key(|b| b.starts_at);
            Ok(found)
        })
    }

    fn confirm_booking(
        &self,
        booking_id: &str,
        meeting: MeetingDetails,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let mut rows = self.rows.lock().unwrap();
            let Some(booking) = rows
                .iter_mut()
                .find(|b| b.id == booking_id && b.status == BookingStatus::Pending)
            else {
                return Ok(None);
            };
            booking.status = BookingStatus::Confirmed;
            booking.meeting_id = Some(meeting.meeting_id);
            booking.join_url = Some(meeting.join_url);
            booking.start_url = Some(meeting.start_url);
            booking.calendar_event_id = meeting.calendar_event_id;
            Ok(Some(booking.clone()))
        })
    }

    fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &str,
    ) -> BoxFuture<'_, Option<Booking>, DbError> {
        let booking_id = booking_id.to_string();
        let reason = reason.to_string();
        Box::pin(async move {
            if self
                .cancel_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(DbError::QueryError("database is locked".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let Some(booking) = rows
                .iter_mut()
                .find(|b| b.id == booking_id && b.status != BookingStatus::Cancelled)
            else {
                return Ok(None);
            };
            booking.status = BookingStatus::Cancelled;
            booking.cancellation_reason = Some(reason);
            Ok(Some(booking.clone()))
        })
    }

    fn list_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<Booking>, DbError> {
        Box::pin(async move {
            let mut found: Vec<Booking> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|b| {
                    b.status == BookingStatus::Confirmed
                        && b.starts_at > now
                        && b.starts_at <= until
                        && !b.fully_reminded()
                })
                .cloned()
                .collect();
            found.sort_by_key(|b| b.starts_at);
            Ok(found)
        })
    }

    fn mark_reminder_sent(
        &self,
        booking_id: &str,
        threshold: ReminderThreshold,
    ) -> BoxFuture<'_, bool, DbError> {
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            let mut rows = self.rows.lock().unwrap();
            let Some(booking) = rows.iter_mut().find(|b| b.id == booking_id) else {
                return Ok(false);
            };
            let flag = match threshold {
                ReminderThreshold::Hours72 => &mut booking.reminder_72h_sent,
                ReminderThreshold::Hours24 => &mut booking.reminder_24h_sent,
                ReminderThreshold::Hours1 => &mut booking.reminder_1h_sent,
            };
            if *flag {
                return Ok(false);
            }
            *flag = true;
            Ok(true)
        })
    }
}

/// Purchases become visible to lookups only after `hidden_lookups` misses,
/// simulating a webhook that lands while the reconciler is polling.
#[derive(Default)]
pub struct InMemoryPurchases {
    pub rows: Mutex<Vec<Purchase>>,
    pub lookups: AtomicUsize,
    pub hidden_lookups: AtomicUsize,
    pub creates: AtomicUsize,
}

impl InMemoryPurchases {
    pub fn insert(&self, purchase: Purchase) {
        self.rows.lock().unwrap().push(purchase);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl PurchaseRepository for InMemoryPurchases {
    fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> BoxFuture<'_, Option<Purchase>, DbError> {
        let payment_session_id = payment_session_id.to_string();
        Box::pin(async move {
            let seen = self.lookups.fetch_add(1, Ordering::SeqCst);
            if seen < self.hidden_lookups.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.payment_session_id == payment_session_id)
                .cloned())
        })
    }

    fn create_if_absent(&self, purchase: NewPurchase) -> BoxFuture<'_, Purchase, DbError> {
        Box::pin(async move {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows
                .iter()
                .find(|p| p.payment_session_id == purchase.payment_session_id)
            {
                return Ok(existing.clone());
            }
            let created = Purchase {
                id: format!("purchase-{}", rows.len() + 1),
                user_id: purchase.user_id,
                product_id: purchase.product_id,
                payment_session_id: purchase.payment_session_id,
                status: PurchaseStatus::Active,
                created_at: Utc::now(),
            };
            rows.push(created.clone());
            Ok(created)
        })
    }
}

#[derive(Default)]
pub struct InMemoryAvailability {
    pub windows: Mutex<Vec<WeeklyAvailabilityWindow>>,
    pub blocks: Mutex<Vec<CalendarBlock>>,
}

impl AvailabilityRepository for InMemoryAvailability {
    fn list_windows(&self) -> BoxFuture<'_, Vec<WeeklyAvailabilityWindow>, DbError> {
        Box::pin(async move { Ok(self.windows.lock().unwrap().clone()) })
    }

    fn replace_windows(
        &self,
        windows: Vec<WeeklyAvailabilityWindow>,
    ) -> BoxFuture<'_, (), DbError> {
        Box::pin(async move {
            *self.windows.lock().unwrap() = windows;
            Ok(())
        })
    }

    fn list_blocks_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarBlock>, DbError> {
        Box::pin(async move {
            Ok(self
                .blocks
                .lock()
                .unwrap()
                .iter()
                .filter(|b| b.starts_at < end && b.ends_at > start)
                .cloned()
                .collect())
        })
    }

    fn add_block(&self, block: CalendarBlock) -> BoxFuture<'_, CalendarBlock, DbError> {
        Box::pin(async move {
            self.blocks.lock().unwrap().push(block.clone());
            Ok(block)
        })
    }

    fn delete_block(&self, block_id: &str) -> BoxFuture<'_, bool, DbError> {
        let block_id = block_id.to_string();
        Box::pin(async move {
            let mut blocks = self.blocks.lock().unwrap();
            let before = blocks.len();
            blocks.retain(|b| b.id != block_id);
            Ok(blocks.len() < before)
        })
    }
}

// --- Collaborators ---

#[derive(Default)]
pub struct FakeUsers {
    pub users: Mutex<Vec<UserProfile>>,
    pub fail: AtomicBool,
}

impl FakeUsers {
    pub fn add(&self, id: &str, email: &str, name: Option<&str>) {
        self.users.lock().unwrap().push(UserProfile {
            id: id.to_string(),
            email: email.to_string(),
            name: name.map(str::to_string),
        });
    }
}

impl UserDirectory for FakeUsers {
    fn find_or_create_user(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> BoxFuture<'_, String, ProviderError> {
        let email = email.trim().to_lowercase();
        let name = name.map(str::to_string);
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::new("users", "directory unavailable"));
            }
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter().find(|u| u.email == email) {
                return Ok(user.id.clone());
            }
            let id = format!("user-{}", users.len() + 1);
            users.push(UserProfile {
                id: id.clone(),
                email,
                name,
            });
            Ok(id)
        })
    }

    fn get_user(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, ProviderError> {
        let user_id = user_id.to_string();
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::new("users", "directory unavailable"));
            }
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == user_id)
                .cloned())
        })
    }
}

#[derive(Default)]
pub struct FakePayments {
    pub sessions: Mutex<HashMap<String, PaymentSession>>,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
}

impl FakePayments {
    pub fn add_paid(&self, id: &str, tag: &str, email: Option<&str>) {
        self.sessions.lock().unwrap().insert(
            id.to_string(),
            PaymentSession {
                id: id.to_string(),
                paid: true,
                product_tag: Some(tag.to_string()),
                product_id: Some("deep-dive".to_string()),
                customer_email: email.map(str::to_string),
                customer_name: Some("Ada Lovelace".to_string()),
            },
        );
    }

    pub fn add(&self, session: PaymentSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session);
    }
}

impl PaymentProvider for FakePayments {
    fn retrieve_session(&self, session_id: &str) -> BoxFuture<'_, PaymentSession, ProviderError> {
        let session_id = session_id.to_string();
        Box::pin(async move {
            self.sessions
                .lock()
                .unwrap()
                .get(&session_id)
                .cloned()
                .ok_or_else(|| ProviderError::not_found("stripe", "No such checkout session"))
        })
    }

    fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> BoxFuture<'_, CheckoutSession, ProviderError> {
        Box::pin(async move {
            let id = format!("cs_test_{}", request.product_id);
            self.checkouts.lock().unwrap().push(request);
            Ok(CheckoutSession {
                url: format!("https://checkout.example/{}", id),
                session_id: id,
            })
        })
    }

    fn create_portal_session(&self, customer_id: &str) -> BoxFuture<'_, String, ProviderError> {
        let customer_id = customer_id.to_string();
        Box::pin(async move { Ok(format!("https://billing.example/{}", customer_id)) })
    }
}

#[derive(Default)]
pub struct FakeMeetings {
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub created: Mutex<Vec<MeetingRequest>>,
    pub deleted: Mutex<Vec<String>>,
}

impl MeetingProvider for FakeMeetings {
    fn create_meeting(
        &self,
        request: MeetingRequest,
    ) -> BoxFuture<'_, CreatedMeeting, ProviderError> {
        Box::pin(async move {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(ProviderError::new("zoom", "service unavailable"));
            }
            let mut created = self.created.lock().unwrap();
            created.push(request);
            let id = format!("{}", 1000 + created.len());
            Ok(CreatedMeeting {
                join_url: format!("https://zoom.example/j/{}", id),
                start_url: format!("https://zoom.example/s/{}", id),
                id,
            })
        })
    }

    fn delete_meeting(&self, meeting_id: &str) -> BoxFuture<'_, (), ProviderError> {
        let meeting_id = meeting_id.to_string();
        Box::pin(async move {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(ProviderError::new("zoom", "service unavailable"));
            }
            self.deleted.lock().unwrap().push(meeting_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub created: Mutex<Vec<CalendarEventRequest>>,
    pub deleted: Mutex<Vec<String>>,
}

impl CalendarProvider for FakeCalendar {
    fn create_event(&self, request: CalendarEventRequest) -> BoxFuture<'_, String, ProviderError> {
        Box::pin(async move {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(ProviderError::new("gcal", "quota exceeded"));
            }
            let mut created = self.created.lock().unwrap();
            created.push(request);
            Ok(format!("event-{}", created.len()))
        })
    }

    fn delete_event(&self, event_id: &str) -> BoxFuture<'_, (), ProviderError> {
        let event_id = event_id.to_string();
        Box::pin(async move {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(ProviderError::new("gcal", "quota exceeded"));
            }
            self.deleted.lock().unwrap().push(event_id);
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct FakeEmail {
    pub sent: Mutex<Vec<ReminderMessage>>,
    /// Recipients whose sends fail.
    pub failing: Mutex<Vec<String>>,
}

impl EmailProvider for FakeEmail {
    fn send_reminder(&self, message: ReminderMessage) -> BoxFuture<'_, (), ProviderError> {
        Box::pin(async move {
            if self.failing.lock().unwrap().contains(&message.to_email) {
                return Err(ProviderError::new("sendgrid", "mailbox unavailable"));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        })
    }
}

// --- Harness ---

/// All fakes plus the components built on them, sharing one configuration.
pub struct Harness {
    pub config: Arc<AppConfig>,
    pub clock: Arc<FixedClock>,
    pub delay: Arc<RecordingDelay>,
    pub bookings: Arc<InMemoryBookings>,
    pub purchases: Arc<InMemoryPurchases>,
    pub availability: Arc<InMemoryAvailability>,
    pub users: Arc<FakeUsers>,
    pub payments: Arc<FakePayments>,
    pub meetings: Arc<FakeMeetings>,
    pub calendar: Arc<FakeCalendar>,
    pub email: Arc<FakeEmail>,
    pub calculator: Arc<AvailabilityCalculator>,
    pub reservation: Arc<SlotReservation>,
    pub reconciler: Arc<PaymentReconciler>,
    pub provisioner: Arc<MeetingProvisioner>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub reminders: Arc<ReminderScheduler>,
}

impl Harness {
    /// Monday 2031-03-03 10:00 UTC, Tuesday window 09:00-17:00 Zurich time.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let config = Arc::new(config);
        let clock = Arc::new(FixedClock::new(utc(2031, 3, 3, 10, 0)));
        let delay = Arc::new(RecordingDelay::default());
        let bookings = Arc::new(InMemoryBookings::default());
        let purchases = Arc::new(InMemoryPurchases::default());
        let availability = Arc::new(InMemoryAvailability::default());
        availability
            .windows
            .lock()
            .unwrap()
            .push(window(Weekday::Tue, hm(9, 0), hm(17, 0)));
        let users = Arc::new(FakeUsers::default());
        let payments = Arc::new(FakePayments::default());
        let meetings = Arc::new(FakeMeetings::default());
        let calendar = Arc::new(FakeCalendar::default());
        let email = Arc::new(FakeEmail::default());

        let calculator = Arc::new(AvailabilityCalculator::new(
            config.clone(),
            availability.clone(),
            bookings.clone(),
            clock.clone(),
        ));
        let reservation = Arc::new(SlotReservation::new(calculator.clone(), bookings.clone()));
        let reconciler = Arc::new(PaymentReconciler::new(
            config.clone(),
            payments.clone(),
            purchases.clone(),
            users.clone(),
            delay.clone(),
        ));
        let provisioner = Arc::new(MeetingProvisioner::new(
            config.clone(),
            meetings.clone(),
            Some(calendar.clone()),
            users.clone(),
        ));
        let orchestrator = Arc::new(BookingOrchestrator::new(
            config.clone(),
            reconciler.clone(),
            reservation.clone(),
            provisioner.clone(),
            bookings.clone(),
        ));
        let reminders = Arc::new(ReminderScheduler::new(
            config.clone(),
            bookings.clone(),
            users.clone(),
            email.clone(),
            clock.clone(),
        ));

        Self {
            config,
            clock,
            delay,
            bookings,
            purchases,
            availability,
            users,
            payments,
            meetings,
            calendar,
            email,
            calculator,
            reservation,
            reconciler,
            provisioner,
            orchestrator,
            reminders,
        }
    }

    pub fn state(&self) -> Arc<SchedulingState> {
        Arc::new(SchedulingState {
            config: self.config.clone(),
            calculator: self.calculator.clone(),
            orchestrator: self.orchestrator.clone(),
            reconciler: self.reconciler.clone(),
            reminders: self.reminders.clone(),
            availability: self.availability.clone(),
            payments: self.payments.clone(),
        })
    }
}
