// --- File: crates/consulta_scheduling/src/reconciler.rs ---
//! Links a payment session to the purchase that proves it.
//!
//! The payment webhook normally records the purchase, but it may arrive after
//! the client submits the booking form. The reconciler polls storage a bounded
//! number of times and then records the purchase itself through the same
//! idempotent path the webhook uses.

use consulta_common::models::Purchase;
use consulta_common::services::{PaymentProvider, PaymentSession, UserDirectory};
use consulta_config::AppConfig;
use consulta_db::{NewPurchase, PurchaseRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::clock::Delay;
use crate::error::SchedulingError;

/// Result of the storage lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseLookup {
    Found(Purchase),
    NotFound,
}

/// Identity the client typed into the booking form, used when the payment
/// session carries none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientIdentity {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Delay before the `attempt`-th retry (1-based): `attempt * base`.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt
}

pub struct PaymentReconciler {
    config: Arc<AppConfig>,
    payments: Arc<dyn PaymentProvider>,
    purchases: Arc<dyn PurchaseRepository>,
    users: Arc<dyn UserDirectory>,
    delay: Arc<dyn Delay>,
}

impl PaymentReconciler {
    pub fn new(
        config: Arc<AppConfig>,
        payments: Arc<dyn PaymentProvider>,
        purchases: Arc<dyn PurchaseRepository>,
        users: Arc<dyn UserDirectory>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        Self {
            config,
            payments,
            purchases,
            users,
            delay,
        }
    }

    fn is_advisory(&self, session: &PaymentSession) -> bool {
        session.product_tag.as_deref() == Some(self.config.scheduling.advisory_product_tag.as_str())
    }

    /// Resolves the purchase behind `payment_session_id`, creating it from the
    /// session when the payment notification has not been processed yet.
    pub async fn resolve_purchase(
        &self,
        payment_session_id: &str,
        client: &ClientIdentity,
    ) -> Result<Purchase, SchedulingError> {
        let session = self
            .payments
            .retrieve_session(payment_session_id)
            .await
            .map_err(|e| {
                warn!("Payment session {} could not be retrieved: {}", payment_session_id, e);
                SchedulingError::InvalidPayment(format!(
                    "payment session {} could not be retrieved",
                    payment_session_id
                ))
            })?;

        if !session.paid {
            return Err(SchedulingError::InvalidPayment(format!(
                "payment session {} is not paid",
                payment_session_id
            )));
        }
        if !self.is_advisory(&session) {
            return Err(SchedulingError::InvalidPayment(format!(
                "payment session {} is not for an advisory session",
                payment_session_id
            )));
        }

        match self.lookup_with_retry(&session.id).await? {
            PurchaseLookup::Found(purchase) => Ok(purchase),
            PurchaseLookup::NotFound => {
                info!(
                    "No purchase recorded for session {} after retries; recording it from the session",
                    session.id
                );
                self.record_paid_session(&session, client).await
            }
        }
    }

    /// One immediate lookup, then up to `payment_lookup_retries` more, the
    /// n-th after waiting `n * payment_lookup_base_delay_ms`.
    pub async fn lookup_with_retry(
        &self,
        payment_session_id: &str,
    ) -> Result<PurchaseLookup, SchedulingError> {
        let base = Duration::from_millis(self.config.scheduling.payment_lookup_base_delay_ms);
        let retries = self.config.scheduling.payment_lookup_retries;

        for attempt in 0..=retries {
            if attempt > 0 {
                let wait = retry_delay(base, attempt);
                debug!(
                    "Purchase for {} not found yet, retry {}/{} in {:?}",
                    payment_session_id, attempt, retries, wait
                );
                self.delay.sleep(wait).await;
            }
            if let Some(purchase) = self
                .purchases
                .find_by_payment_session(payment_session_id)
                .await?
            {
                return Ok(PurchaseLookup::Found(purchase));
            }
        }
        Ok(PurchaseLookup::NotFound)
    }

    /// Records the purchase for a paid session. Safe to call repeatedly and
    /// concurrently for the same session: storage keeps one row per session.
    pub async fn record_paid_session(
        &self,
        session: &PaymentSession,
        client: &ClientIdentity,
    ) -> Result<Purchase, SchedulingError> {
        let email = session
            .customer_email
            .as_deref()
            .or(client.email.as_deref())
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                SchedulingError::IncompletePaymentData(format!(
                    "payment session {} has no customer email",
                    session.id
                ))
            })?;
        let product_id = session
            .product_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                SchedulingError::IncompletePaymentData(format!(
                    "payment session {} has no product id",
                    session.id
                ))
            })?;
        let name = session.customer_name.as_deref().or(client.name.as_deref());

        let user_id = self
            .users
            .find_or_create_user(email, name)
            .await
            .map_err(|e| {
                error!("User lookup for session {} failed: {}", session.id, e);
                SchedulingError::IncompletePaymentData(format!(
                    "customer of payment session {} could not be resolved",
                    session.id
                ))
            })?;

        let purchase = self
            .purchases
            .create_if_absent(NewPurchase {
                user_id,
                product_id: product_id.to_string(),
                payment_session_id: session.id.clone(),
            })
            .await?;
        info!(
            "Purchase {} recorded for payment session {}",
            purchase.id, session.id
        );
        Ok(purchase)
    }

    /// Handles an asynchronous payment notification. Sessions that are unpaid
    /// or for another product are ignored (`Ok(None)`).
    pub async fn accept_notification(
        &self,
        session: &PaymentSession,
    ) -> Result<Option<Purchase>, SchedulingError> {
        if !session.paid || !self.is_advisory(session) {
            debug!(
                "Ignoring payment notification for session {} (paid: {}, tag: {:?})",
                session.id, session.paid, session.product_tag
            );
            return Ok(None);
        }
        self.record_paid_session(session, &ClientIdentity::default())
            .await
            .map(Some)
    }
}
