use consulta_common::services::{
    BoxFuture, CheckoutRequest, CheckoutSession, PaymentProvider, PaymentSession, ProviderError,
};
use consulta_config::StripeConfig;
use std::sync::Arc;

use crate::logic::{create_checkout_session, create_portal_session, retrieve_checkout_session};

/// Stripe-backed payment provider
pub struct StripePaymentProvider {
    config: Arc<StripeConfig>,
}

impl StripePaymentProvider {
    /// Create a new Stripe payment provider
    pub fn new(config: Arc<StripeConfig>) -> Self {
        Self { config }
    }
}

impl PaymentProvider for StripePaymentProvider {
    fn retrieve_session(&self, session_id: &str) -> BoxFuture<'_, PaymentSession, ProviderError> {
        let session_id = session_id.to_string();
        Box::pin(async move {
            let session = retrieve_checkout_session(&self.config, &session_id).await?;
            Ok(session.to_payment_session())
        })
    }

    fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> BoxFuture<'_, CheckoutSession, ProviderError> {
        Box::pin(async move { Ok(create_checkout_session(&self.config, &request).await?) })
    }

    fn create_portal_session(&self, customer_id: &str) -> BoxFuture<'_, String, ProviderError> {
        let customer_id = customer_id.to_string();
        Box::pin(async move { Ok(create_portal_session(&self.config, &customer_id).await?) })
    }
}
