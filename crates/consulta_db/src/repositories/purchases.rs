//! Purchase repository trait

use crate::error::DbError;
use consulta_common::models::Purchase;
use consulta_common::services::BoxFuture;

#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchase {
    pub user_id: String,
    pub product_id: String,
    pub payment_session_id: String,
}

pub trait PurchaseRepository: Send + Sync {
    fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> BoxFuture<'_, Option<Purchase>, DbError>;

    /// Creates an active purchase for the payment session, or returns the one
    /// that already exists for it. Never creates a second row per session.
    fn create_if_absent(&self, purchase: NewPurchase) -> BoxFuture<'_, Purchase, DbError>;
}
