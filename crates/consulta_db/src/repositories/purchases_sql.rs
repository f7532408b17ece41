//! SQL implementation of the purchase repository

use crate::error::DbError;
use crate::repositories::purchases::{NewPurchase, PurchaseRepository};
use crate::repositories::rows::{purchase_from_row, to_timestamp, PURCHASE_COLUMNS};
use crate::DbClient;
use chrono::Utc;
use consulta_common::models::{Purchase, PurchaseStatus};
use consulta_common::services::BoxFuture;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SqlPurchaseRepository {
    db_client: DbClient,
}

impl SqlPurchaseRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn fetch_by_session(&self, payment_session_id: &str) -> Result<Option<Purchase>, DbError> {
        let query = format!(
            "SELECT {} FROM purchases WHERE payment_session_id = $1",
            PURCHASE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(payment_session_id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(purchase_from_row).transpose()
    }
}

impl PurchaseRepository for SqlPurchaseRepository {
    fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> BoxFuture<'_, Option<Purchase>, DbError> {
        let payment_session_id = payment_session_id.to_string();
        Box::pin(async move { self.fetch_by_session(&payment_session_id).await })
    }

    fn create_if_absent(&self, purchase: NewPurchase) -> BoxFuture<'_, Purchase, DbError> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO purchases (id, user_id, product_id, payment_session_id, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (payment_session_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&purchase.user_id)
            .bind(&purchase.product_id)
            .bind(&purchase.payment_session_id)
            .bind(PurchaseStatus::Active.as_str())
            .bind(to_timestamp(Utc::now()))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!(
                    "Failed to record purchase for session {}: {}",
                    purchase.payment_session_id, e
                );
                DbError::QueryError(e.to_string())
            })?;

            if result.rows_affected() == 1 {
                info!(
                    "Recorded purchase of {} for session {}",
                    purchase.product_id, purchase.payment_session_id
                );
            }

            self.fetch_by_session(&purchase.payment_session_id)
                .await?
                .ok_or_else(|| {
                    DbError::QueryError(format!(
                        "purchase for session {} vanished after insert",
                        purchase.payment_session_id
                    ))
                })
        })
    }
}
