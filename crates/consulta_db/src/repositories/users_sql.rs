//! Local user directory backed by the `users` table

use crate::error::DbError;
use crate::repositories::rows::{column, to_timestamp};
use crate::DbClient;
use chrono::Utc;
use consulta_common::models::UserProfile;
use consulta_common::services::{BoxFuture, ProviderError, UserDirectory};
use sqlx::any::AnyRow;
use tracing::{error, info};
use uuid::Uuid;

const PROVIDER: &str = "users";

#[derive(Debug, Clone)]
pub struct SqlUserDirectory {
    db_client: DbClient,
}

impl SqlUserDirectory {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, DbError> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &AnyRow) -> Result<UserProfile, DbError> {
    Ok(UserProfile {
        id: column(row, "users", "id")?,
        email: column(row, "users", "email")?,
        name: column(row, "users", "name")?,
    })
}

fn provider_error(err: DbError) -> ProviderError {
    error!("User directory error: {}", err);
    ProviderError::new(PROVIDER, err.to_string())
}

impl UserDirectory for SqlUserDirectory {
    fn find_or_create_user(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> BoxFuture<'_, String, ProviderError> {
        let email = email.trim().to_lowercase();
        let name = name.map(str::to_string);
        Box::pin(async move {
            if email.is_empty() {
                return Err(ProviderError::new(PROVIDER, "email is empty"));
            }

            let result = sqlx::query(
                "INSERT INTO users (id, email, name, created_at) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (email) DO NOTHING",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&email)
            .bind(name)
            .bind(to_timestamp(Utc::now()))
            .execute(self.db_client.pool())
            .await
            .map_err(|e| provider_error(DbError::QueryError(e.to_string())))?;

            if result.rows_affected() == 1 {
                info!("Created user for {}", email);
            }

            self.find_by_email(&email)
                .await
                .map_err(provider_error)?
                .map(|user| user.id)
                .ok_or_else(|| ProviderError::new(PROVIDER, "user vanished after insert"))
        })
    }

    fn get_user(&self, user_id: &str) -> BoxFuture<'_, Option<UserProfile>, ProviderError> {
        let user_id = user_id.to_string();
        Box::pin(async move {
            let row = sqlx::query("SELECT id, email, name FROM users WHERE id = $1")
                .bind(&user_id)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| provider_error(DbError::QueryError(e.to_string())))?;
            row.as_ref()
                .map(user_from_row)
                .transpose()
                .map_err(provider_error)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn directory() -> SqlUserDirectory {
        let client = DbClient::from_url("sqlite::memory:").await.unwrap();
        client.init_schema().await.unwrap();
        SqlUserDirectory::new(client)
    }

    #[tokio::test]
    async fn same_email_maps_to_one_user() {
        let users = directory().await;
        let first = users
            .find_or_create_user("Ada@Example.com ", Some("Ada"))
            .await
            .unwrap();
        let second = users.find_or_create_user("ada@example.com", None).await.unwrap();
        assert_eq!(first, second);

        let profile = users.get_user(&first).await.unwrap().unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn empty_email_is_rejected() {
        let users = directory().await;
        assert!(users.find_or_create_user("  ", None).await.is_err());
    }
}
