//! SQLite storage implementations
//!
//! This module provides SQLite-based implementations of all storage traits.
//! SQLite is suitable for single-instance deployments and development.

mod clients;
mod initial_access_tokens;

use crate::errors::StorageError;
use crate::oauth::types::{Client, InitialAccessToken};
use crate::storage::traits::*;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

pub use clients::SqliteClientStore;
pub use initial_access_tokens::SqliteInitialAccessTokenStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Comprehensive SQLite registration storage implementation
pub struct SqliteRegistrationStorage {
    pool: SqlitePool,
    client_store: Arc<SqliteClientStore>,
    initial_access_token_store: Arc<SqliteInitialAccessTokenStore>,
}

impl SqliteRegistrationStorage {
    /// Create a new SQLite registration storage instance
    pub fn new(pool: SqlitePool) -> Self {
        let client_store = Arc::new(SqliteClientStore::new(pool.clone()));
        let initial_access_token_store =
            Arc::new(SqliteInitialAccessTokenStore::new(pool.clone()));

        Self {
            pool,
            client_store,
            initial_access_token_store,
        }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ClientStore for SqliteRegistrationStorage {
    async fn save(&self, client: &Client) -> Result<()> {
        self.client_store.save(client).await
    }

    async fn find_client(&self, client_id: &str) -> Result<Option<Client>> {
        self.client_store.find_client(client_id).await
    }
}

#[async_trait]
impl InitialAccessTokenStore for SqliteRegistrationStorage {
    async fn find_initial_access_token(&self, id: &str) -> Result<Option<InitialAccessToken>> {
        self.initial_access_token_store
            .find_initial_access_token(id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::types::Parameters;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_storage() -> SqliteRegistrationStorage {
        // A single connection keeps the in-memory database shared across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = SqliteRegistrationStorage::new(pool);
        storage.migrate().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_client_round_trip() {
        let storage = test_storage().await;

        let mut parameters = Parameters::new();
        parameters.insert("client_name".to_string(), json!("Démo"));
        parameters.insert(
            "redirect_uris".to_string(),
            json!(["https://example.com/callback"]),
        );
        let client = storage
            .create("client-1", parameters, Some("u1".to_string()))
            .unwrap();

        storage.save(&client).await.unwrap();

        let found = storage.find_client("client-1").await.unwrap();
        assert_eq!(found, Some(client.clone()));

        let duplicate = storage.save(&client).await;
        assert!(matches!(duplicate, Err(StorageError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_initial_access_token_lookup() {
        let storage = test_storage().await;
        let expires_at = Utc::now() + Duration::hours(1);

        sqlx::query(
            "INSERT INTO initial_access_tokens (id, user_account_id, expires_at, revoked) VALUES (?, ?, ?, ?)",
        )
        .bind("tok-1")
        .bind("u1")
        .bind(expires_at.to_rfc3339())
        .bind(1_i64)
        .execute(&storage.pool)
        .await
        .unwrap();

        let token = storage
            .find_initial_access_token("tok-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.user_account_id.as_deref(), Some("u1"));
        assert!(token.revoked);
        assert_eq!(token.expires_at.timestamp(), expires_at.timestamp());

        assert!(
            storage
                .find_initial_access_token("tok-2")
                .await
                .unwrap()
                .is_none()
        );
    }
}
