//! PostgreSQL storage implementations
//!
//! This module provides PostgreSQL-based implementations of all storage traits.
//! PostgreSQL is suitable for production deployments with high availability requirements.

mod clients;
mod initial_access_tokens;

use crate::errors::StorageError;
use crate::oauth::types::{Client, InitialAccessToken};
use crate::storage::traits::*;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use std::sync::Arc;

pub use clients::PostgresClientStore;
pub use initial_access_tokens::PostgresInitialAccessTokenStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Comprehensive PostgreSQL registration storage implementation
pub struct PostgresRegistrationStorage {
    pool: PgPool,
    client_store: Arc<PostgresClientStore>,
    initial_access_token_store: Arc<PostgresInitialAccessTokenStore>,
}

impl PostgresRegistrationStorage {
    /// Create a new PostgreSQL registration storage instance
    pub fn new(pool: PgPool) -> Self {
        let client_store = Arc::new(PostgresClientStore::new(pool.clone()));
        let initial_access_token_store =
            Arc::new(PostgresInitialAccessTokenStore::new(pool.clone()));

        Self {
            pool,
            client_store,
            initial_access_token_store,
        }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl ClientStore for PostgresRegistrationStorage {
    async fn save(&self, client: &Client) -> Result<()> {
        self.client_store.save(client).await
    }

    async fn find_client(&self, client_id: &str) -> Result<Option<Client>> {
        self.client_store.find_client(client_id).await
    }
}

#[async_trait]
impl InitialAccessTokenStore for PostgresRegistrationStorage {
    async fn find_initial_access_token(&self, id: &str) -> Result<Option<InitialAccessToken>> {
        self.initial_access_token_store
            .find_initial_access_token(id)
            .await
    }
}
