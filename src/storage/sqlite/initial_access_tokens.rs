//! SQLite implementation for initial access token lookups

use crate::errors::StorageError;
use crate::oauth::types::InitialAccessToken;
use crate::storage::traits::{InitialAccessTokenStore, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of initial access token storage
pub struct SqliteInitialAccessTokenStore {
    pool: SqlitePool,
}

impl SqliteInitialAccessTokenStore {
    /// Create a new SQLite initial access token store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_initial_access_token(row: &SqliteRow) -> Result<InitialAccessToken> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get id: {}", e)))?;
        let user_account_id: Option<String> = row.try_get("user_account_id").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get user_account_id: {}", e))
        })?;
        let expires_at_str: String = row
            .try_get("expires_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get expires_at: {}", e)))?;
        let expires_at = chrono::DateTime::parse_from_rfc3339(&expires_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid expires_at timestamp: {}", e)))?
            .with_timezone(&Utc);
        let revoked: i64 = row
            .try_get("revoked")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get revoked: {}", e)))?;

        Ok(InitialAccessToken {
            id,
            user_account_id,
            expires_at,
            revoked: revoked != 0,
        })
    }
}

#[async_trait]
impl InitialAccessTokenStore for SqliteInitialAccessTokenStore {
    async fn find_initial_access_token(&self, id: &str) -> Result<Option<InitialAccessToken>> {
        let row = sqlx::query(
            "SELECT id, user_account_id, expires_at, revoked FROM initial_access_tokens WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            StorageError::QueryFailed(format!("Failed to get initial access token: {}", e))
        })?;

        match row {
            Some(row) => Ok(Some(Self::row_to_initial_access_token(&row)?)),
            None => Ok(None),
        }
    }
}
