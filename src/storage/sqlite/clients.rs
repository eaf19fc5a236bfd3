//! SQLite implementation for registered client storage

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::{ClientStore, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of client storage
pub struct SqliteClientStore {
    pool: SqlitePool,
}

impl SqliteClientStore {
    /// Create a new SQLite client store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert SQLite row to Client
    fn row_to_client(row: &SqliteRow) -> Result<Client> {
        let client_id: String = row
            .try_get("client_id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client_id: {}", e)))?;
        let user_account_id: Option<String> = row.try_get("user_account_id").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get user_account_id: {}", e))
        })?;
        let parameters_json: String = row.try_get("parameters").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get parameters: {}", e))
        })?;
        let parameters: Parameters = serde_json::from_str(&parameters_json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        Ok(Client {
            client_id,
            user_account_id,
            parameters,
        })
    }
}

#[async_trait]
impl ClientStore for SqliteClientStore {
    async fn save(&self, client: &Client) -> Result<()> {
        let parameters_json = serde_json::to_string(&client.parameters)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;
        let created_at_str = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO oauth_clients (client_id, user_account_id, parameters, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.user_account_id)
        .bind(&parameters_json)
        .bind(&created_at_str)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StorageError::AlreadyExists(client.client_id.clone())
            }
            _ => StorageError::QueryFailed(format!("Failed to store client: {}", e)),
        })?;

        Ok(())
    }

    async fn find_client(&self, client_id: &str) -> Result<Option<Client>> {
        let row = sqlx::query(
            "SELECT client_id, user_account_id, parameters FROM oauth_clients WHERE client_id = ?",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("Failed to get client: {}", e)))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_client(&row)?)),
            None => Ok(None),
        }
    }
}
