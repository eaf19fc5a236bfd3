//! PostgreSQL implementation for registered client storage

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::{ClientStore, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

/// PostgreSQL implementation of client storage
pub struct PostgresClientStore {
    pool: PgPool,
}

impl PostgresClientStore {
    /// Create a new PostgreSQL client store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert PostgreSQL row to Client
    fn row_to_client(row: &PgRow) -> Result<Client> {
        let client_id: String = row
            .try_get("client_id")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get client_id: {}", e)))?;
        let user_account_id: Option<String> = row.try_get("user_account_id").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get user_account_id: {}", e))
        })?;
        let parameters_json: serde_json::Value = row.try_get("parameters").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get parameters: {}", e))
        })?;
        let parameters: Parameters = serde_json::from_value(parameters_json)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        Ok(Client {
            client_id,
            user_account_id,
            parameters,
        })
    }
}

#[async_trait]
impl ClientStore for PostgresClientStore {
    async fn save(&self, client: &Client) -> Result<()> {
        let parameters_json = serde_json::Value::Object(client.parameters.clone());

        sqlx::query(
            r#"
            INSERT INTO oauth_clients (client_id, user_account_id, parameters, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.user_account_id)
        .bind(&parameters_json)
        .bind(Utc::now())
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
            "SELECT client_id, user_account_id, parameters FROM oauth_clients WHERE client_id = $1",
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
