//! In-memory registration storage implementation
//!
//! This module provides in-memory implementations for client and initial access token storage.

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

pub type Result<T> = std::result::Result<T, StorageError>;

/// In-memory implementation for registration storage
#[derive(Default)]
pub struct MemoryRegistrationStorage {
    clients: Mutex<HashMap<String, Client>>,
    initial_access_tokens: Mutex<HashMap<String, InitialAccessToken>>,
}

impl MemoryRegistrationStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a pre-provisioned initial access token resolvable.
    ///
    /// Tokens are provisioned out of band; this exists for local development and tests.
    pub fn insert_initial_access_token(&self, token: InitialAccessToken) -> Result<()> {
        let mut tokens = self
            .initial_access_tokens
            .lock()
            .map_err(|e| StorageError::SerializationFailed(format!("Lock error: {}", e)))?;
        tokens.insert(token.id.clone(), token);
        Ok(())
    }

    /// Number of persisted clients
    pub fn client_count(&self) -> Result<usize> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::SerializationFailed(format!("Lock error: {}", e)))?;
        Ok(clients.len())
    }
}

#[async_trait]
impl ClientStore for MemoryRegistrationStorage {
    async fn save(&self, client: &Client) -> Result<()> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::SerializationFailed(format!("Lock error: {}", e)))?;
        match clients.entry(client.client_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(client.client_id.clone())),
            Entry::Vacant(entry) => {
                entry.insert(client.clone());
                Ok(())
            }
        }
    }

    async fn find_client(&self, client_id: &str) -> Result<Option<Client>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::SerializationFailed(format!("Lock error: {}", e)))?;
        Ok(clients.get(client_id).cloned())
    }
}

#[async_trait]
impl InitialAccessTokenStore for MemoryRegistrationStorage {
    async fn find_initial_access_token(&self, id: &str) -> Result<Option<InitialAccessToken>> {
        let tokens = self
            .initial_access_tokens
            .lock()
            .map_err(|e| StorageError::SerializationFailed(format!("Lock error: {}", e)))?;
        Ok(tokens.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn test_client(client_id: &str) -> Client {
        let mut parameters = Parameters::new();
        parameters.insert("client_name".to_string(), json!("Test Client"));
        Client {
            client_id: client_id.to_string(),
            user_account_id: Some("u1".to_string()),
            parameters,
        }
    }

    #[tokio::test]
    async fn test_save_and_find_client() {
        let storage = MemoryRegistrationStorage::new();
        let client = test_client("client-1");

        storage.save(&client).await.unwrap();

        let found = storage.find_client("client-1").await.unwrap();
        assert_eq!(found, Some(client));
        assert!(storage.find_client("client-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_client_id() {
        let storage = MemoryRegistrationStorage::new();
        storage.save(&test_client("client-1")).await.unwrap();

        let result = storage.save(&test_client("client-1")).await;
        assert!(matches!(result, Err(StorageError::AlreadyExists(id)) if id == "client-1"));
        assert_eq!(storage.client_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_initial_access_token() {
        let storage = MemoryRegistrationStorage::new();
        let token = InitialAccessToken {
            id: "tok-1".to_string(),
            user_account_id: Some("u1".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            revoked: true,
        };
        storage.insert_initial_access_token(token).unwrap();

        // Revoked tokens are still returned; the gate decides what to do with them.
        let found = storage
            .find_initial_access_token("tok-1")
            .await
            .unwrap()
            .unwrap();
        assert!(found.is_revoked());
        assert!(
            storage
                .find_initial_access_token("tok-2")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_create_rejects_empty_identifier() {
        let storage = MemoryRegistrationStorage::new();
        let result = storage.create("", Parameters::new(), None);
        assert!(matches!(result, Err(StorageError::InvalidData(_))));
    }
}
