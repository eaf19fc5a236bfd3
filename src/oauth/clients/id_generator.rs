//! Client identifier generation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ClientRegistrationError;
use crate::oauth::types::generate_client_id;
use crate::storage::traits::ClientStore;

/// Produces fresh client identifiers
#[async_trait]
pub trait ClientIdGenerator: Send + Sync {
    /// Create an identifier not yet used by any client
    async fn create_client_id(&self) -> Result<String, ClientRegistrationError>;
}

/// Random UUID v4 identifiers
#[derive(Clone, Debug, Default)]
pub struct UuidClientIdGenerator;

#[async_trait]
impl ClientIdGenerator for UuidClientIdGenerator {
    async fn create_client_id(&self) -> Result<String, ClientRegistrationError> {
        Ok(generate_client_id())
    }
}

/// Wraps a generator and skips identifiers already present in the client store
///
/// The check is advisory; the store's uniqueness constraint on save remains
/// the authority when two registrations race.
pub struct StoreCheckedClientIdGenerator {
    inner: Arc<dyn ClientIdGenerator>,
    client_store: Arc<dyn ClientStore>,
    max_attempts: usize,
}

impl StoreCheckedClientIdGenerator {
    pub fn new(inner: Arc<dyn ClientIdGenerator>, client_store: Arc<dyn ClientStore>) -> Self {
        Self {
            inner,
            client_store,
            max_attempts: 5,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

#[async_trait]
impl ClientIdGenerator for StoreCheckedClientIdGenerator {
    async fn create_client_id(&self) -> Result<String, ClientRegistrationError> {
        for attempt in 1..=self.max_attempts {
            let client_id = self.inner.create_client_id().await?;
            let existing = self.client_store.find_client(&client_id).await.map_err(|e| {
                ClientRegistrationError::ClientIdGenerationFailed(format!(
                    "Unable to check client identifier: {}",
                    e.description()
                ))
            })?;
            if existing.is_none() {
                return Ok(client_id);
            }
            tracing::warn!(attempt, "generated client identifier already in use");
        }

        Err(ClientRegistrationError::ClientIdGenerationFailed(format!(
            "Unable to generate a unique client identifier after {} attempts.",
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::types::{Client, Parameters};
    use crate::storage::inmemory::MemoryRegistrationStorage;
    use std::sync::Mutex;

    /// Replays a fixed sequence of identifiers
    struct SequenceClientIdGenerator(Mutex<Vec<String>>);

    #[async_trait]
    impl ClientIdGenerator for SequenceClientIdGenerator {
        async fn create_client_id(&self) -> Result<String, ClientRegistrationError> {
            let mut ids = self.0.lock().unwrap();
            if ids.is_empty() {
                return Err(ClientRegistrationError::ClientIdGenerationFailed(
                    "exhausted".to_string(),
                ));
            }
            Ok(ids.remove(0))
        }
    }

    #[tokio::test]
    async fn test_uuid_generator_is_fresh() {
        let generator = UuidClientIdGenerator;
        let first = generator.create_client_id().await.unwrap();
        let second = generator.create_client_id().await.unwrap();

        assert!(!first.is_empty());
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_store_checked_generator_skips_taken_ids() {
        let storage = Arc::new(MemoryRegistrationStorage::new());
        storage
            .save(&Client {
                client_id: "taken".to_string(),
                user_account_id: None,
                parameters: Parameters::new(),
            })
            .await
            .unwrap();

        let inner = Arc::new(SequenceClientIdGenerator(Mutex::new(vec![
            "taken".to_string(),
            "free".to_string(),
        ])));
        let generator = StoreCheckedClientIdGenerator::new(inner, storage);

        assert_eq!(generator.create_client_id().await.unwrap(), "free");
    }

    #[tokio::test]
    async fn test_store_checked_generator_gives_up() {
        let storage = Arc::new(MemoryRegistrationStorage::new());
        storage
            .save(&Client {
                client_id: "taken".to_string(),
                user_account_id: None,
                parameters: Parameters::new(),
            })
            .await
            .unwrap();

        let inner = Arc::new(SequenceClientIdGenerator(Mutex::new(vec![
            "taken".to_string(),
            "taken".to_string(),
        ])));
        let generator = StoreCheckedClientIdGenerator::new(inner, storage).with_max_attempts(2);

        let result = generator.create_client_id().await;
        assert!(matches!(
            result,
            Err(ClientRegistrationError::ClientIdGenerationFailed(_))
        ));
    }
}
