//! Storage trait definitions for dynamic client registration.
//!
//! Defines async storage interfaces for registered clients and
//! initial access tokens that can be implemented by various backend providers.

use crate::errors::StorageError;
use crate::oauth::types::*;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for materializing and persisting registered clients
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Materialize a client from validated parameters without persisting it
    fn create(
        &self,
        client_id: &str,
        parameters: Parameters,
        user_account_id: Option<String>,
    ) -> Result<Client> {
        if client_id.is_empty() {
            return Err(StorageError::InvalidData(
                "Client identifier must not be empty.".to_string(),
            ));
        }

        Ok(Client {
            client_id: client_id.to_string(),
            user_account_id,
            parameters,
        })
    }

    /// Persist a new client.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the identifier is taken.
    async fn save(&self, client: &Client) -> Result<()>;

    /// Retrieve a client by ID
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>>;
}

/// Trait for resolving pre-provisioned initial access tokens
#[async_trait]
pub trait InitialAccessTokenStore: Send + Sync {
    /// Retrieve a token by its identifier, revoked and expired tokens included
    async fn find_initial_access_token(&self, id: &str) -> Result<Option<InitialAccessToken>>;
}

/// Combined storage used by the registration server
pub trait RegistrationStorage: ClientStore + InitialAccessTokenStore {}

impl<T> RegistrationStorage for T where T: ClientStore + InitialAccessTokenStore {}
