//! OAuth 2.0 Dynamic Client Registration implementation (RFC 7591).
//!
//! Handles client registration requests, validation, and persistence.

use crate::errors::ClientRegistrationError;
use crate::oauth::clients::id_generator::ClientIdGenerator;
use crate::oauth::clients::rules::RuleManager;
use crate::oauth::types::*;
use crate::storage::traits::ClientStore;
use http::{HeaderMap, header::CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;

/// Client Registration Service
pub struct ClientRegistrationService {
    client_id_generator: Arc<dyn ClientIdGenerator>,
    rule_manager: RuleManager,
    client_store: Arc<dyn ClientStore>,
}

impl ClientRegistrationService {
    /// Create a new client registration service
    pub fn new(
        client_id_generator: Arc<dyn ClientIdGenerator>,
        rule_manager: RuleManager,
        client_store: Arc<dyn ClientStore>,
    ) -> Self {
        Self {
            client_id_generator,
            rule_manager,
            client_store,
        }
    }

    /// Register a new OAuth client
    ///
    /// A client identifier is consumed even when the parameters are later
    /// rejected; nothing is persisted unless every step succeeds.
    pub async fn register_client(
        &self,
        auth_context: &AuthContext,
        parameters: Parameters,
    ) -> Result<Client, ClientRegistrationError> {
        let client_id = self.client_id_generator.create_client_id().await?;

        let validated_parameters = self.rule_manager.handle(&client_id, &parameters)?;

        let client = self.client_store.create(
            &client_id,
            validated_parameters,
            auth_context.user_account_id.clone(),
        )?;

        self.client_store.save(&client).await.inspect_err(|e| {
            tracing::error!(error = ?e, client_id = %client.client_id, "failed to store client");
        })?;

        tracing::info!(
            client_id = %client.client_id,
            user_account_id = ?client.user_account_id,
            "client registered"
        );

        Ok(client)
    }
}

/// Decode a registration request body into client parameters
///
/// The body must be a JSON object sent as `application/json`.
pub fn parse_registration_body(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Parameters, ClientRegistrationError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"));
    if !is_json {
        return Err(ClientRegistrationError::MalformedBody(
            "Unsupported request body content type.".to_string(),
        ));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(parameters)) => Ok(parameters),
        Ok(_) => Err(ClientRegistrationError::MalformedBody(
            "The request body must be a JSON object.".to_string(),
        )),
        Err(e) => Err(ClientRegistrationError::MalformedBody(format!(
            "Invalid JSON request body: {}",
            e
        ))),
    }
}
