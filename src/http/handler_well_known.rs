//! Handles OAuth 2.0 well-known discovery - authorization server metadata

use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use super::context::AppState;
use crate::oauth::types::{ClientAuthMethod, GrantType, ResponseType};

/// OAuth 2.0 Authorization Server Metadata handler
/// GET /.well-known/oauth-authorization-server
///
/// Returns metadata about the registration endpoint as specified by RFC 8414.
pub async fn oauth_authorization_server_handler(State(state): State<AppState>) -> Json<Value> {
    let grant_types = [
        GrantType::AuthorizationCode,
        GrantType::ClientCredentials,
        GrantType::RefreshToken,
    ]
    .iter()
    .map(GrantType::as_str)
    .collect::<Vec<_>>();
    let auth_methods = [
        ClientAuthMethod::ClientSecretBasic,
        ClientAuthMethod::ClientSecretPost,
        ClientAuthMethod::PrivateKeyJwt,
        ClientAuthMethod::None,
    ]
    .iter()
    .map(ClientAuthMethod::as_str)
    .collect::<Vec<_>>();

    let metadata = json!({
        "issuer": state.config.external_base,
        "registration_endpoint": format!("{}/oauth/clients/register", state.config.external_base),
        "scopes_supported": state.config.oauth_supported_scopes.as_ref(),
        "response_types_supported": [ResponseType::Code.as_str()],
        "grant_types_supported": grant_types,
        "token_endpoint_auth_methods_supported": auth_methods,
        "initial_access_token_required": state.initial_access_token_gate.is_required(),
    });

    Json(metadata)
}
