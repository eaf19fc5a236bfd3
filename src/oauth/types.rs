//! OAuth 2.1 dynamic registration types and data structures.
//!
//! Defines initial access tokens, registered clients, the authorization context
//! handed from the token gate to registration, and the shared error envelope.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Client metadata as submitted by the caller or returned by the rule chain
pub type Parameters = Map<String, Value>;

/// Parameter key carrying the client identifier in responses
pub const CLIENT_ID: &str = "client_id";

/// Parameter key carrying the owner of a client in responses
pub const USER_ACCOUNT_ID: &str = "user_account_id";

/// OAuth 2.1 Grant Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
}

/// OAuth 2.1 Response Types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

/// OAuth 2.1 Client Authentication Methods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    ClientSecretBasic,
    ClientSecretPost,
    None,
    PrivateKeyJwt,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::RefreshToken => "refresh_token",
        }
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(GrantType::AuthorizationCode),
            "client_credentials" => Ok(GrantType::ClientCredentials),
            "refresh_token" => Ok(GrantType::RefreshToken),
            _ => Err(format!("The grant type \"{}\" is not supported.", s)),
        }
    }
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Code => "code",
        }
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(ResponseType::Code),
            _ => Err(format!("The response type \"{}\" is not supported.", s)),
        }
    }
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
            ClientAuthMethod::ClientSecretPost => "client_secret_post",
            ClientAuthMethod::None => "none",
            ClientAuthMethod::PrivateKeyJwt => "private_key_jwt",
        }
    }

    /// Whether clients using this method are issued a shared secret
    pub fn requires_client_secret(&self) -> bool {
        matches!(
            self,
            ClientAuthMethod::ClientSecretBasic | ClientAuthMethod::ClientSecretPost
        )
    }
}

impl FromStr for ClientAuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client_secret_basic" => Ok(ClientAuthMethod::ClientSecretBasic),
            "client_secret_post" => Ok(ClientAuthMethod::ClientSecretPost),
            "none" => Ok(ClientAuthMethod::None),
            "private_key_jwt" => Ok(ClientAuthMethod::PrivateKeyJwt),
            _ => Err(format!(
                "The token endpoint authentication method \"{}\" is not supported.",
                s
            )),
        }
    }
}

impl fmt::Display for ClientAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-provisioned credential allowing a party to register clients
#[derive(Debug, Clone)]
pub struct InitialAccessToken {
    /// Token identifier, equal to the bearer credential value
    pub id: String,
    /// Account that provisioned the token, absent for anonymous grants
    pub user_account_id: Option<String>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Revocation flag, never reset once set
    pub revoked: bool,
}

impl InitialAccessToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// A token whose expiry equals `now` is already expired.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outcome of the initial access token gate, threaded into registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub user_account_id: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user_account(user_account_id: impl Into<String>) -> Self {
        Self {
            user_account_id: Some(user_account_id.into()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_account_id.is_none()
    }
}

/// Registered OAuth client
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    /// Unique client identifier
    pub client_id: String,
    /// Owner copied from the initial access token
    pub user_account_id: Option<String>,
    /// Validated client metadata
    pub parameters: Parameters,
}

impl Client {
    /// All client members flattened into one JSON object.
    ///
    /// `client_id` and `user_account_id` always reflect the client itself,
    /// even if the parameters carry members with the same names.
    pub fn all(&self) -> Parameters {
        let mut all = self.parameters.clone();
        all.insert(
            CLIENT_ID.to_string(),
            Value::String(self.client_id.clone()),
        );
        match &self.user_account_id {
            Some(user_account_id) => {
                all.insert(
                    USER_ACCOUNT_ID.to_string(),
                    Value::String(user_account_id.clone()),
                );
            }
            None => {
                all.remove(USER_ACCOUNT_ID);
            }
        }
        all
    }
}

/// OAuth Error Response
///
/// Shared envelope for every protocol error returned by the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// HTTP status the error is reported with
    #[serde(skip, default = "default_error_status")]
    pub status: StatusCode,
    /// Error code
    pub error: String,
    /// Error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Error URI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
    /// Additional members
    #[serde(flatten)]
    pub data: Parameters,
}

fn default_error_status() -> StatusCode {
    StatusCode::BAD_REQUEST
}

/// `invalid_request` error code
pub const ERROR_INVALID_REQUEST: &str = "invalid_request";

/// `server_error` error code
pub const ERROR_SERVER_ERROR: &str = "server_error";

impl OAuthErrorResponse {
    pub fn new(status: StatusCode, error: &str, error_description: impl Into<String>) -> Self {
        Self {
            status,
            error: error.to_string(),
            error_description: Some(error_description.into()),
            error_uri: None,
            data: Parameters::new(),
        }
    }

    pub fn invalid_request(status: StatusCode, error_description: impl Into<String>) -> Self {
        Self::new(status, ERROR_INVALID_REQUEST, error_description)
    }
}

/// Generate a secure random token
pub fn generate_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a client ID
pub fn generate_client_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validate scope string
pub fn validate_scope(scope: &str) -> bool {
    // Basic scope validation - contains only valid characters
    scope.split_whitespace().all(|s| {
        s.chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ':')
    })
}

/// Parse scope string into a set
pub fn parse_scope(scope: &str) -> HashSet<String> {
    scope.split_whitespace().map(|s| s.to_string()).collect()
}
