//! Standardized error types following the `error-dcr-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-dcr-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-dcr-config-2 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-dcr-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when boolean string cannot be parsed
    #[error(
        "error-dcr-config-4 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when a numeric limit cannot be parsed
    #[error("error-dcr-config-5 Failed to parse limit '{0}': {1}")]
    LimitParsingFailed(String, std::num::ParseIntError),

    /// Error when the default token endpoint auth method is unknown
    #[error("error-dcr-config-6 Unsupported token endpoint auth method: {0}")]
    UnsupportedAuthMethod(String),
}

/// Rejections produced by the initial access token gate
#[derive(Debug, Error)]
pub enum InitialAccessTokenError {
    /// A token is required by policy but none was presented
    #[error("error-dcr-iat-1 Initial Access Token is missing or invalid.")]
    MissingToken,

    /// The token is unknown or has been revoked
    #[error("error-dcr-iat-2 Initial Access Token is missing or invalid.")]
    InvalidToken,

    /// The token exists but its expiry has passed
    #[error("error-dcr-iat-3 Initial Access Token expired.")]
    ExpiredToken,

    /// The token store could not be queried
    #[error("error-dcr-iat-4 Initial Access Token lookup failed: {0}")]
    LookupFailed(StorageError),
}

impl InitialAccessTokenError {
    /// Message suitable for the `error_description` member of an OAuth error.
    pub fn description(&self) -> String {
        match self {
            Self::MissingToken | Self::InvalidToken => {
                "Initial Access Token is missing or invalid.".to_string()
            }
            Self::ExpiredToken => "Initial Access Token expired.".to_string(),
            Self::LookupFailed(_) => "Unable to verify the Initial Access Token.".to_string(),
        }
    }
}

/// A validation rule rejected the registration parameters
#[derive(Debug, Error)]
#[error("error-dcr-rule-1 {0}")]
pub struct RuleError(pub String);

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Client registration errors
#[derive(Debug, Error)]
pub enum ClientRegistrationError {
    /// The registration endpoint was called with a method other than POST
    #[error("error-dcr-client-1 Unsupported method.")]
    UnsupportedMethod,

    /// The request body is not a JSON object
    #[error("error-dcr-client-2 Malformed request body: {0}")]
    MalformedBody(String),

    /// No client identifier could be produced
    #[error("error-dcr-client-3 Client identifier generation failed: {0}")]
    ClientIdGenerationFailed(String),

    /// A validation rule rejected the parameters
    #[error("error-dcr-client-4 Invalid client metadata: {0}")]
    InvalidClientMetadata(#[from] RuleError),

    /// The client could not be materialized or persisted
    #[error("error-dcr-client-5 Failed to store client: {0}")]
    StorageFailed(#[from] StorageError),
}

impl ClientRegistrationError {
    /// The original failure message, without the log prefix.
    pub fn description(&self) -> String {
        match self {
            Self::UnsupportedMethod => "Unsupported method.".to_string(),
            Self::MalformedBody(message) | Self::ClientIdGenerationFailed(message) => {
                message.clone()
            }
            Self::InvalidClientMetadata(rule_error) => rule_error.message().to_string(),
            Self::StorageFailed(storage_error) => storage_error.description(),
        }
    }
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-dcr-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when query execution fails
    #[error("error-dcr-storage-2 Query execution failed: {0}")]
    QueryFailed(String),

    /// Error when data serialization fails
    #[error("error-dcr-storage-3 Data serialization failed: {0}")]
    SerializationFailed(String),

    /// Error when database operation fails
    #[error("error-dcr-storage-4 Database error: {0}")]
    DatabaseError(String),

    /// Error when data validation fails
    #[error("error-dcr-storage-5 Invalid data: {0}")]
    InvalidData(String),

    /// Error when a record with the same key already exists
    #[error("error-dcr-storage-6 Already exists: {0}")]
    AlreadyExists(String),
}

impl StorageError {
    pub fn description(&self) -> String {
        match self {
            Self::ConnectionFailed(message)
            | Self::QueryFailed(message)
            | Self::SerializationFailed(message)
            | Self::DatabaseError(message)
            | Self::InvalidData(message) => message.clone(),
            Self::AlreadyExists(key) => {
                format!("A client with the identifier \"{}\" already exists.", key)
            }
        }
    }
}
