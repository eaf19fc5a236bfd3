//! Environment-based configuration types for the registration server.

use anyhow::Result;

use crate::errors::ConfigError;
use crate::oauth::clients::RulesConfig;
use crate::oauth::types::ClientAuthMethod;

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Whether registration requires an initial access token
#[derive(Clone)]
pub struct InitialAccessTokenRequired(bool);

/// OAuth supported scopes configuration
#[derive(Clone)]
pub struct OAuthSupportedScopes(Vec<String>);

/// Parameters every registration must carry
#[derive(Clone, Default)]
pub struct ClientRequiredParameters(Vec<String>);

/// Maximum number of redirect URIs per client
#[derive(Clone)]
pub struct ClientMaxRedirectUris(usize);

/// Token endpoint auth method applied when a client does not request one
#[derive(Clone)]
pub struct ClientDefaultAuthMethod(ClientAuthMethod);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub external_base: String,
    pub storage_backend: String,
    pub database_url: Option<String>,
    pub initial_access_token_required: InitialAccessTokenRequired,
    pub oauth_supported_scopes: OAuthSupportedScopes,
    pub client_required_parameters: ClientRequiredParameters,
    pub client_max_redirect_uris: ClientMaxRedirectUris,
    pub client_default_auth_method: ClientDefaultAuthMethod,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let external_base = require_env("EXTERNAL_BASE")?;
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let database_url = optional_env("DATABASE_URL");
        let initial_access_token_required: InitialAccessTokenRequired =
            default_env("INITIAL_ACCESS_TOKEN_REQUIRED", "false").try_into()?;
        let oauth_supported_scopes: OAuthSupportedScopes =
            optional_env("OAUTH_SUPPORTED_SCOPES").try_into()?;
        let client_required_parameters: ClientRequiredParameters =
            optional_env("CLIENT_REQUIRED_PARAMETERS").try_into()?;
        let client_max_redirect_uris: ClientMaxRedirectUris =
            default_env("CLIENT_MAX_REDIRECT_URIS", "10").try_into()?;
        let client_default_auth_method: ClientDefaultAuthMethod =
            default_env("CLIENT_DEFAULT_AUTH_METHOD", "client_secret_basic").try_into()?;

        Ok(Self {
            version: version()?,
            http_port,
            external_base,
            storage_backend,
            database_url,
            initial_access_token_required,
            oauth_supported_scopes,
            client_required_parameters,
            client_max_redirect_uris,
            client_default_auth_method,
        })
    }

    /// Settings for the built-in registration rule chain
    pub fn rules_config(&self) -> RulesConfig {
        RulesConfig {
            required_parameters: self.client_required_parameters.as_ref().clone(),
            max_redirect_uris: *self.client_max_redirect_uris.as_ref(),
            supported_scopes: Some(self.oauth_supported_scopes.as_ref().clone()),
            default_auth_method: self.client_default_auth_method.as_ref().clone(),
        }
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

fn parse_bool(value: String) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::BoolParsingFailed(value)),
    }
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl TryFrom<String> for InitialAccessTokenRequired {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(parse_bool(value)?))
    }
}

impl AsRef<bool> for InitialAccessTokenRequired {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}

impl TryFrom<Option<String>> for OAuthSupportedScopes {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        let value = value.unwrap_or_default();
        let value = if value.trim().is_empty() {
            "openid profile email".to_string()
        } else {
            value
        };

        let mut scopes = Vec::new();
        for scope in value.split_whitespace() {
            if !scopes.iter().any(|existing| existing == scope) {
                scopes.push(scope.to_string());
            }
        }
        Ok(Self(scopes))
    }
}

impl TryFrom<String> for OAuthSupportedScopes {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<Vec<String>> for OAuthSupportedScopes {
    fn as_ref(&self) -> &Vec<String> {
        &self.0
    }
}

impl TryFrom<Option<String>> for ClientRequiredParameters {
    type Error = anyhow::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        let value = value.unwrap_or_default();
        if value.is_empty() {
            return Ok(Self(Vec::new()));
        }

        let parameters = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        Ok(Self(parameters))
    }
}

impl TryFrom<String> for ClientRequiredParameters {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(Some(value))
    }
}

impl AsRef<Vec<String>> for ClientRequiredParameters {
    fn as_ref(&self) -> &Vec<String> {
        &self.0
    }
}

impl TryFrom<String> for ClientMaxRedirectUris {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .trim()
            .parse::<usize>()
            .map(Self)
            .map_err(|err| ConfigError::LimitParsingFailed(value, err).into())
    }
}

impl AsRef<usize> for ClientMaxRedirectUris {
    fn as_ref(&self) -> &usize {
        &self.0
    }
}

impl TryFrom<String> for ClientDefaultAuthMethod {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<ClientAuthMethod>()
            .map(Self)
            .map_err(|_| ConfigError::UnsupportedAuthMethod(value).into())
    }
}

impl AsRef<ClientAuthMethod> for ClientDefaultAuthMethod {
    fn as_ref(&self) -> &ClientAuthMethod {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_access_token_required_parsing() {
        for value in ["true", "1", "YES", "on"] {
            let parsed = InitialAccessTokenRequired::try_from(value.to_string()).unwrap();
            assert!(*parsed.as_ref(), "{} should enable the requirement", value);
        }
        for value in ["false", "0", "no", "OFF"] {
            let parsed = InitialAccessTokenRequired::try_from(value.to_string()).unwrap();
            assert!(!*parsed.as_ref(), "{} should disable the requirement", value);
        }

        let invalid = InitialAccessTokenRequired::try_from("maybe".to_string());
        assert!(invalid.is_err());
        assert!(invalid.err().unwrap().to_string().contains("error-dcr-config-4"));
    }

    #[test]
    fn test_supported_scopes_parsing() {
        let defaults = OAuthSupportedScopes::try_from(None).unwrap();
        assert_eq!(defaults.as_ref(), &vec!["openid", "profile", "email"]);

        let scopes = OAuthSupportedScopes::try_from("read  write read".to_string()).unwrap();
        assert_eq!(scopes.as_ref(), &vec!["read", "write"]);
    }

    #[test]
    fn test_required_parameters_parsing() {
        let parameters =
            ClientRequiredParameters::try_from("redirect_uris, client_name,,".to_string()).unwrap();
        assert_eq!(parameters.as_ref(), &vec!["redirect_uris", "client_name"]);

        assert!(ClientRequiredParameters::try_from(None).unwrap().as_ref().is_empty());
    }

    #[test]
    fn test_limits_and_auth_method_parsing() {
        assert_eq!(
            *ClientMaxRedirectUris::try_from("3".to_string()).unwrap().as_ref(),
            3
        );
        assert!(ClientMaxRedirectUris::try_from("many".to_string()).is_err());

        assert_eq!(
            ClientDefaultAuthMethod::try_from("none".to_string())
                .unwrap()
                .as_ref(),
            &ClientAuthMethod::None
        );
        assert!(ClientDefaultAuthMethod::try_from("client_secret_jwt".to_string()).is_err());

        assert_eq!(*HttpPort::try_from(String::new()).unwrap().as_ref(), 8080);
        assert!(HttpPort::try_from("eighty".to_string()).is_err());
    }
}
