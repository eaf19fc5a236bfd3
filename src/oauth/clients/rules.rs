//! Client metadata validation rules.
//!
//! A [`RuleManager`] runs an ordered list of [`Rule`]s over the submitted
//! parameters. Each rule receives the parameters validated so far and returns
//! the next version of them; the first failing rule aborts the chain.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use url::Url;

use crate::errors::RuleError;
use crate::oauth::types::*;

/// One step of client metadata validation
pub trait Rule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Validate and normalize the parameters for `client_id`.
    ///
    /// `command_parameters` holds the parameters as submitted, `validated_parameters`
    /// the output of the previous rules.
    fn handle(
        &self,
        client_id: &str,
        command_parameters: &Parameters,
        validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError>;
}

/// Ordered rule chain
#[derive(Clone, Default)]
pub struct RuleManager {
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the end of the chain
    pub fn add(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// The default chain of built-in rules
    pub fn with_default_rules(config: &RulesConfig) -> Self {
        Self::new()
            .add(RequiredParametersRule::new(config.required_parameters.clone()))
            .add(CommonParametersRule)
            .add(RedirectUriRule::new(config.max_redirect_uris))
            .add(GrantTypeFlowRule)
            .add(ScopeRule::new(config.supported_scopes.clone()))
            .add(TokenEndpointAuthMethodRule::new(
                config.default_auth_method.clone(),
            ))
            .add(ClientIdIssuedAtRule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order, stopping at the first failure
    pub fn handle(&self, client_id: &str, parameters: &Parameters) -> Result<Parameters, RuleError> {
        let mut validated_parameters = parameters.clone();
        // Identity members are owned by the server.
        validated_parameters.remove(CLIENT_ID);
        validated_parameters.remove(USER_ACCOUNT_ID);

        for rule in &self.rules {
            validated_parameters = rule
                .handle(client_id, parameters, validated_parameters)
                .inspect_err(|e| {
                    tracing::debug!(rule = rule.name(), client_id, error = %e, "client metadata rejected");
                })?;
        }

        Ok(validated_parameters)
    }
}

/// Settings for the built-in rule chain
#[derive(Clone, Debug)]
pub struct RulesConfig {
    /// Parameters that must be present and non-null
    pub required_parameters: Vec<String>,
    /// Maximum number of redirect URIs per client
    pub max_redirect_uris: usize,
    /// Scopes clients may register for, unrestricted when `None`
    pub supported_scopes: Option<Vec<String>>,
    /// Authentication method applied when none is requested
    pub default_auth_method: ClientAuthMethod,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            required_parameters: Vec::new(),
            max_redirect_uris: 10,
            supported_scopes: None,
            default_auth_method: ClientAuthMethod::ClientSecretBasic,
        }
    }
}

fn string_array(parameters: &Parameters, key: &str) -> Result<Option<Vec<String>>, RuleError> {
    match parameters.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    RuleError::new(format!("The parameter \"{}\" must be a list of strings.", key))
                })
            })
            .collect::<Result<Vec<String>, RuleError>>()
            .map(Some),
        Some(_) => Err(RuleError::new(format!(
            "The parameter \"{}\" must be a list of strings.",
            key
        ))),
    }
}

/// Rejects registrations missing any of a fixed set of parameters
pub struct RequiredParametersRule {
    parameters: Vec<String>,
}

impl RequiredParametersRule {
    pub fn new(parameters: Vec<String>) -> Self {
        Self { parameters }
    }
}

impl Rule for RequiredParametersRule {
    fn name(&self) -> &'static str {
        "required_parameters"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        for parameter in &self.parameters {
            match validated_parameters.get(parameter) {
                None | Some(Value::Null) => {
                    return Err(RuleError::new(format!(
                        "The parameter \"{}\" is mandatory.",
                        parameter
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(validated_parameters)
    }
}

/// Human-readable metadata: `client_name` and informational URLs
pub struct CommonParametersRule;

const COMMON_URI_PARAMETERS: [&str; 4] = ["client_uri", "logo_uri", "tos_uri", "policy_uri"];

impl Rule for CommonParametersRule {
    fn name(&self) -> &'static str {
        "common_parameters"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        if let Some(client_name) = validated_parameters.get("client_name") {
            if !client_name.is_string() {
                return Err(RuleError::new(
                    "The parameter \"client_name\" must be a string.",
                ));
            }
        }

        for parameter in COMMON_URI_PARAMETERS {
            let Some(value) = validated_parameters.get(parameter) else {
                continue;
            };
            let valid = value
                .as_str()
                .and_then(|uri| Url::parse(uri).ok())
                .is_some_and(|uri| matches!(uri.scheme(), "http" | "https"));
            if !valid {
                return Err(RuleError::new(format!(
                    "The parameter \"{}\" must be a valid URL.",
                    parameter
                )));
            }
        }

        Ok(validated_parameters)
    }
}

/// Redirect URI count and shape
pub struct RedirectUriRule {
    max_redirect_uris: usize,
}

impl RedirectUriRule {
    pub fn new(max_redirect_uris: usize) -> Self {
        Self { max_redirect_uris }
    }

    fn validate_redirect_uri(uri: &str) -> Result<(), RuleError> {
        let parsed = Url::parse(uri)
            .map_err(|e| RuleError::new(format!("Invalid redirect URI format: {}", e)))?;

        // Must use HTTPS (except for localhost for development)
        match parsed.scheme() {
            "https" => {}
            "http" => match parsed.host_str() {
                Some(host) if host == "localhost" || host == "127.0.0.1" || host == "[::1]" => {}
                Some(_) => {
                    return Err(RuleError::new(
                        "HTTP redirect URIs only allowed for localhost",
                    ));
                }
                None => return Err(RuleError::new("Invalid redirect URI host")),
            },
            _ => return Err(RuleError::new("Redirect URI must use HTTP or HTTPS")),
        }

        if parsed.fragment().is_some() {
            return Err(RuleError::new("Redirect URI must not contain fragment"));
        }

        Ok(())
    }
}

impl Rule for RedirectUriRule {
    fn name(&self) -> &'static str {
        "redirect_uris"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        let Some(redirect_uris) = string_array(&validated_parameters, "redirect_uris")? else {
            return Ok(validated_parameters);
        };

        if redirect_uris.len() > self.max_redirect_uris {
            return Err(RuleError::new(format!(
                "Too many redirect URIs: {} (max: {})",
                redirect_uris.len(),
                self.max_redirect_uris
            )));
        }

        for uri in &redirect_uris {
            Self::validate_redirect_uri(uri)?;
        }

        Ok(validated_parameters)
    }
}

/// Grant and response types, with defaults when absent
pub struct GrantTypeFlowRule;

impl Rule for GrantTypeFlowRule {
    fn name(&self) -> &'static str {
        "grant_types"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        mut validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        let grant_types = match string_array(&validated_parameters, "grant_types")? {
            Some(values) => values
                .iter()
                .map(|value| value.parse::<GrantType>())
                .collect::<Result<Vec<GrantType>, String>>()
                .map_err(RuleError)?,
            None => vec![GrantType::AuthorizationCode],
        };
        let response_types = match string_array(&validated_parameters, "response_types")? {
            Some(values) => values
                .iter()
                .map(|value| value.parse::<ResponseType>())
                .collect::<Result<Vec<ResponseType>, String>>()
                .map_err(RuleError)?,
            None => vec![ResponseType::Code],
        };

        if grant_types.contains(&GrantType::AuthorizationCode)
            && !response_types.contains(&ResponseType::Code)
        {
            return Err(RuleError::new(
                "authorization_code grant requires code response type",
            ));
        }

        let grant_types: Vec<&str> = grant_types.iter().map(GrantType::as_str).collect();
        let response_types: Vec<&str> = response_types.iter().map(ResponseType::as_str).collect();
        validated_parameters.insert("grant_types".to_string(), json!(grant_types));
        validated_parameters.insert("response_types".to_string(), json!(response_types));

        Ok(validated_parameters)
    }
}

/// Scope syntax and, optionally, membership in the server's supported scopes
pub struct ScopeRule {
    supported_scopes: Option<HashSet<String>>,
}

impl ScopeRule {
    pub fn new(supported_scopes: Option<Vec<String>>) -> Self {
        Self {
            supported_scopes: supported_scopes.map(|scopes| scopes.into_iter().collect()),
        }
    }
}

impl Rule for ScopeRule {
    fn name(&self) -> &'static str {
        "scope"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        let scope = match validated_parameters.get("scope") {
            None | Some(Value::Null) => return Ok(validated_parameters),
            Some(Value::String(scope)) => scope,
            Some(_) => {
                return Err(RuleError::new("The parameter \"scope\" must be a string."));
            }
        };

        if !validate_scope(scope) {
            return Err(RuleError::new(format!("Invalid scope: {}", scope)));
        }

        if let Some(supported_scopes) = &self.supported_scopes {
            let requested_scopes = parse_scope(scope);
            if !requested_scopes.is_subset(supported_scopes) {
                let mut supported: Vec<&str> =
                    supported_scopes.iter().map(String::as_str).collect();
                supported.sort_unstable();
                return Err(RuleError::new(format!(
                    "Requested scope '{}' contains unsupported scopes. Supported scopes: {}",
                    scope,
                    supported.join(" ")
                )));
            }
        }

        Ok(validated_parameters)
    }
}

/// Token endpoint authentication method and client secret issuance
pub struct TokenEndpointAuthMethodRule {
    default_auth_method: ClientAuthMethod,
}

impl TokenEndpointAuthMethodRule {
    pub fn new(default_auth_method: ClientAuthMethod) -> Self {
        Self {
            default_auth_method,
        }
    }
}

impl Rule for TokenEndpointAuthMethodRule {
    fn name(&self) -> &'static str {
        "token_endpoint_auth_method"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        mut validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        let auth_method = match validated_parameters.get("token_endpoint_auth_method") {
            None | Some(Value::Null) => self.default_auth_method.clone(),
            Some(Value::String(value)) => value.parse::<ClientAuthMethod>().map_err(RuleError)?,
            Some(_) => {
                return Err(RuleError::new(
                    "The parameter \"token_endpoint_auth_method\" must be a string.",
                ));
            }
        };

        if auth_method == ClientAuthMethod::PrivateKeyJwt
            && !validated_parameters.contains_key("jwks")
            && !validated_parameters.contains_key("jwks_uri")
        {
            return Err(RuleError::new(
                "The parameter \"jwks\" or \"jwks_uri\" is mandatory when using the private_key_jwt authentication method.",
            ));
        }

        // Secrets are always issued by the server.
        validated_parameters.remove("client_secret");
        validated_parameters.remove("client_secret_expires_at");
        if auth_method.requires_client_secret() {
            validated_parameters.insert("client_secret".to_string(), json!(generate_token()));
            validated_parameters.insert("client_secret_expires_at".to_string(), json!(0));
        }

        validated_parameters.insert(
            "token_endpoint_auth_method".to_string(),
            json!(auth_method.as_str()),
        );

        Ok(validated_parameters)
    }
}

/// Records when the identifier was issued
pub struct ClientIdIssuedAtRule;

impl Rule for ClientIdIssuedAtRule {
    fn name(&self) -> &'static str {
        "client_id_issued_at"
    }

    fn handle(
        &self,
        _client_id: &str,
        _command_parameters: &Parameters,
        mut validated_parameters: Parameters,
    ) -> Result<Parameters, RuleError> {
        validated_parameters.insert(
            "client_id_issued_at".to_string(),
            json!(Utc::now().timestamp()),
        );
        Ok(validated_parameters)
    }
}
