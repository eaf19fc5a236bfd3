//! Initial access token gate for the registration endpoint.
//!
//! Resolves the bearer credential presented with a registration request into
//! an [`AuthContext`], or rejects the request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::{HeaderMap, header::AUTHORIZATION};

use crate::errors::InitialAccessTokenError;
use crate::oauth::types::AuthContext;
use crate::storage::traits::InitialAccessTokenStore;

/// Pulls a credential out of request headers
pub trait TokenExtractor: Send + Sync {
    /// Returns `None` when no usable credential is present.
    fn find(&self, headers: &HeaderMap) -> Option<String>;
}

/// Extracts `Authorization: Bearer <token>` credentials
#[derive(Clone, Debug, Default)]
pub struct BearerTokenExtractor;

impl TokenExtractor for BearerTokenExtractor {
    fn find(&self, headers: &HeaderMap) -> Option<String> {
        let auth_header = headers.get(AUTHORIZATION)?.to_str().ok()?;

        // Split only on first space; the scheme is case-insensitive
        let (scheme, token) = auth_header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

/// Decides whether a registration request may proceed
pub struct InitialAccessTokenGate {
    token_extractor: Arc<dyn TokenExtractor>,
    initial_access_token_store: Arc<dyn InitialAccessTokenStore>,
    /// Whether anonymous registration is refused
    required: bool,
}

impl InitialAccessTokenGate {
    /// Create a gate reading bearer tokens from the `Authorization` header
    pub fn new(
        initial_access_token_store: Arc<dyn InitialAccessTokenStore>,
        required: bool,
    ) -> Self {
        Self {
            token_extractor: Arc::new(BearerTokenExtractor),
            initial_access_token_store,
            required,
        }
    }

    /// Replace the credential extraction strategy
    pub fn with_token_extractor(mut self, token_extractor: Arc<dyn TokenExtractor>) -> Self {
        self.token_extractor = token_extractor;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Authorize a registration request against the current time
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthContext, InitialAccessTokenError> {
        self.authorize_at(headers, Utc::now()).await
    }

    /// Authorize a registration request as of `now`
    ///
    /// 1. No token: anonymous context unless the policy requires one
    /// 2. Unknown or revoked token: invalid
    /// 3. Token whose expiry is at or before `now`: expired
    /// 4. Otherwise the token owner becomes the context
    pub async fn authorize_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, InitialAccessTokenError> {
        let Some(token) = self.token_extractor.find(headers) else {
            if self.required {
                tracing::debug!("initial access token required but not presented");
                return Err(InitialAccessTokenError::MissingToken);
            }
            return Ok(AuthContext::anonymous());
        };

        let initial_access_token = self
            .initial_access_token_store
            .find_initial_access_token(&token)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "initial access token lookup failed");
                InitialAccessTokenError::LookupFailed(e)
            })?;

        // Revocation is checked before expiry.
        let initial_access_token = match initial_access_token {
            Some(value) if !value.is_revoked() => value,
            Some(_) => {
                tracing::debug!("initial access token revoked");
                return Err(InitialAccessTokenError::InvalidToken);
            }
            None => {
                tracing::debug!("initial access token not found");
                return Err(InitialAccessTokenError::InvalidToken);
            }
        };

        if initial_access_token.has_expired(now) {
            tracing::debug!(expires_at = %initial_access_token.expires_at, "initial access token expired");
            return Err(InitialAccessTokenError::ExpiredToken);
        }

        Ok(AuthContext {
            user_account_id: initial_access_token.user_account_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use crate::oauth::types::InitialAccessToken;
    use crate::storage::inmemory::MemoryRegistrationStorage;
    use async_trait::async_trait;
    use chrono::Duration;
    use http::HeaderValue;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    fn storage_with(tokens: Vec<InitialAccessToken>) -> Arc<MemoryRegistrationStorage> {
        let storage = Arc::new(MemoryRegistrationStorage::new());
        for token in tokens {
            storage.insert_initial_access_token(token).unwrap();
        }
        storage
    }

    fn token(id: &str, expires_at: DateTime<Utc>, revoked: bool) -> InitialAccessToken {
        InitialAccessToken {
            id: id.to_string(),
            user_account_id: Some("u1".to_string()),
            expires_at,
            revoked,
        }
    }

    struct FailingTokenStore;

    #[async_trait]
    impl InitialAccessTokenStore for FailingTokenStore {
        async fn find_initial_access_token(
            &self,
            _id: &str,
        ) -> crate::storage::traits::Result<Option<InitialAccessToken>> {
            Err(StorageError::ConnectionFailed("down".to_string()))
        }
    }

    #[test]
    fn test_bearer_token_extractor() {
        let extractor = BearerTokenExtractor;

        assert_eq!(extractor.find(&bearer("tok-1")), Some("tok-1".to_string()));
        assert_eq!(extractor.find(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer tok-2"));
        assert_eq!(extractor.find(&headers), Some("tok-2".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extractor.find(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extractor.find(&headers), None);
    }

    #[tokio::test]
    async fn test_missing_token_required() {
        let gate = InitialAccessTokenGate::new(storage_with(vec![]), true);

        let result = gate.authorize(&HeaderMap::new()).await;
        assert!(matches!(result, Err(InitialAccessTokenError::MissingToken)));
    }

    #[tokio::test]
    async fn test_missing_token_optional() {
        let gate = InitialAccessTokenGate::new(storage_with(vec![]), false);

        let context = gate.authorize(&HeaderMap::new()).await.unwrap();
        assert!(context.is_anonymous());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let gate = InitialAccessTokenGate::new(storage_with(vec![]), false);

        // Presenting a bad token is never anonymous, even when tokens are optional.
        let result = gate.authorize(&bearer("nope")).await;
        assert!(matches!(result, Err(InitialAccessTokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_valid_token() {
        let now = Utc::now();
        let gate = InitialAccessTokenGate::new(
            storage_with(vec![token("tok-1", now + Duration::hours(1), false)]),
            true,
        );

        let context = gate.authorize_at(&bearer("tok-1"), now).await.unwrap();
        assert_eq!(context, AuthContext::for_user_account("u1"));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let now = Utc::now();
        let gate = InitialAccessTokenGate::new(
            storage_with(vec![token("tok-1", now, false)]),
            true,
        );

        let result = gate.authorize_at(&bearer("tok-1"), now).await;
        assert!(matches!(result, Err(InitialAccessTokenError::ExpiredToken)));

        let result = gate
            .authorize_at(&bearer("tok-1"), now - Duration::milliseconds(1))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_revocation_checked_before_expiry() {
        let now = Utc::now();
        let gate = InitialAccessTokenGate::new(
            storage_with(vec![
                token("expired-revoked", now - Duration::hours(1), true),
                token("revoked", now + Duration::hours(1), true),
            ]),
            true,
        );

        let result = gate.authorize_at(&bearer("expired-revoked"), now).await;
        assert!(matches!(result, Err(InitialAccessTokenError::InvalidToken)));

        let result = gate.authorize_at(&bearer("revoked"), now).await;
        assert!(matches!(result, Err(InitialAccessTokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_anonymous_grant_token() {
        let now = Utc::now();
        let mut anonymous = token("tok-anon", now + Duration::hours(1), false);
        anonymous.user_account_id = None;
        let gate = InitialAccessTokenGate::new(storage_with(vec![anonymous]), true);

        let context = gate.authorize_at(&bearer("tok-anon"), now).await.unwrap();
        assert!(context.is_anonymous());
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let gate = InitialAccessTokenGate::new(Arc::new(FailingTokenStore), true);

        let result = gate.authorize(&bearer("tok-1")).await;
        assert!(matches!(
            result,
            Err(InitialAccessTokenError::LookupFailed(StorageError::ConnectionFailed(_)))
        ));
    }

    /// Reads the credential from a custom header
    struct HeaderTokenExtractor(&'static str);

    impl TokenExtractor for HeaderTokenExtractor {
        fn find(&self, headers: &HeaderMap) -> Option<String> {
            headers
                .get(self.0)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        }
    }

    #[tokio::test]
    async fn test_custom_token_extractor() {
        let now = Utc::now();
        let gate = InitialAccessTokenGate::new(
            storage_with(vec![token("tok-1", now + Duration::hours(1), false)]),
            true,
        )
        .with_token_extractor(Arc::new(HeaderTokenExtractor("x-registration-token")));

        let result = gate.authorize_at(&bearer("tok-1"), now).await;
        assert!(matches!(result, Err(InitialAccessTokenError::MissingToken)));

        let mut headers = HeaderMap::new();
        headers.insert("x-registration-token", HeaderValue::from_static("tok-1"));
        let context = gate.authorize_at(&headers, now).await.unwrap();
        assert_eq!(context.user_account_id.as_deref(), Some("u1"));
    }
}
