//! Main router configuration assembling the registration and discovery endpoints.

use axum::{
    Router,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState, handler_oauth_clients::app_register_client_handler,
    handler_well_known::oauth_authorization_server_handler,
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let oauth_routes = Router::new().route("/clients/register", any(app_register_client_handler));

    let well_known_routes = Router::new().route(
        "/oauth-authorization-server",
        get(oauth_authorization_server_handler),
    );

    Router::new()
        .nest("/oauth", oauth_routes)
        .nest("/.well-known", well_known_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::oauth::{
        ClientRegistrationService, InitialAccessTokenGate, RuleManager, RulesConfig,
        UuidClientIdGenerator,
    };
    use crate::storage::inmemory::MemoryRegistrationStorage;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_app_state(required: bool) -> AppState {
        let storage = Arc::new(MemoryRegistrationStorage::new());

        let config = Config {
            version: "test".to_string(),
            http_port: "8080".to_string().try_into().unwrap(),
            external_base: "https://dcr.example.com".to_string(),
            storage_backend: "memory".to_string(),
            database_url: None,
            initial_access_token_required: required.to_string().try_into().unwrap(),
            oauth_supported_scopes: "openid profile".to_string().try_into().unwrap(),
            client_required_parameters: Default::default(),
            client_max_redirect_uris: "10".to_string().try_into().unwrap(),
            client_default_auth_method: "client_secret_basic".to_string().try_into().unwrap(),
        };

        AppState {
            config: Arc::new(config),
            initial_access_token_gate: Arc::new(InitialAccessTokenGate::new(
                storage.clone(),
                required,
            )),
            client_registration_service: Arc::new(ClientRegistrationService::new(
                Arc::new(UuidClientIdGenerator),
                RuleManager::with_default_rules(&RulesConfig::default()),
                storage,
            )),
        }
    }

    #[tokio::test]
    async fn test_authorization_server_metadata() {
        let app = build_router(create_test_app_state(true));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/.well-known/oauth-authorization-server")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let metadata: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(metadata["issuer"], "https://dcr.example.com");
        assert_eq!(
            metadata["registration_endpoint"],
            "https://dcr.example.com/oauth/clients/register"
        );
        assert_eq!(metadata["scopes_supported"], serde_json::json!(["openid", "profile"]));
        assert_eq!(metadata["initial_access_token_required"], true);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = build_router(create_test_app_state(false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/oauth/clients")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
