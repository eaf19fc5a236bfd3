//! Dynamic client registration server binary.
//!
//! Loads configuration from the environment, wires storage, the initial
//! access token gate and the registration service, then serves HTTP with
//! graceful shutdown.

use anyhow::Result;
use dcr::{
    config::Config,
    http::{AppState, build_router},
    oauth::{
        ClientIdGenerator, ClientRegistrationService, InitialAccessTokenGate, RuleManager,
        StoreCheckedClientIdGenerator, UuidClientIdGenerator,
    },
    storage::{ClientStore, InitialAccessTokenStore, create_storage_backend, parse_storage_backend},
};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dcr=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();

    let version = dcr::config::version()?;

    env::args().for_each(|arg| {
        if arg == "--version" {
            println!("{version}");
            std::process::exit(0);
        }
    });

    tracing::info!(?version, "Starting DCR");

    let config = Config::new()?;

    let storage_backend =
        parse_storage_backend(&config.storage_backend, config.database_url.as_deref())?;
    tracing::info!(backend = %config.storage_backend, "Initializing storage");
    let storage = create_storage_backend(storage_backend).await?;

    let client_store: Arc<dyn ClientStore> = storage.clone();
    let initial_access_token_store: Arc<dyn InitialAccessTokenStore> = storage;

    let required = *config.initial_access_token_required.as_ref();
    tracing::info!(required, "Initial access token policy");
    let initial_access_token_gate = Arc::new(InitialAccessTokenGate::new(
        initial_access_token_store,
        required,
    ));

    let client_id_generator: Arc<dyn ClientIdGenerator> = Arc::new(
        StoreCheckedClientIdGenerator::new(Arc::new(UuidClientIdGenerator), client_store.clone()),
    );
    let rule_manager = RuleManager::with_default_rules(&config.rules_config());
    tracing::debug!(rules = rule_manager.len(), "Registration rules loaded");

    let client_registration_service = Arc::new(ClientRegistrationService::new(
        client_id_generator,
        rule_manager,
        client_store,
    ));

    let http_port = *config.http_port.as_ref();
    let app_context = AppState {
        config: Arc::new(config),
        initial_access_token_gate,
        client_registration_service,
    };

    let app = build_router(app_context);

    // Setup graceful shutdown
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();

    {
        let tracker = tracker.clone();
        let inner_token = token.clone();

        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    tracing::error!("failed to install signal handler: {}", err);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = inner_token.cancelled() => { },
                _ = terminate => {},
                _ = ctrl_c => {},
            }

            tracker.close();
            inner_token.cancel();
        });
    }

    // Start HTTP server
    let bind_address = format!("0.0.0.0:{http_port}");
    let listener = TcpListener::bind(&bind_address).await?;
    {
        let inner_token = token.clone();
        tracker.spawn(async move {
            tracing::info!("Starting server on {bind_address}");

            let shutdown_token = inner_token.clone();
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_token.cancelled().await;
                    tracing::info!("axum graceful shutdown complete");
                })
                .await;
            if let Err(err) = result {
                tracing::error!("axum task failed: {}", err);
            }

            inner_token.cancel();
        });
    }

    tracker.wait().await;

    Ok(())
}
