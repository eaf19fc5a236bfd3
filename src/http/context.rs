//! Application state shared by request handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::{ClientRegistrationService, InitialAccessTokenGate};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Resolves the initial access token presented with a registration
    pub initial_access_token_gate: Arc<InitialAccessTokenGate>,
    /// Client registration service for dynamic client registration
    pub client_registration_service: Arc<ClientRegistrationService>,
}
