//! Axum HTTP server handlers for the registration and discovery endpoints.

pub mod context;
mod handler_oauth_clients;
mod handler_well_known;
pub mod server;
pub mod utils_oauth;

pub use context::AppState;
pub use server::build_router;
