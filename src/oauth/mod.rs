//! OAuth 2.0 dynamic client registration gated by initial access tokens.

pub mod clients;
pub mod initial_access_token;
pub mod types;

// Re-export frequently used items from each module
pub use crate::storage::{
    inmemory::MemoryRegistrationStorage,
    traits::{ClientStore, InitialAccessTokenStore, RegistrationStorage},
};
pub use clients::{
    ClientIdGenerator, ClientRegistrationService, Rule, RuleManager, RulesConfig,
    StoreCheckedClientIdGenerator, UuidClientIdGenerator,
};
pub use initial_access_token::{BearerTokenExtractor, InitialAccessTokenGate, TokenExtractor};
pub use types::{AuthContext, Client, InitialAccessToken, OAuthErrorResponse, Parameters};
