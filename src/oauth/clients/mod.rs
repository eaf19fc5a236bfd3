//! OAuth client registration.
//!
//! Identifier generation, metadata validation rules, and dynamic client
//! registration per RFC 7591.

pub mod id_generator;
pub mod registration;
pub mod rules;

// Re-export main types and services
pub use id_generator::{ClientIdGenerator, StoreCheckedClientIdGenerator, UuidClientIdGenerator};
pub use registration::{ClientRegistrationService, parse_registration_body};
pub use rules::{Rule, RuleManager, RulesConfig};
