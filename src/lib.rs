//! Dynamic OAuth 2.0 client registration (RFC 7591) library crate.
//!
//! Registration requests are authorized by an optional initial access token,
//! validated by an ordered rule chain, and persisted through pluggable storage.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
