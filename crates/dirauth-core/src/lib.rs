//! dirauth core library
//!
//! Shared error, configuration and record types for the directory-bind
//! authentication crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::DirAuthConfig;
pub use error::{Error, Result};

/// dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name under which the LDAP user provider is registered
pub const LDAP_DRIVER: &str = "ldap-auth";

/// Shortest username or password handed to the directory
pub const MIN_CREDENTIAL_LENGTH: usize = 3;
