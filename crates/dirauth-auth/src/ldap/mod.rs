//! LDAP bind validation
//!
//! Password checks happen by binding to the directory as the user:
//! - Principal built from the username, optionally domain-prefixed
//! - One simple bind per check, nothing cached
//! - Outcomes kept as `BindResult` until the provider boundary

mod client;
mod types;

pub use client::{bind_principal, server_url, Directory, LdapAuthenticator, LdapDirectory};
pub use types::*;

#[cfg(test)]
pub use client::MockDirectory;
