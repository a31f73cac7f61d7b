//! Directory-bind authentication for dirauth

pub mod guard;
pub mod ldap;
pub mod manager;
pub mod provider;

pub use guard::{generate_remember_token, SessionGuard};
pub use ldap::{bind_principal, BindResult, Directory, LdapAuthenticator, LdapDirectory};
pub use manager::{AuthManager, LdapServiceProvider, ProviderFactory};
pub use provider::{LdapUserProvider, UserProvider};
