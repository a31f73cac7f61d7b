//! LDAP client implementation
//!
//! Opens a fresh connection per check and performs a single simple bind.

use async_trait::async_trait;
use dirauth_core::config::LdapConfig;
use dirauth_core::types::Credentials;
use dirauth_core::{Error, Result, MIN_CREDENTIAL_LENGTH};
use ldap3::{LdapConnAsync, LdapConnSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::ldap::types::*;

/// Connect + bind against a directory server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Directory: Send + Sync {
    async fn bind(&self, server: &str, principal: &str, password: &str) -> BindResult;
}

/// `ldap3` backed directory.
#[derive(Debug, Clone)]
pub struct LdapDirectory {
    timeout: Duration,
    start_tls: bool,
}

impl LdapDirectory {
    pub fn new(config: &LdapConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            start_tls: config.start_tls,
        }
    }
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn bind(&self, server: &str, principal: &str, password: &str) -> BindResult {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout)
            .set_starttls(self.start_tls);
        let url = server_url(server);

        debug!("Connecting to LDAP server: {}", url);

        let (conn, mut ldap) = match LdapConnAsync::with_settings(settings, &url).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Failed to connect to LDAP server {}: {}", url, e);
                return BindResult::TransportError(e.to_string());
            }
        };

        ldap3::drive!(conn);

        let result = match ldap.simple_bind(principal, password).await {
            Ok(result) => result,
            Err(e) => {
                warn!("LDAP bind for {} failed: {}", principal, e);
                return BindResult::TransportError(e.to_string());
            }
        };

        let _ = ldap.unbind().await;

        if result.rc != 0 {
            debug!("LDAP bind for {} rejected with code: {}", principal, result.rc);
        }

        BindResult::from_rc(result.rc)
    }
}

/// Accept bare host names the way `ldap_connect` does.
pub fn server_url(server: &str) -> String {
    if server.contains("://") {
        server.to_string()
    } else {
        format!("ldap://{}", server)
    }
}

/// Identity presented to the directory: `DOMAIN\username` or `username`.
pub fn bind_principal(domain: Option<&str>, username: &str) -> String {
    match domain {
        Some(domain) => format!("{}\\{}", domain, username),
        None => username.to_string(),
    }
}

/// Validates credentials by binding to the configured directory.
#[derive(Clone)]
pub struct LdapAuthenticator {
    config: LdapConfig,
    directory: Arc<dyn Directory>,
}

impl LdapAuthenticator {
    pub fn new(config: LdapConfig, directory: Arc<dyn Directory>) -> Self {
        Self { config, directory }
    }

    /// Bind as the user named by the credentials.
    ///
    /// A missing server is an error; every other failure is a `BindResult`.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<BindResult> {
        if self.config.server.is_empty() {
            return Err(Error::MissingServer);
        }

        let username = credentials
            .get(&self.config.username_field)
            .unwrap_or_default();
        let password = credentials.password().unwrap_or_default();

        // Some servers accept anonymous binds for empty or trivial input.
        if username.len() < MIN_CREDENTIAL_LENGTH || password.len() < MIN_CREDENTIAL_LENGTH {
            debug!("Credentials too short for a directory bind");
            return Ok(BindResult::InvalidCredentials);
        }

        let principal = bind_principal(self.config.domain(), username);
        Ok(self
            .directory
            .bind(&self.config.server, &principal, password)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(domain: Option<&str>) -> LdapConfig {
        LdapConfig {
            server: "ldap://dc.example.com".to_string(),
            domain: domain.map(str::to_string),
            ..Default::default()
        }
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials::new()
            .with("username", username)
            .with("password", password)
    }

    #[test]
    fn test_principal_building() {
        assert_eq!(bind_principal(Some("CORP"), "alice"), "CORP\\alice");
        assert_eq!(bind_principal(None, "alice"), "alice");
    }

    #[test]
    fn test_server_url() {
        assert_eq!(server_url("dc.example.com"), "ldap://dc.example.com");
        assert_eq!(server_url("ldaps://dc.example.com:636"), "ldaps://dc.example.com:636");
    }

    #[tokio::test]
    async fn test_domain_prefixed_principal() {
        let mut directory = MockDirectory::new();
        directory
            .expect_bind()
            .withf(|server, principal, password| {
                server == "ldap://dc.example.com"
                    && principal == "CORP\\alice"
                    && password == "secret1"
            })
            .times(1)
            .returning(|_, _, _| BindResult::Success);

        let auth = LdapAuthenticator::new(config(Some("CORP")), Arc::new(directory));
        let result = auth.authenticate(&creds("alice", "secret1")).await.unwrap();
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_plain_principal_without_domain() {
        let mut directory = MockDirectory::new();
        directory
            .expect_bind()
            .withf(|_, principal, _| principal == "alice")
            .times(1)
            .returning(|_, _, _| BindResult::Success);

        let auth = LdapAuthenticator::new(config(None), Arc::new(directory));
        assert!(auth
            .authenticate(&creds("alice", "secret1"))
            .await
            .unwrap()
            .is_success());
    }

    #[tokio::test]
    async fn test_short_input_never_reaches_directory() {
        let mut directory = MockDirectory::new();
        directory.expect_bind().never();

        let auth = LdapAuthenticator::new(config(None), Arc::new(directory));

        for (username, password) in [("al", "secret1"), ("alice", "ab"), ("", ""), ("abc", "")] {
            let result = auth.authenticate(&creds(username, password)).await.unwrap();
            assert_eq!(result, BindResult::InvalidCredentials);
        }

        let no_username = Credentials::new().with("password", "secret1");
        let result = auth.authenticate(&no_username).await.unwrap();
        assert_eq!(result, BindResult::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_missing_server_is_error() {
        let mut directory = MockDirectory::new();
        directory.expect_bind().never();

        let config = LdapConfig {
            server: String::new(),
            ..Default::default()
        };
        let auth = LdapAuthenticator::new(config, Arc::new(directory));

        let err = auth.authenticate(&creds("alice", "secret1")).await.unwrap_err();
        assert!(matches!(err, Error::MissingServer));
    }

    #[tokio::test]
    async fn test_configured_username_field() {
        let mut directory = MockDirectory::new();
        directory
            .expect_bind()
            .withf(|_, principal, _| principal == "a@b.com")
            .times(1)
            .returning(|_, _, _| BindResult::Success);

        let config = LdapConfig {
            username_field: "email".to_string(),
            ..config(None)
        };
        let auth = LdapAuthenticator::new(config, Arc::new(directory));
        let creds = Credentials::new()
            .with("email", "a@b.com")
            .with("password", "secret1");

        assert!(auth.authenticate(&creds).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = LdapConfig {
            server: "ldap://127.0.0.1:1".to_string(),
            timeout_seconds: 1,
            ..Default::default()
        };
        let directory = LdapDirectory::new(&config);

        let result = directory.bind(&config.server, "alice", "secret1").await;
        assert!(matches!(result, BindResult::TransportError(_)));
    }
}
