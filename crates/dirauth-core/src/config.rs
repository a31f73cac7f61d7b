//! Configuration for dirauth

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirAuthConfig {
    #[serde(default)]
    pub ldap: LdapConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirAuthConfig {
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| crate::Error::ConfigError(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override values with `DIRAUTH_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(server) = var("DIRAUTH_LDAP_SERVER") {
            self.ldap.server = server;
        }
        if let Some(domain) = var("DIRAUTH_LDAP_DOMAIN") {
            self.ldap.domain = Some(domain);
        }
        if let Some(field) = var("DIRAUTH_LDAP_USERNAME_FIELD") {
            self.ldap.username_field = field;
        }
        if let Some(t) = var("DIRAUTH_LDAP_TIMEOUT").and_then(|v| v.parse().ok()) {
            self.ldap.timeout_seconds = t;
        }
        if let Some(start_tls) = var("DIRAUTH_LDAP_START_TLS").and_then(|v| v.parse().ok()) {
            self.ldap.start_tls = start_tls;
        }
        if let Some(driver) = var("DIRAUTH_AUTH_DRIVER") {
            self.auth.driver = driver;
        }
        if let Some(model) = var("DIRAUTH_AUTH_MODEL") {
            self.auth.model = model;
        }
        if let Some(url) = var("DIRAUTH_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(n) = var("DIRAUTH_DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = n;
        }
        if let Some(level) = var("DIRAUTH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DIRAUTH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Render the configuration as a TOML document.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to render config: {}", e)))
    }

    /// Write the packaged defaults to `path`.
    ///
    /// An existing file is left alone unless `force` is set.
    pub fn publish(path: impl AsRef<Path>, force: bool) -> crate::Result<()> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(crate::Error::InvalidArgument(format!(
                "Refusing to overwrite existing config: {}",
                path.display()
            )));
        }

        std::fs::write(path, Self::default().to_toml()?)?;
        Ok(())
    }
}

/// Directory server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Directory host or URI, e.g. "ldap://dc.example.com:389"
    #[serde(default)]
    pub server: String,

    /// Optional bind principal prefix, e.g. "CORP" gives "CORP\user"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Credential field holding the bind username
    #[serde(default = "default_username_field")]
    pub username_field: String,

    /// Use STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Connection timeout in seconds
    #[serde(default = "default_ldap_timeout")]
    pub timeout_seconds: u64,
}

fn default_username_field() -> String {
    "username".to_string()
}

fn default_ldap_timeout() -> u64 {
    10
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            domain: None,
            username_field: default_username_field(),
            start_tls: false,
            timeout_seconds: default_ldap_timeout(),
        }
    }
}

impl LdapConfig {
    /// Domain prefix, if one is configured and non-empty.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref().filter(|d| !d.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Driver the application authenticates through
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Registered name of the user model
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_driver() -> String {
    crate::LDAP_DRIVER.to_string()
}

fn default_model() -> String {
    "users".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://dirauth.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
