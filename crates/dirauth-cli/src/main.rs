//! dirauth - directory-bind authentication
//!
//! Looks users up in the identity store and checks their passwords with an
//! LDAP bind.

use clap::{Parser, Subcommand};
use dirauth_auth::{AuthManager, LdapDirectory, LdapServiceProvider, SessionGuard};
use dirauth_core::config::DirAuthConfig;
use dirauth_core::types::{Credentials, UserRecord};
use dirauth_metadata::{ModelRegistry, SqliteUserStore, UserStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Directory-bind authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRAUTH_CONFIG")]
    config: Option<PathBuf>,

    /// LDAP server
    #[arg(long, global = true, env = "DIRAUTH_LDAP_SERVER")]
    server: Option<String>,

    /// Bind principal domain prefix
    #[arg(long, global = true, env = "DIRAUTH_LDAP_DOMAIN")]
    domain: Option<String>,

    /// Identity store URL
    #[arg(long, global = true, env = "DIRAUTH_DATABASE_URL")]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIRAUTH_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Attempt a login
    Login {
        /// Identity field, e.g. username=alice (repeatable)
        #[arg(short, long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,

        /// Password checked against the directory
        #[arg(short, long, env = "DIRAUTH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Issue a remember-me token on success
        #[arg(long)]
        remember: bool,
    },

    /// Manage the identity store
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Write the default configuration file
    PublishConfig {
        /// Destination path
        #[arg(short, long, default_value = "dirauth.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add or update a user record
    Add {
        /// Primary key
        #[arg(long)]
        id: String,

        /// Column value, e.g. email=alice@example.com (repeatable)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = DirAuthConfig::from_file(path)?;
            config.apply_env();
            config
        }
        None => DirAuthConfig::from_env(),
    };

    if let Some(server) = cli.server {
        config.ldap.server = server;
    }
    if let Some(domain) = cli.domain {
        config.ldap.domain = Some(domain);
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config);

    match cli.command {
        Commands::Version => {
            println!("dirauth {}", dirauth_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
        Commands::PublishConfig { output, force } => {
            DirAuthConfig::publish(&output, force)?;
            println!("Configuration written to {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Users {
            command: UserCommands::Add { id, fields },
        } => {
            add_user(config, id, fields).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Login {
            fields,
            password,
            remember,
        } => {
            let mut credentials: Credentials = fields.into_iter().collect();
            credentials.insert("password", password);
            login(config, credentials, remember).await
        }
    }
}

fn init_logging(config: &DirAuthConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true))
            .with(filter)
            .init();
    }
}

async fn open_store(config: &DirAuthConfig) -> anyhow::Result<Arc<SqliteUserStore>> {
    info!("Database: {}", config.database.url);
    let store =
        SqliteUserStore::new(&config.database.url, config.database.max_connections).await?;
    Ok(Arc::new(store))
}

async fn add_user(
    config: DirAuthConfig,
    id: String,
    fields: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let models = ModelRegistry::with_defaults();
    let model = models.resolve(&config.auth.model)?;
    let store = open_store(&config).await?;

    let mut user = match store.find(&model, &id).await? {
        Some(user) => user,
        None => UserRecord::new(id).with_attribute("created_at", chrono::Utc::now().to_rfc3339()),
    };
    for (name, value) in fields {
        user.attributes.insert(name, value);
    }
    user.attributes
        .insert("updated_at".to_string(), chrono::Utc::now().to_rfc3339());

    store.save(&model, &user).await?;
    println!("Saved user {}", user.id);
    Ok(())
}

async fn login(
    config: DirAuthConfig,
    credentials: Credentials,
    remember: bool,
) -> anyhow::Result<ExitCode> {
    let store = open_store(&config).await?;
    let directory = Arc::new(LdapDirectory::new(&config.ldap));
    let driver = config.auth.driver.clone();

    let mut manager = AuthManager::new();
    LdapServiceProvider::new(
        Arc::new(config),
        Arc::new(ModelRegistry::with_defaults()),
        store,
        directory,
    )
    .boot(&mut manager);

    let guard = SessionGuard::new(manager.create_user_provider(&driver)?);

    match guard.attempt(&credentials, remember).await? {
        Some(user) => {
            println!("Authenticated user {}", user.id);
            if let Some(token) = user.remember_token.filter(|_| remember) {
                println!("Remember token: {}", token);
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("Invalid credentials");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("email=a@b.com").unwrap(),
            ("email".to_string(), "a@b.com".to_string())
        );
        assert_eq!(
            parse_field("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert!(parse_field("email").is_err());
        assert!(parse_field("=value").is_err());
    }

    #[test]
    fn test_login_args() {
        let cli = Cli::try_parse_from([
            "dirauth",
            "login",
            "--field",
            "username=alice",
            "--password",
            "secret1",
            "--remember",
        ])
        .unwrap();

        match cli.command {
            Commands::Login {
                fields, remember, ..
            } => {
                assert_eq!(fields, vec![("username".to_string(), "alice".to_string())]);
                assert!(remember);
            }
            _ => panic!("expected login"),
        }
    }
}
