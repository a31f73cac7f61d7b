//! Error types for dirauth

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("LDAP server missing")]
    MissingServer,

    #[error("No user model registered under name: {0}")]
    UnknownModel(String),

    #[error("No user provider registered for driver: {0}")]
    UnknownDriver(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Query Errors
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Database Errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Operator errors that no retry or different user input can fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingServer
                | Error::UnknownModel(_)
                | Error::UnknownDriver(_)
                | Error::ConfigError(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingServer => "MissingServer",
            Error::UnknownModel(_) => "UnknownModel",
            Error::UnknownDriver(_) => "UnknownDriver",
            Error::ConfigError(_) => "ConfigError",
            Error::InvalidColumn(_) => "InvalidColumn",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::DatabaseError(_) => "DatabaseError",
            Error::Io(_) => "IoError",
            Error::Other(_) => "InternalError",
        }
    }
}
