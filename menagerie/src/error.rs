//! Error types for Menagerie

use thiserror::Error;

/// Menagerie error type
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected input (reported before any store or index access)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No animal with this id
    #[error("Animal not found: {0}")]
    AnimalNotFound(i64),

    /// Animal names are unique
    #[error("An animal named '{0}' already exists")]
    DuplicateName(String),

    /// Invalid query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Search index error
    #[error("Index error: {0}")]
    IndexError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for Menagerie operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigError(format!("Invalid config file: {}", err))
    }
}

impl Error {
    /// Whether the error was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::DuplicateName(_) | Error::InvalidQuery(_)
        )
    }
}
