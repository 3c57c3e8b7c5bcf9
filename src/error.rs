//! Crate-level error type for startup, configuration and CLI paths.
//!
//! Record store operations return [`StoreError`](crate::store::StoreError)
//! directly; this type wraps it where a store failure ends a command.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// An explicitly named configuration file does not exist.
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: std::path::PathBuf },

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation { message: String },

    /// The record store could not be opened or failed an operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Failed to bind the HTTP listener.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}
