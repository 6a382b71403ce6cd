//! Server startup and runtime errors.

use thiserror::Error;

use crate::{config::ConfigError, domain::StorageError};

/// Errors that stop the server process
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Storage unreachable at boot
    #[error("Storage startup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid allowed origin '{0}'")]
    InvalidOrigin(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
