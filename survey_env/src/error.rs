//! Error types for the study environment layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
///
/// These only ever surface from export transports; the clock and RNG are
/// infallible by contract.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Writing an export file failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote submission failed (connection, status code, etc.)
    #[error("HTTP error: {0}")]
    Http(String),
}

impl EnvError {
    /// Creates an I/O error bound to the path being written.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}
