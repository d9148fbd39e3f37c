//! Error types and result aliases.
//!
//! Defines the core `GateError` enumeration and common `Result` type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the session, rate limiting and credential components.
#[derive(Debug, Error)]
pub enum GateError {
    /// A caller passed a malformed argument to a constructor or generator.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The credential directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The credential file could not be written.
    #[error("failed to write file {}: {source}", path.display())]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GateError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for `GateError`.
pub type Result<T> = std::result::Result<T, GateError>;
