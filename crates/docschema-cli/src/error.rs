//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to read a description file.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Description file is not a valid type description.
    #[error("invalid description in {path}: {source}")]
    Description {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Entity descriptions must be objects.
    #[error("description in {path} is {kind}, expected object")]
    NotAnObject { path: PathBuf, kind: &'static str },

    /// Core error.
    #[error(transparent)]
    Core(#[from] docschema_core::Error),

    /// Output rendering failed.
    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),
}
