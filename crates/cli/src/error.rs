//! CLI error types.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An image given with `--image` could not be read.
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mind map could not be generated.
    #[error("mind map unavailable for '{topic}'")]
    MindMapUnavailable { topic: String },

    /// An error occurred in the relay layer.
    #[error(transparent)]
    Relay(#[from] relay::Error),

    /// An error occurred in the key store.
    #[error(transparent)]
    Keystore(#[from] keystore::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
