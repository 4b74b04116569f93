//! Error type for storage providers.

use std::path::PathBuf;

use confstore_core::ConfigError;
use thiserror::Error;

/// Errors surfaced by a [`StorageProvider`](crate::StorageProvider).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The provider was disposed; every later call fails with this.
    #[error("storage provider has been disposed")]
    Disposed,

    /// A mutating operation was attempted on a read-only provider.
    #[error("storage at {0} was opened read-only")]
    ReadOnly(PathBuf),

    /// The path contains characters the platform does not allow.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// The operation is not valid in the provider's current state, e.g.
    /// opening a missing file read-only.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A model error not tied to a particular line.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A model error raised while reading a line of the backing file.
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number.
        line: usize,
        #[source]
        source: ConfigError,
    },

    /// The TOML format options could not be parsed.
    #[error("failed to parse format options: {0}")]
    Options(#[from] toml::de::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying model error, if any.
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(source) | Self::Line { source, .. } => Some(source),
            _ => None,
        }
    }
}
