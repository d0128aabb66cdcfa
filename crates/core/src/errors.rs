//! Error types for the fuzzy rerere core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rerere(#[from] RerereError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Record store errors
// ---------------------------------------------------------------------------

/// Errors from the on-disk record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot exists for the given file.
    #[error("no snapshot recorded for '{0}'")]
    SnapshotNotFound(String),

    /// A stored record could not be parsed.
    #[error("malformed record at '{path}': {detail}")]
    MalformedRecord {
        path: PathBuf,
        detail: String,
    },

    /// A record could not be serialized.
    #[error("failed to serialize record: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    /// Reading from or writing to the store directory failed.
    #[error("record store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Errors from the mark / save / reapply commands.
#[derive(Debug, Error)]
pub enum RerereError {
    /// A file named on the command line does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A working-tree file could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A working-tree file could not be rewritten.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The record store failed underneath a command.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RerereError {
    /// Classify an I/O error raised while reading a working-tree file.
    pub(crate) fn read(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_string())
        } else {
            Self::ReadFailed {
                path: path.to_string(),
                source,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
