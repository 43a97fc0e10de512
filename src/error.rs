//! Error types for hashcabinet
//!
//! Provides a unified error type for all operations. The two failure
//! families a caller usually cares about are kept apart: "can't reach the
//! store" ([`CabinetError::StorageUnavailable`]) and "found something the
//! codec can't handle" ([`CabinetError::Serialization`] /
//! [`CabinetError::Deserialization`]).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using CabinetError
pub type Result<T> = std::result::Result<T, CabinetError>;

/// Unified error type for hashcabinet operations
#[derive(Debug, Error)]
pub enum CabinetError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// The store at `path` could not be opened: missing directory,
    /// permissions, corruption, or lock contention.
    #[error("Storage unavailable at {}: {reason}", .path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// A value could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored bytes could not be decoded (corrupt or foreign data).
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CabinetError {
    /// Wrap any failure that happened while opening the store at `path`.
    ///
    /// Errors that are already `StorageUnavailable` pass through untouched.
    pub(crate) fn unavailable(path: impl Into<PathBuf>, err: CabinetError) -> Self {
        match err {
            err @ CabinetError::StorageUnavailable { .. } => err,
            other => CabinetError::StorageUnavailable {
                path: path.into(),
                reason: other.to_string(),
            },
        }
    }

    /// True if the store could not be opened.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, CabinetError::StorageUnavailable { .. })
    }

    /// True for both directions of codec failure.
    pub fn is_encoding_failure(&self) -> bool {
        matches!(
            self,
            CabinetError::Serialization(_) | CabinetError::Deserialization(_)
        )
    }
}
