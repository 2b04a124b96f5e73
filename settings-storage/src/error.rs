//! Error types for the storage scopes.

use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by storage areas.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The platform has no administrator policy configured.
    ///
    /// Expected whenever no managed storage manifest is installed.
    #[error("managed storage manifest not found")]
    ManagedConfigAbsent,
    /// Underlying I/O failure while reading or writing a backing file.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
    /// A stored document did not hold a valid option map.
    #[error(transparent)]
    Invalid(#[from] settings_primitives::Error),
    /// Storage backend reported an application error.
    #[error("storage backend error: {reason}")]
    Backend {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl StorageError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the benign "no managed policy" condition.
    #[must_use]
    pub const fn is_managed_absent(&self) -> bool {
        matches!(self, Self::ManagedConfigAbsent)
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
