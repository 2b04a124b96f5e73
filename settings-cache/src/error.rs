//! Error types for the settings cache.

use std::sync::Arc;

use settings_defaults::DefaultsError;
use settings_storage::StorageError;
use thiserror::Error;

/// Result alias for settings cache operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors surfaced by [`SettingsCache`](crate::SettingsCache).
///
/// The type is `Clone` so a single fetch outcome can be handed to every
/// caller waiting on it.
#[derive(Clone, Debug, Error)]
pub enum SettingsError {
    /// No storage backend was supplied.
    #[error("storage API is not available")]
    StorageUnavailable,

    /// The managed scope failed for a reason other than missing policy.
    #[error("could not get managed options: {source}")]
    ManagedFetch {
        /// Failure reported by the managed scope.
        source: Arc<StorageError>,
    },

    /// The sync scope could not be read; synced options are unavailable.
    #[error("synced options not available: {source}")]
    SyncFetch {
        /// Failure reported by the sync scope.
        source: Arc<StorageError>,
    },

    /// The option has no stored value and no default.
    #[error("default value for option \"{option}\" missing, no default value defined")]
    UnknownOption {
        /// Name of the requested option.
        option: String,
    },

    /// The call itself was malformed.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Persisting to the sync scope failed. The cache was left untouched.
    #[error("could not save options: {source}")]
    Write {
        /// Failure reported by the sync scope.
        source: Arc<StorageError>,
    },

    /// A resolved value did not deserialize into the requested type.
    #[error("could not decode option \"{option}\": {source}")]
    Decode {
        /// Name of the requested option.
        option: String,
        /// Underlying serde failure.
        source: Arc<serde_json::Error>,
    },

    /// The defaults table is malformed.
    #[error("invalid defaults: {reason}")]
    Defaults {
        /// Human-readable reason describing the problem.
        reason: String,
    },
}

impl SettingsError {
    /// Convenience constructor for malformed calls.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl From<DefaultsError> for SettingsError {
    fn from(value: DefaultsError) -> Self {
        match value {
            DefaultsError::UnknownOption { option } => Self::UnknownOption { option },
            DefaultsError::InvalidTable { reason } => Self::Defaults { reason },
            DefaultsError::Primitive(err) => Self::invalid_argument(err.to_string()),
        }
    }
}

impl From<settings_primitives::Error> for SettingsError {
    fn from(value: settings_primitives::Error) -> Self {
        Self::invalid_argument(value.to_string())
    }
}
