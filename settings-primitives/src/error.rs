//! Shared error definitions for settings primitives.

use thiserror::Error;

/// Result alias used throughout the settings crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating settings primitive types.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A JSON document did not have the shape required for option values.
    #[error("invalid option value: {reason}")]
    InvalidValue {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Option name failed validation.
    #[error("invalid option name `{name}`: {reason}")]
    InvalidOptionName {
        /// The offending option name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
