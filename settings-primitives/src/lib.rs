//! Core shared types for the addon settings cache.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod selector;
mod value;

/// Error type and result alias shared across the settings crates.
pub use error::{Error, Result};
/// Option selectors used when fetching from a storage scope.
pub use selector::{Selector, validate_option_name};
/// Tagged option values and the option map they live in.
pub use value::{OptionMap, SettingValue, option_map_from_json, option_map_to_json};
