//! Caching settings accessor facade.
//!
//! Bundles the settings crates behind feature flags so downstream users can
//! pull in only the pieces they need.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use settings_primitives as primitives;

/// Default-value table (enabled by `defaults` feature).
#[cfg(feature = "defaults")]
pub use settings_defaults as defaults;

/// Storage scopes and implementations (enabled by `storage` feature).
#[cfg(feature = "storage")]
pub use settings_storage as storage;

/// The caching accessor (enabled by `cache` feature).
#[cfg(feature = "cache")]
pub use settings_cache as cache;

/// Commonly used items.
#[cfg(feature = "cache")]
pub mod prelude {
    pub use settings_cache::{CacheConfig, SettingsCache, SettingsError, SettingsResult};
    pub use settings_defaults::DefaultsTable;
    pub use settings_primitives::{OptionMap, Selector, SettingValue};
    pub use settings_storage::{FileArea, MemoryArea, Storage};
}
