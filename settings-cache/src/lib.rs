//! Caching accessor for addon settings.
//!
//! [`SettingsCache`] unifies three sources behind one get/set API: the
//! read-only managed scope (administrator policy), the user's synced scope,
//! and the static [`DefaultsTable`](settings_defaults::DefaultsTable).
//! Managed values win over synced values, which win over defaults.

#![warn(missing_docs, clippy::pedantic)]

mod cache;
mod config;
mod error;
mod load;
mod state;
mod update;

pub use cache::{CacheStatus, SettingsCache, SettingsCacheBuilder};
pub use config::CacheConfig;
pub use error::{SettingsError, SettingsResult};
pub use load::LoadHandle;
pub use update::SettingsUpdate;
