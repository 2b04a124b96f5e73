//! In-process storage area.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use settings_primitives::{OptionMap, Selector, option_map_from_json};
use tokio::sync::RwLock;
use tracing::debug;

use crate::area::{ManagedArea, SyncArea, select};
use crate::error::{StorageError, StorageResult};

/// Storage area kept entirely in memory.
///
/// Counts every `get` and `set` call and can be told to fail, which makes it
/// the usual stand-in for a browser storage scope in tests.
#[derive(Debug, Default)]
pub struct MemoryArea {
    options: RwLock<OptionMap>,
    unmanaged: bool,
    fail_gets: AtomicBool,
    fail_sets: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl MemoryArea {
    /// Creates an empty area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area pre-populated with `options`.
    #[must_use]
    pub fn with_options(options: OptionMap) -> Self {
        Self {
            options: RwLock::new(options),
            ..Self::default()
        }
    }

    /// Creates an area pre-populated from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Invalid`] when `document` is not an object.
    pub fn from_json(document: Value) -> StorageResult<Self> {
        Ok(Self::with_options(option_map_from_json(document)?))
    }

    /// Creates an area standing in for a platform without administrator policy.
    #[must_use]
    pub fn unmanaged() -> Self {
        Self {
            unmanaged: true,
            ..Self::default()
        }
    }

    /// Makes subsequent `get` calls fail (or succeed again).
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `set` calls fail (or succeed again).
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Number of `get` calls served so far.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls served so far.
    #[must_use]
    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Returns a copy of everything stored.
    pub async fn snapshot(&self) -> OptionMap {
        self.options.read().await.clone()
    }

    async fn read(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.unmanaged {
            return Err(StorageError::ManagedConfigAbsent);
        }
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::backend("memory area get failed"));
        }

        let guard = self.options.read().await;
        Ok(select(&guard, selector))
    }
}

#[async_trait]
impl ManagedArea for MemoryArea {
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.read(selector).await
    }
}

#[async_trait]
impl SyncArea for MemoryArea {
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.read(selector).await
    }

    async fn set(&self, options: &OptionMap) -> StorageResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StorageError::backend("memory area set failed"));
        }

        let mut guard = self.options.write().await;
        guard.extend(options.iter().map(|(name, value)| (name.clone(), value.clone())));
        debug!(count = options.len(), "memory area stored options");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use settings_primitives::SettingValue;

    #[tokio::test]
    async fn stores_and_counts() {
        let area = MemoryArea::from_json(json!({"color": "blue"})).unwrap();

        let mut update = OptionMap::new();
        update.insert("volume".into(), SettingValue::from(json!({"level": 8})));
        SyncArea::set(&area, &update).await.unwrap();

        let all = SyncArea::get(&area, &Selector::All).await.unwrap();
        assert_eq!(all.len(), 2);
        let one = SyncArea::get(&area, &Selector::from("color")).await.unwrap();
        assert_eq!(one.len(), 1);

        assert_eq!(area.get_calls(), 2);
        assert_eq!(area.set_calls(), 1);
    }

    #[tokio::test]
    async fn injected_failures() {
        let area = MemoryArea::new();
        area.fail_gets(true);
        area.fail_sets(true);

        assert!(matches!(
            SyncArea::get(&area, &Selector::All).await,
            Err(StorageError::Backend { .. })
        ));
        assert!(SyncArea::set(&area, &OptionMap::new()).await.is_err());
        assert!(area.snapshot().await.is_empty());

        area.fail_gets(false);
        assert!(SyncArea::get(&area, &Selector::All).await.is_ok());
    }

    #[tokio::test]
    async fn unmanaged_reports_absence() {
        let area = MemoryArea::unmanaged();
        let err = ManagedArea::get(&area, &Selector::All).await.unwrap_err();
        assert!(err.is_managed_absent());
    }
}
