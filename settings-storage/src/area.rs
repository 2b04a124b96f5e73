//! Storage scope traits and the bundle handed to the cache.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use settings_primitives::{OptionMap, Selector};

use crate::error::{StorageError, StorageResult};

/// Read-only scope holding administrator-provided options.
#[async_trait]
pub trait ManagedArea: Send + Sync {
    /// Fetches the options matched by `selector`.
    ///
    /// Implementations return [`StorageError::ManagedConfigAbsent`] when no
    /// administrator policy exists at all.
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap>;
}

/// Read-write scope holding the user's synced options.
#[async_trait]
pub trait SyncArea: Send + Sync {
    /// Fetches the options matched by `selector`.
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap>;

    /// Persists every option in `options`, leaving other stored options as they are.
    async fn set(&self, options: &OptionMap) -> StorageResult<()>;
}

/// The storage scopes available to the cache.
#[derive(Clone)]
pub struct Storage {
    managed: Option<Arc<dyn ManagedArea>>,
    sync: Arc<dyn SyncArea>,
}

impl Storage {
    /// Creates a storage bundle with a sync scope and no managed scope.
    #[must_use]
    pub fn new(sync: Arc<dyn SyncArea>) -> Self {
        Self {
            managed: None,
            sync,
        }
    }

    /// Installs the managed scope.
    #[must_use]
    pub fn with_managed(mut self, managed: Arc<dyn ManagedArea>) -> Self {
        self.managed = Some(managed);
        self
    }

    /// Returns `true` when a managed scope is installed.
    #[must_use]
    pub fn has_managed(&self) -> bool {
        self.managed.is_some()
    }

    /// Returns the sync scope.
    #[must_use]
    pub fn sync(&self) -> &Arc<dyn SyncArea> {
        &self.sync
    }

    /// Fetches from the managed scope.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ManagedConfigAbsent`] when no managed scope is
    /// installed, otherwise whatever the managed scope reports.
    pub async fn fetch_managed(&self, selector: &Selector) -> StorageResult<OptionMap> {
        match &self.managed {
            Some(managed) => managed.get(selector).await,
            None => Err(StorageError::ManagedConfigAbsent),
        }
    }

    /// Fetches from the sync scope.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the sync scope.
    pub async fn fetch_sync(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.sync.get(selector).await
    }

    /// Writes to the sync scope.
    ///
    /// # Errors
    ///
    /// Propagates any error reported by the sync scope.
    pub async fn write_sync(&self, options: &OptionMap) -> StorageResult<()> {
        self.sync.set(options).await
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("managed", &self.managed.is_some())
            .finish_non_exhaustive()
    }
}

/// Copies the entries of `options` matched by `selector`.
#[must_use]
pub fn select(options: &OptionMap, selector: &Selector) -> OptionMap {
    options
        .iter()
        .filter(|(name, _)| selector.matches(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryArea;
    use settings_primitives::SettingValue;

    #[tokio::test]
    async fn missing_managed_scope_reports_absence() {
        let storage = Storage::new(Arc::new(MemoryArea::new()));
        assert!(!storage.has_managed());

        let err = storage.fetch_managed(&Selector::All).await.unwrap_err();
        assert!(err.is_managed_absent());
    }

    #[test]
    fn select_filters_by_name() {
        let mut options = OptionMap::new();
        options.insert("a".into(), SettingValue::from(1_i64));
        options.insert("b".into(), SettingValue::from(2_i64));

        assert_eq!(select(&options, &Selector::All).len(), 2);
        let picked = select(&options, &Selector::from("b"));
        assert_eq!(picked.keys().collect::<Vec<_>>(), vec!["b"]);
    }
}
