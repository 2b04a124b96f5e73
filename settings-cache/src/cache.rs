//! The settings cache itself.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use settings_defaults::DefaultsTable;
use settings_primitives::{OptionMap, Selector, SettingValue};
use settings_storage::Storage;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::error::{SettingsError, SettingsResult};
use crate::load::{LoadHandle, PendingLoad};
use crate::state::{CacheState, SharedState, lock};
use crate::update::SettingsUpdate;

/// Lifecycle of the cache contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No load has been issued yet, or the cache was cleared after the
    /// latest load settled.
    Uninitialized,
    /// The latest load still has a fetch in flight.
    Loading,
    /// Both fetches of the latest load have finished.
    Ready,
}

/// Builder for [`SettingsCache`] instances.
#[derive(Debug)]
pub struct SettingsCacheBuilder {
    defaults: Arc<DefaultsTable>,
    storage: Option<Storage>,
    config: CacheConfig,
}

impl SettingsCacheBuilder {
    /// Starts a new builder around the defaults table.
    #[must_use]
    pub fn new(defaults: Arc<DefaultsTable>) -> Self {
        Self {
            defaults,
            storage: None,
            config: CacheConfig::default(),
        }
    }

    /// Installs the storage scopes. Without storage every access fails with
    /// [`SettingsError::StorageUnavailable`].
    #[must_use]
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Overrides the runtime configuration.
    #[must_use]
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the cache without fetching anything.
    #[must_use]
    pub fn build(self) -> SettingsCache {
        SettingsCache {
            inner: Arc::new(Inner {
                defaults: self.defaults,
                storage: self.storage,
                state: Arc::new(Mutex::new(CacheState::new(self.config.caching_enabled))),
            }),
            config: self.config,
        }
    }

    /// Builds the cache and, when [`CacheConfig::preload`] is set, issues the
    /// initial load.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::StorageUnavailable`] when preloading without storage.
    ///
    /// # Panics
    ///
    /// Panics when preloading outside a Tokio runtime.
    pub fn start(self) -> SettingsResult<SettingsCache> {
        let cache = self.build();
        if cache.config.preload {
            let handle = cache.load_options(Selector::All)?;
            tokio::spawn(async move {
                if handle.wait().await.is_ok() {
                    info!("settings cache loaded");
                }
            });
        }
        Ok(cache)
    }
}

#[derive(Debug)]
struct Inner {
    defaults: Arc<DefaultsTable>,
    storage: Option<Storage>,
    state: SharedState,
}

/// Caching accessor merging managed, synced, and default settings.
///
/// Construct one per process and pass clones to every consumer; clones share
/// the same snapshots.
#[derive(Debug, Clone)]
pub struct SettingsCache {
    inner: Arc<Inner>,
    config: CacheConfig,
}

impl SettingsCache {
    /// Creates a builder for a settings cache.
    #[must_use]
    pub fn builder(defaults: Arc<DefaultsTable>) -> SettingsCacheBuilder {
        SettingsCacheBuilder::new(defaults)
    }

    /// Returns the defaults table backing this cache.
    #[must_use]
    pub fn defaults(&self) -> &Arc<DefaultsTable> {
        &self.inner.defaults
    }

    /// Returns the configuration the cache was built with.
    #[must_use]
    pub const fn config(&self) -> CacheConfig {
        self.config
    }

    /// Returns `true` while reads are served from the cache.
    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        lock(&self.inner.state).caching_enabled
    }

    /// Reports where the latest load stands.
    ///
    /// A cache whose snapshots were cleared after its last load settled is
    /// reported as uninitialized again.
    #[must_use]
    pub fn status(&self) -> CacheStatus {
        let state = lock(&self.inner.state);
        match &state.pending {
            None => CacheStatus::Uninitialized,
            Some(pending) if !pending.is_settled() => CacheStatus::Loading,
            Some(_) if state.is_empty() => CacheStatus::Uninitialized,
            Some(_) => CacheStatus::Ready,
        }
    }

    /// Clears both snapshots and refetches the options matched by `selector`.
    ///
    /// The fetches run in the background; the returned handle can be awaited
    /// for best-effort completion.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::StorageUnavailable`] before issuing anything
    /// when no storage is installed.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, or if the internal state
    /// mutex was poisoned.
    pub fn load_options(&self, selector: impl Into<Selector>) -> SettingsResult<LoadHandle> {
        let storage = self.storage()?;
        let selector = selector.into();

        let mut state = lock(&self.inner.state);
        state.clear();
        let id = state.next_load_id();
        let pending = PendingLoad::issue(id, storage, &self.inner.state, &selector);
        state.pending = Some(pending.clone());
        Ok(LoadHandle::new(pending))
    }

    /// Resets both snapshots. In-flight fetches are not cancelled and will
    /// still populate the cache when they finish.
    pub fn clear_cache(&self) {
        lock(&self.inner.state).clear();
        debug!("settings cache cleared");
    }

    /// Turns caching on or off.
    ///
    /// Enabling refreshes the cache immediately; disabling clears it so the
    /// next read goes to storage.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::StorageUnavailable`] when enabling without storage.
    ///
    /// # Panics
    ///
    /// Panics when enabling outside a Tokio runtime.
    pub fn set_caching(&self, enabled: bool) -> SettingsResult<()> {
        if enabled {
            self.load_options(Selector::All)?;
        } else {
            self.clear_cache();
        }
        lock(&self.inner.state).caching_enabled = enabled;
        debug!(enabled, "settings caching toggled");
        Ok(())
    }

    /// Turns caching on or off from an untyped option value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidArgument`] unless `value` is a boolean,
    /// otherwise behaves like [`set_caching`](Self::set_caching).
    ///
    /// # Panics
    ///
    /// Panics when enabling outside a Tokio runtime.
    pub fn set_caching_value(&self, value: &SettingValue) -> SettingsResult<()> {
        let Some(enabled) = value.as_bool() else {
            return Err(SettingsError::invalid_argument(format!(
                "caching flag must be a boolean, \"{}\" given",
                value.to_json()
            )));
        };
        self.set_caching(enabled)
    }

    /// Resolves a single option.
    ///
    /// Managed values win, then synced values, then the default. Mapping
    /// values are laid over the default mapping so unset sub-keys keep their
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownOption`] when nothing (not even a
    /// default) exists for `option`, [`SettingsError::SyncFetch`] when the
    /// value had to come from synced options that could not be loaded, and
    /// [`SettingsError::StorageUnavailable`] without storage.
    pub async fn get(&self, option: &str) -> SettingsResult<SettingValue> {
        if option.is_empty() {
            return Err(SettingsError::invalid_argument(
                "option name cannot be empty, use get_all for every option",
            ));
        }

        let pending = self.prepare_read(Selector::from(option))?;
        let pending = self.settle_latest_managed(pending).await;

        let managed = lock(&self.inner.state)
            .managed
            .as_ref()
            .and_then(|options| options.get(option).cloned());
        if let Some(value) = managed {
            info!(option, value = %value.to_json(), "managed setting got");
            return Ok(self.with_default_keys(option, value));
        }

        let synced = self
            .read_synced(pending, false, |state| {
                state
                    .sync
                    .as_ref()
                    .and_then(|options| options.get(option).cloned())
            })
            .await?;
        if let Some(value) = synced {
            info!(option, value = %value.to_json(), "synced setting got");
            return Ok(self.with_default_keys(option, value));
        }

        let value = self.inner.defaults.default_value(option)?;
        warn!(option, value = %value.to_json(), "could not get option, using default");
        Ok(value)
    }

    /// Resolves a single option and deserializes it into `T`.
    ///
    /// # Errors
    ///
    /// Everything [`get`](Self::get) returns, plus [`SettingsError::Decode`]
    /// when the value does not fit `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, option: &str) -> SettingsResult<T> {
        let value = self.get(option).await?;
        serde_json::from_value(value.into_json()).map_err(|source| SettingsError::Decode {
            option: option.to_owned(),
            source: Arc::new(source),
        })
    }

    /// Returns every option: defaults overlaid by synced values overlaid by
    /// managed values.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SyncFetch`] when synced options could not be
    /// loaded and [`SettingsError::StorageUnavailable`] without storage.
    pub async fn get_all(&self) -> SettingsResult<OptionMap> {
        let pending = self.prepare_read(Selector::All)?;
        let (sync, managed) = self
            .read_synced(pending, true, |state| (state.sync.clone(), state.managed.clone()))
            .await?;

        let mut result = self.inner.defaults.all();
        result.extend(sync.unwrap_or_default());
        result.extend(managed.unwrap_or_default());
        Ok(result)
    }

    /// Persists options to the sync scope, then records them in the cache.
    ///
    /// Accepts a single `(name, value)` pair or a whole [`OptionMap`].
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidArgument`] for a missing value or blank
    /// option name, and [`SettingsError::Write`] when storage rejects the write;
    /// the cache is left untouched in that case.
    pub async fn set(&self, update: impl Into<SettingsUpdate>) -> SettingsResult<()> {
        let options = update.into().into_options()?;
        let storage = self.storage()?;

        if let Err(err) = storage.write_sync(&options).await {
            error!(
                error = %err,
                options = ?options.keys().collect::<Vec<_>>(),
                "could not save options"
            );
            return Err(SettingsError::Write {
                source: Arc::new(err),
            });
        }

        lock(&self.inner.state).apply_write(&options);
        debug!(count = options.len(), "options saved");
        Ok(())
    }

    /// Returns a copy of the default for `option`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownOption`] when no default exists.
    pub fn get_default_value(&self, option: &str) -> SettingsResult<SettingValue> {
        Ok(self.inner.defaults.default_value(option)?)
    }

    /// Returns a copy of every default.
    #[must_use]
    pub fn default_values(&self) -> OptionMap {
        self.inner.defaults.all()
    }

    fn storage(&self) -> SettingsResult<&Storage> {
        self.inner.storage.as_ref().ok_or_else(|| {
            error!("storage API is not available");
            SettingsError::StorageUnavailable
        })
    }

    /// Picks the load a read should wait on: a fresh one when caching is
    /// off, the latest one otherwise, issuing the first load lazily.
    fn prepare_read(&self, selector: Selector) -> SettingsResult<PendingLoad> {
        let (caching_enabled, current) = {
            let state = lock(&self.inner.state);
            (state.caching_enabled, state.pending.clone())
        };

        if !caching_enabled {
            return Ok(self.load_options(selector)?.into_pending());
        }
        match current {
            Some(pending) => Ok(pending),
            None => Ok(self.load_options(Selector::All)?.into_pending()),
        }
    }

    /// Waits for the managed fetch of `pending`, following any load issued
    /// in the meantime, and returns the load that is current afterwards.
    async fn settle_latest_managed(&self, mut pending: PendingLoad) -> PendingLoad {
        loop {
            pending.managed_settled().await;
            let current = lock(&self.inner.state).superseding(pending.id()).cloned();
            match current {
                Some(current) => pending = current,
                None => return pending,
            }
        }
    }

    /// Waits for the sync fetch of the current load, then applies `read` to
    /// the state in the same critical section that confirmed no newer load
    /// cleared the snapshots meanwhile. With `with_managed` the managed
    /// fetch of that load is awaited too.
    ///
    /// A failed sync fetch is fatal unless a `set` already created a sync
    /// snapshot to read from.
    async fn read_synced<T>(
        &self,
        mut pending: PendingLoad,
        with_managed: bool,
        read: impl Fn(&CacheState) -> T,
    ) -> SettingsResult<T> {
        loop {
            if with_managed {
                pending.managed_settled().await;
            }
            let outcome = pending.sync_settled().await;

            let current = {
                let state = lock(&self.inner.state);
                let Some(current) = state.superseding(pending.id()) else {
                    return match outcome {
                        Ok(()) => Ok(read(&state)),
                        Err(err) if state.sync.is_some() => {
                            debug!(error = %err, "sync fetch failed, reading options saved since");
                            Ok(read(&state))
                        }
                        Err(err) => Err(err),
                    };
                };
                current.clone()
            };
            debug!(from = pending.id(), to = current.id(), "load superseded while reading");
            pending = current;
        }
    }

    fn with_default_keys(&self, option: &str, value: SettingValue) -> SettingValue {
        if !value.is_mapping() || !self.inner.defaults.contains(option) {
            return value;
        }
        match self.inner.defaults.default_value(option) {
            Ok(base) => value.merged_over(&base),
            Err(_) => value,
        }
    }
}
