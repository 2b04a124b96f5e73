//! Snapshot state shared between the cache and its in-flight fetches.

use std::sync::{Arc, Mutex, MutexGuard};

use settings_primitives::OptionMap;

use crate::load::PendingLoad;

pub(crate) type SharedState = Arc<Mutex<CacheState>>;

/// Cached snapshots plus the join points of the latest load.
///
/// A snapshot is either `None` or a complete map; fetches replace or merge
/// it in a single critical section, so readers never see a partial result.
#[derive(Debug)]
pub(crate) struct CacheState {
    pub(crate) caching_enabled: bool,
    pub(crate) managed: Option<OptionMap>,
    pub(crate) sync: Option<OptionMap>,
    pub(crate) pending: Option<PendingLoad>,
    last_load: u64,
}

impl CacheState {
    pub(crate) fn new(caching_enabled: bool) -> Self {
        Self {
            caching_enabled,
            managed: None,
            sync: None,
            pending: None,
            last_load: 0,
        }
    }

    pub(crate) fn next_load_id(&mut self) -> u64 {
        self.last_load += 1;
        self.last_load
    }

    /// Returns the current load when it differs from the one with `id`.
    pub(crate) fn superseding(&self, id: u64) -> Option<&PendingLoad> {
        self.pending.as_ref().filter(|pending| pending.id() != id)
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.managed.is_none() && self.sync.is_none()
    }

    pub(crate) fn clear(&mut self) {
        self.managed = None;
        self.sync = None;
    }

    pub(crate) fn apply_managed(&mut self, fetched: OptionMap) {
        self.managed = Some(fetched);
    }

    /// Stores a finished sync fetch. Values already cached (written by a
    /// `set` that landed first) win over the fetched ones.
    pub(crate) fn apply_sync_fetch(&mut self, fetched: OptionMap) {
        self.sync = Some(match self.sync.take() {
            None => fetched,
            Some(cached) => {
                let mut merged = fetched;
                merged.extend(cached);
                merged
            }
        });
    }

    /// Records a successful write-through.
    pub(crate) fn apply_write(&mut self, written: &OptionMap) {
        self.sync
            .get_or_insert_with(OptionMap::new)
            .extend(written.iter().map(|(name, value)| (name.clone(), value.clone())));
    }
}

/// Locks the shared state.
///
/// # Panics
///
/// Panics if the state mutex was poisoned by a panic while it was held.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, CacheState> {
    state.lock().expect("settings cache state poisoned")
}
