//! Fetch orchestration for one load cycle.
//!
//! Each cycle spawns two independent tasks, one per storage scope. Their
//! outcomes are kept as shared futures so any number of readers can wait on
//! the same fetch without re-issuing it.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use settings_primitives::Selector;
use settings_storage::{Storage, StorageError};
use tracing::{debug, error, warn};

use crate::error::{SettingsError, SettingsResult};
use crate::state::{SharedState, lock};

type FetchOutcome = SettingsResult<()>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

/// Join points of the managed and sync fetches of one load cycle.
#[derive(Clone)]
pub(crate) struct PendingLoad {
    id: u64,
    managed: SharedFetch,
    sync: SharedFetch,
}

impl std::fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoad")
            .field("id", &self.id)
            .field("managed_settled", &self.managed.peek().is_some())
            .field("sync_settled", &self.sync.peek().is_some())
            .finish()
    }
}

impl PendingLoad {
    /// Spawns both fetches for `selector`.
    ///
    /// The caller clears the snapshots first; the tasks start immediately
    /// and always run to completion.
    pub(crate) fn issue(
        id: u64,
        storage: &Storage,
        state: &SharedState,
        selector: &Selector,
    ) -> Self {
        debug!(id, %selector, "issuing managed and sync fetches");
        Self {
            id,
            managed: spawn_fetch(
                fetch_managed(storage.clone(), Arc::clone(state), selector.clone()),
                |source| SettingsError::ManagedFetch { source },
            ),
            sync: spawn_fetch(
                fetch_sync(storage.clone(), Arc::clone(state), selector.clone()),
                |source| SettingsError::SyncFetch { source },
            ),
        }
    }

    /// Sequence number of the load cycle that issued these fetches.
    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the managed fetch, absorbing any failure. Failures were
    /// logged where they happened and readers fall back to other scopes.
    pub(crate) async fn managed_settled(&self) {
        if let Err(err) = self.managed.clone().await {
            debug!(error = %err, "managed options unavailable, falling back");
        }
    }

    /// Waits for the sync fetch and returns its outcome.
    pub(crate) async fn sync_settled(&self) -> FetchOutcome {
        self.sync.clone().await
    }

    /// Returns `true` once both fetches have finished.
    pub(crate) fn is_settled(&self) -> bool {
        self.managed.peek().is_some() && self.sync.peek().is_some()
    }
}

/// Handle to a load cycle issued by
/// [`SettingsCache::load_options`](crate::SettingsCache::load_options).
///
/// Dropping the handle does not cancel anything; the fetches keep running
/// and still populate the cache.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    pending: PendingLoad,
}

impl LoadHandle {
    pub(crate) fn new(pending: PendingLoad) -> Self {
        Self { pending }
    }

    pub(crate) fn into_pending(self) -> PendingLoad {
        self.pending
    }

    /// Resolves once the managed fetch settles. If the managed fetch failed,
    /// waits for the sync fetch instead and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SyncFetch`] when the managed fetch failed and
    /// the sync fetch failed as well.
    pub async fn wait(self) -> SettingsResult<()> {
        match self.pending.managed.clone().await {
            Ok(()) => Ok(()),
            Err(_) => self.pending.sync_settled().await,
        }
    }

    /// Resolves once the sync fetch settles.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SyncFetch`] when the sync scope could not be read.
    pub async fn wait_synced(self) -> SettingsResult<()> {
        self.pending.sync_settled().await
    }

    /// Returns `true` once both fetches have finished.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_settled()
    }
}

fn spawn_fetch<F>(fetch: F, interrupted: fn(Arc<StorageError>) -> SettingsError) -> SharedFetch
where
    F: Future<Output = FetchOutcome> + Send + 'static,
{
    tokio::spawn(fetch)
        .map(move |joined| {
            joined.unwrap_or_else(|err| {
                error!(error = %err, "option fetch task did not complete");
                Err(interrupted(Arc::new(StorageError::backend(format!(
                    "fetch task did not complete: {err}"
                )))))
            })
        })
        .boxed()
        .shared()
}

async fn fetch_managed(storage: Storage, state: SharedState, selector: Selector) -> FetchOutcome {
    match storage.fetch_managed(&selector).await {
        Ok(options) => {
            debug!(count = options.len(), "managed options fetched");
            lock(&state).apply_managed(options);
            Ok(())
        }
        Err(err) if err.is_managed_absent() => {
            warn!(error = %err, "could not get managed options");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, %selector, "could not get managed options");
            Err(SettingsError::ManagedFetch {
                source: Arc::new(err),
            })
        }
    }
}

async fn fetch_sync(storage: Storage, state: SharedState, selector: Selector) -> FetchOutcome {
    match storage.fetch_sync(&selector).await {
        Ok(options) => {
            debug!(count = options.len(), "sync options fetched");
            lock(&state).apply_sync_fetch(options);
            Ok(())
        }
        Err(err) => {
            error!(error = %err, %selector, "could not get sync options");
            Err(SettingsError::SyncFetch {
                source: Arc::new(err),
            })
        }
    }
}
