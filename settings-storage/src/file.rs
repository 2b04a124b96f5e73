//! Storage area persisted as a JSON document on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use settings_primitives::{OptionMap, Selector, option_map_from_json, option_map_to_json};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::area::{ManagedArea, SyncArea, select};
use crate::error::{StorageError, StorageResult};

/// Which scope a [`FileArea`] stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    /// Administrator policy. A missing file means no policy is configured.
    Managed,
    /// User settings. A missing file means nothing has been stored yet.
    Sync,
}

/// File-backed area storing all options as one JSON object.
#[derive(Debug)]
pub struct FileArea {
    path: PathBuf,
    role: FileRole,
    write_lock: Mutex<()>,
}

impl FileArea {
    /// Opens a managed area backed by `path`.
    #[must_use]
    pub fn managed(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileRole::Managed)
    }

    /// Opens a sync area backed by `path`.
    #[must_use]
    pub fn sync(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileRole::Sync)
    }

    fn new(path: impl Into<PathBuf>, role: FileRole) -> Self {
        Self {
            path: path.into(),
            role,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the underlying path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the role this area was opened with.
    #[must_use]
    pub const fn role(&self) -> FileRole {
        self.role
    }

    async fn load(&self) -> StorageResult<Option<OptionMap>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(OptionMap::new()));
        }

        let document: serde_json::Value = serde_json::from_slice(&data)?;
        Ok(Some(option_map_from_json(document)?))
    }

    async fn read(&self, selector: &Selector) -> StorageResult<OptionMap> {
        match self.load().await? {
            Some(options) => Ok(select(&options, selector)),
            None if self.role == FileRole::Managed => Err(StorageError::ManagedConfigAbsent),
            None => Ok(OptionMap::new()),
        }
    }
}

#[async_trait]
impl ManagedArea for FileArea {
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.read(selector).await
    }
}

#[async_trait]
impl SyncArea for FileArea {
    async fn get(&self, selector: &Selector) -> StorageResult<OptionMap> {
        self.read(selector).await
    }

    async fn set(&self, options: &OptionMap) -> StorageResult<()> {
        if self.role == FileRole::Managed {
            return Err(StorageError::backend("managed storage is read-only"));
        }

        let _guard = self.write_lock.lock().await;
        let mut stored = self.load().await?.unwrap_or_default();
        stored.extend(options.iter().map(|(name, value)| (name.clone(), value.clone())));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_vec_pretty(&option_map_to_json(&stored))?;
        fs::write(&self.path, data).await?;

        debug!(path = %self.path.display(), count = options.len(), "file area stored options");
        Ok(())
    }
}
