//! Snapshot persistence backends.

use crate::error::QueueResult;
use crate::snapshot::QueueSnapshot;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where queue snapshots are persisted.
///
/// Implementations must make `save` all-or-nothing: after a crash, `load`
/// returns either the previous snapshot or the new one, never a torn write.
pub trait QueueStore: Send + Sync {
    /// Loads the last saved snapshot, or `None` if nothing was ever saved.
    fn load(&self) -> QueueResult<Option<QueueSnapshot>>;

    /// Durably saves a snapshot, replacing any previous one.
    fn save(&self, snapshot: &QueueSnapshot) -> QueueResult<()>;
}

/// A file-backed snapshot store.
///
/// Snapshots are written to a temporary sibling file, synced, then renamed
/// over the target path. Data survives process restarts.
#[derive(Debug)]
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    /// Creates a store persisting to the given path.
    ///
    /// Parent directories are created if needed. The file itself is created
    /// on the first `save`.
    pub fn open(path: impl Into<PathBuf>) -> QueueResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl QueueStore for FileQueueStore {
    fn load(&self) -> QueueResult<Option<QueueSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut bytes = Vec::new();
        File::open(&self.path)?.read_to_end(&mut bytes)?;
        Ok(Some(QueueSnapshot::decode(&bytes)?))
    }

    fn save(&self, snapshot: &QueueSnapshot) -> QueueResult<()> {
        let bytes = snapshot.encode()?;
        let tmp = self.tmp_path();

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// An in-memory snapshot store.
///
/// Stores the serialized bytes, so a "restart" can be simulated by opening
/// a second queue over a clone of the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueueStore {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryQueueStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> QueueResult<Option<QueueSnapshot>> {
        match self.bytes.lock().as_deref() {
            Some(bytes) => Ok(Some(QueueSnapshot::decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &QueueSnapshot) -> QueueResult<()> {
        *self.bytes.lock() = Some(snapshot.encode()?);
        Ok(())
    }
}
