//! Durable recovery state: the sealed seed and the last issued pool index.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TeeError, TeeResult};
use crate::sealing::SealedSeed;

/// Persists what a restarted manager needs to resume without reusing a
/// pool index.
///
/// Stores keep the highest index ever stored, so a late or replayed write
/// can never move the counter backwards.
pub trait RecoveryStore: Send + Sync {
    fn load_sealed_seed(&self) -> TeeResult<Option<SealedSeed>>;

    fn store_sealed_seed(&self, sealed: &SealedSeed) -> TeeResult<()>;

    fn load_last_pool_index(&self) -> TeeResult<Option<u32>>;

    fn store_last_pool_index(&self, index: u32) -> TeeResult<()>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecoveryState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sealed_seed: Option<SealedSeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_pool_index: Option<u32>,
}

impl RecoveryState {
    fn record_index(&mut self, index: u32) -> bool {
        match self.last_pool_index {
            Some(last) if last >= index => false,
            _ => {
                self.last_pool_index = Some(index);
                true
            }
        }
    }
}

/// In-memory store for tests and single-process simulations
#[derive(Debug, Default)]
pub struct MemoryRecoveryStore {
    state: Mutex<RecoveryState>,
}

impl MemoryRecoveryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for MemoryRecoveryStore {
    fn load_sealed_seed(&self) -> TeeResult<Option<SealedSeed>> {
        Ok(self.state.lock().sealed_seed.clone())
    }

    fn store_sealed_seed(&self, sealed: &SealedSeed) -> TeeResult<()> {
        self.state.lock().sealed_seed = Some(sealed.clone());
        Ok(())
    }

    fn load_last_pool_index(&self) -> TeeResult<Option<u32>> {
        Ok(self.state.lock().last_pool_index)
    }

    fn store_last_pool_index(&self, index: u32) -> TeeResult<()> {
        self.state.lock().record_index(index);
        Ok(())
    }
}

/// JSON file store.
///
/// Every write goes to a sibling temporary file which is then renamed over
/// the target, so a crash leaves either the old or the new document.
#[derive(Debug)]
pub struct FileRecoveryStore {
    path: PathBuf,
    state: Mutex<RecoveryState>,
}

impl FileRecoveryStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> TeeResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = fs::read(&path)?;
            serde_json::from_slice(&content)
                .map_err(|e| TeeError::Store(format!("corrupt recovery file: {e}")))?
        } else {
            RecoveryState::default()
        };
        debug!(target: "neo::tee", path = %path.display(), "recovery store opened");

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, state: &RecoveryState) -> TeeResult<()> {
        let content = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecoveryStore for FileRecoveryStore {
    fn load_sealed_seed(&self) -> TeeResult<Option<SealedSeed>> {
        Ok(self.state.lock().sealed_seed.clone())
    }

    fn store_sealed_seed(&self, sealed: &SealedSeed) -> TeeResult<()> {
        let mut state = self.state.lock();
        state.sealed_seed = Some(sealed.clone());
        self.persist(&state)
    }

    fn load_last_pool_index(&self) -> TeeResult<Option<u32>> {
        Ok(self.state.lock().last_pool_index)
    }

    fn store_last_pool_index(&self, index: u32) -> TeeResult<()> {
        let mut state = self.state.lock();
        if state.record_index(index) {
            self.persist(&state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sealing::{PassthroughSealer, SeedSealer};

    #[test]
    fn test_memory_store_keeps_highest_index() {
        let store = MemoryRecoveryStore::new();
        assert_eq!(store.load_last_pool_index().unwrap(), None);

        store.store_last_pool_index(5).unwrap();
        store.store_last_pool_index(3).unwrap();
        assert_eq!(store.load_last_pool_index().unwrap(), Some(5));

        store.store_last_pool_index(9).unwrap();
        assert_eq!(store.load_last_pool_index().unwrap(), Some(9));
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        let sealed = PassthroughSealer.seal(&[1u8; 32]).unwrap();

        {
            let store = FileRecoveryStore::open(&path).unwrap();
            assert!(store.load_sealed_seed().unwrap().is_none());
            store.store_sealed_seed(&sealed).unwrap();
            store.store_last_pool_index(12).unwrap();
            store.store_last_pool_index(4).unwrap();
        }

        let reopened = FileRecoveryStore::open(&path).unwrap();
        assert_eq!(reopened.load_sealed_seed().unwrap(), Some(sealed));
        assert_eq!(reopened.load_last_pool_index().unwrap(), Some(12));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(
            FileRecoveryStore::open(&path),
            Err(TeeError::Store(_))
        ));
    }
}
