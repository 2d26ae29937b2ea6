//! Named-slot blob store
//!
//! Saves are opaque byte blobs addressed by (slot name, user index). The
//! sled-backed store is used by the binary; the in-memory one by tests and
//! embedders that bring their own storage.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;

/// Address of one save
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SaveSlot {
    pub name: String,
    pub user_index: u32,
}

impl SaveSlot {
    pub fn new(name: impl Into<String>, user_index: u32) -> Self {
        Self {
            name: name.into(),
            user_index,
        }
    }

    /// Key under which the slot is stored
    pub fn storage_key(&self) -> String {
        format!("{}:{}", self.name, self.user_index)
    }
}

impl fmt::Display for SaveSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (user {})", self.name, self.user_index)
    }
}

/// Blob storage for save slots
pub trait SaveStore: Send + Sync {
    fn exists(&self, slot: &SaveSlot) -> Result<bool>;

    fn load(&self, slot: &SaveSlot) -> Result<Option<Vec<u8>>>;

    fn save(&self, slot: &SaveSlot, bytes: &[u8]) -> Result<()>;
}

/// Store backed by a sled database
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        debug!("Opened save store at {}", path.as_ref().display());
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }
}

impl SaveStore for SledStore {
    fn exists(&self, slot: &SaveSlot) -> Result<bool> {
        Ok(self.db.contains_key(slot.storage_key().as_bytes())?)
    }

    fn load(&self, slot: &SaveSlot) -> Result<Option<Vec<u8>>> {
        let value = self.db.get(slot.storage_key().as_bytes())?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn save(&self, slot: &SaveSlot, bytes: &[u8]) -> Result<()> {
        self.db.insert(slot.storage_key().as_bytes(), bytes)?;
        self.db.flush()?;
        debug!("Saved {} bytes to slot {}", bytes.len(), slot);
        Ok(())
    }
}

/// Volatile store
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn exists(&self, slot: &SaveSlot) -> Result<bool> {
        Ok(self.slots.read().contains_key(&slot.storage_key()))
    }

    fn load(&self, slot: &SaveSlot) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.read().get(&slot.storage_key()).cloned())
    }

    fn save(&self, slot: &SaveSlot, bytes: &[u8]) -> Result<()> {
        self.slots
            .write()
            .insert(slot.storage_key(), bytes.to_vec());
        Ok(())
    }
}

impl<T: SaveStore + ?Sized> SaveStore for std::sync::Arc<T> {
    fn exists(&self, slot: &SaveSlot) -> Result<bool> {
        (**self).exists(slot)
    }

    fn load(&self, slot: &SaveSlot) -> Result<Option<Vec<u8>>> {
        (**self).load(slot)
    }

    fn save(&self, slot: &SaveSlot, bytes: &[u8]) -> Result<()> {
        (**self).save(slot, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        let slot = SaveSlot::new("input_mapping", 0);

        assert!(!store.exists(&slot).unwrap());
        assert!(store.load(&slot).unwrap().is_none());

        store.save(&slot, b"abc").unwrap();
        assert!(store.exists(&slot).unwrap());
        assert_eq!(store.load(&slot).unwrap().unwrap(), b"abc");
        assert!(!store.exists(&SaveSlot::new("input_mapping", 1)).unwrap());
    }

    #[test]
    fn test_sled_store_persists_across_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("saves.sled");
        let slot = SaveSlot::new("input_mapping", 2);

        {
            let store = SledStore::open(&path).unwrap();
            store.save(&slot, b"{\"version\":1}").unwrap();
        }

        let store = SledStore::open(&path).unwrap();
        assert!(store.exists(&slot).unwrap());
        assert_eq!(store.load(&slot).unwrap().unwrap(), b"{\"version\":1}");
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(SaveSlot::new("input_mapping", 3).storage_key(), "input_mapping:3");
    }
}
