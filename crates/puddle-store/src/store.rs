//! Store seam for [`StoredDocument`] records.
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use puddle_core::{PuddleError, Result};

use crate::document::{DocumentFilter, StoredDocument};

/// Keyed record store with filtered scans.
///
/// Each call on a single id must be atomic. Nothing spans multiple records.
pub trait DocumentStore: Send + Sync {
    /// Insert or overwrite the record with `doc.id`.
    fn put(&self, doc: StoredDocument) -> Result<()>;

    /// Overwrite an existing record; `false` if the id is unknown.
    fn replace(&self, doc: StoredDocument) -> Result<bool>;

    fn get(&self, id: &str) -> Result<Option<StoredDocument>>;

    /// `false` if nothing was stored under `id`.
    fn remove(&self, id: &str) -> Result<bool>;

    /// All records matching `filter`, oldest first.
    fn scan(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>>;
}

/// Process-local store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredDocument>>> {
        self.records
            .read()
            .map_err(|_| PuddleError::Store("document store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredDocument>>> {
        self.records
            .write()
            .map_err(|_| PuddleError::Store("document store lock poisoned".to_string()))
    }
}

impl DocumentStore for MemoryStore {
    fn put(&self, doc: StoredDocument) -> Result<()> {
        self.write()?.insert(doc.id.clone(), doc);
        Ok(())
    }

    fn replace(&self, doc: StoredDocument) -> Result<bool> {
        let mut records = self.write()?;
        match records.get_mut(&doc.id) {
            Some(slot) => {
                *slot = doc;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.write()?.remove(id).is_some())
    }

    fn scan(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>> {
        let mut docs: Vec<StoredDocument> = self
            .read()?
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        sort_by_saved(&mut docs);
        Ok(docs)
    }
}

pub(crate) fn sort_by_saved(docs: &mut [StoredDocument]) {
    docs.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.id.cmp(&b.id)));
}
