//! One JSON file per document under a data directory.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use puddle_core::{PuddleError, Result};
use serde_json::Value;
use spml::LegacyDocument;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::document::{DocumentFilter, StoredDocument};
use crate::store::{sort_by_saved, DocumentStore};

const EXTENSION: &str = "json";

/// Directory-backed [`DocumentStore`].
///
/// Writes go to a uniquely named temporary file that is renamed over the
/// record, so a reader sees either the old or the new version of a document.
/// Mutations hold the store's write lock from the existence check through the
/// rename; a removed record cannot be brought back by a racing replace.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| PuddleError::Store("file store lock poisoned".to_string()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for `id`, or `None` if the id cannot name a file safely.
    fn record_path(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.root.join(format!("{}.{}", id, EXTENSION)))
    }

    fn write_record(&self, path: &Path, doc: &StoredDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| PuddleError::Store(format!("encode {}: {}", doc.id, e)))?;
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| io_error(&self.root, e))?;
        tmp.write_all(&bytes).map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| io_error(path, e.error))?;
        Ok(())
    }

    fn read_record(path: &Path) -> Result<Option<StoredDocument>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        decode_record(&bytes)
            .map(Some)
            .map_err(|e| PuddleError::Store(format!("decode {}: {}", path.display(), e)))
    }
}

/// Decode a record, tolerating an unreadable embedded SPML model.
fn decode_record(bytes: &[u8]) -> serde_json::Result<StoredDocument> {
    let mut value: Value = serde_json::from_slice(bytes)?;
    let legacy = value
        .as_object_mut()
        .and_then(|fields| fields.remove("legacy_document"));

    let mut doc: StoredDocument = serde_json::from_value(value)?;
    doc.legacy_document = match legacy.map(serde_json::from_value::<Option<LegacyDocument>>) {
        Some(Ok(legacy)) => legacy,
        Some(Err(e)) => {
            warn!(id = %doc.id, error = %e, "stored SPML model is unreadable");
            None
        }
        None => None,
    };
    Ok(doc)
}

fn io_error(path: &Path, err: io::Error) -> PuddleError {
    PuddleError::Store(format!("{}: {}", path.display(), err))
}

impl DocumentStore for FileStore {
    fn put(&self, doc: StoredDocument) -> Result<()> {
        let path = self
            .record_path(&doc.id)
            .ok_or_else(|| PuddleError::InvalidArgument(format!("unusable document id {:?}", doc.id)))?;
        let _guard = self.lock()?;
        self.write_record(&path, &doc)
    }

    fn replace(&self, doc: StoredDocument) -> Result<bool> {
        let Some(path) = self.record_path(&doc.id) else {
            return Ok(false);
        };
        let _guard = self.lock()?;
        if !path.exists() {
            return Ok(false);
        }
        self.write_record(&path, &doc)?;
        Ok(true)
    }

    fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        match self.record_path(id) {
            Some(path) => Self::read_record(&path),
            None => Ok(None),
        }
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let Some(path) = self.record_path(id) else {
            return Ok(false);
        };
        let _guard = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn scan(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>> {
        let mut docs = Vec::new();
        let dir = fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))?;
        for item in dir {
            let path = item.map_err(|e| io_error(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match Self::read_record(&path) {
                Ok(Some(doc)) if filter.matches(&doc) => docs.push(doc),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
            }
        }
        sort_by_saved(&mut docs);
        Ok(docs)
    }
}
