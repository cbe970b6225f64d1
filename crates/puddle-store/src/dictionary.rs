//! Import SPML uploads into dictionary and sign records.
//!
//! The first upload for a `(type, puddle)` pair creates the dictionary through
//! the strict mapper. Later uploads for the same pair are merged into the
//! signs already stored.
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use puddle_core::{mapper, reconcile, Dictionary, PuddleError, Result, Sign};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Store seam for dictionaries and their signs.
pub trait SignStore: Send + Sync {
    fn find_dictionary(&self, puddle_type: Option<&str>, puddle_id: i64) -> Result<Option<Dictionary>>;
    fn get_dictionary(&self, id: &str) -> Result<Option<Dictionary>>;
    fn list_dictionaries(&self) -> Result<Vec<Dictionary>>;
    fn put_dictionary(&self, dictionary: Dictionary) -> Result<()>;
    /// Signs of a dictionary ordered by `puddle_sign_id`.
    fn signs_for(&self, dictionary_id: &str) -> Result<Vec<Sign>>;
    /// Insert or overwrite one sign by id.
    fn put_sign(&self, sign: Sign) -> Result<()>;
}

#[derive(Debug, Default)]
struct SignTables {
    dictionaries: HashMap<String, Dictionary>,
    signs: HashMap<String, Sign>,
}

/// Process-local [`SignStore`].
#[derive(Debug, Default)]
pub struct MemorySignStore {
    tables: RwLock<SignTables>,
}

impl MemorySignStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SignTables>> {
        self.tables
            .read()
            .map_err(|_| PuddleError::Store("sign store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SignTables>> {
        self.tables
            .write()
            .map_err(|_| PuddleError::Store("sign store lock poisoned".to_string()))
    }
}

impl SignStore for MemorySignStore {
    fn find_dictionary(&self, puddle_type: Option<&str>, puddle_id: i64) -> Result<Option<Dictionary>> {
        Ok(self
            .read()?
            .dictionaries
            .values()
            .find(|d| d.puddle_type.as_deref() == puddle_type && d.puddle_id == Some(puddle_id))
            .cloned())
    }

    fn get_dictionary(&self, id: &str) -> Result<Option<Dictionary>> {
        Ok(self.read()?.dictionaries.get(id).cloned())
    }

    fn list_dictionaries(&self) -> Result<Vec<Dictionary>> {
        let mut all: Vec<Dictionary> = self.read()?.dictionaries.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    fn put_dictionary(&self, dictionary: Dictionary) -> Result<()> {
        self.write()?
            .dictionaries
            .insert(dictionary.id.clone(), dictionary);
        Ok(())
    }

    fn signs_for(&self, dictionary_id: &str) -> Result<Vec<Sign>> {
        let mut signs: Vec<Sign> = self
            .read()?
            .signs
            .values()
            .filter(|s| s.dictionary_id == dictionary_id)
            .cloned()
            .collect();
        signs.sort_by_key(|s| s.puddle_sign_id);
        Ok(signs)
    }

    fn put_sign(&self, sign: Sign) -> Result<()> {
        self.write()?.signs.insert(sign.id.clone(), sign);
        Ok(())
    }
}

/// Result of importing one upload into the dictionary tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryImport {
    pub dictionary: Dictionary,
    /// Whether this upload created the dictionary
    pub created: bool,
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

pub struct DictionaryService<S: SignStore + ?Sized> {
    store: Arc<S>,
}

impl<S: SignStore + ?Sized> Clone for DictionaryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SignStore + ?Sized> DictionaryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn list_dictionaries(&self) -> Result<Vec<Dictionary>> {
        self.store.list_dictionaries()
    }

    pub fn get_dictionary(&self, id: &str) -> Result<Option<Dictionary>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        self.store.get_dictionary(id)
    }

    /// Signs of a dictionary, or `None` when the dictionary is unknown.
    pub fn signs(&self, dictionary_id: &str) -> Result<Option<Vec<Sign>>> {
        match self.get_dictionary(dictionary_id)? {
            Some(dict) => self.store.signs_for(&dict.id).map(Some),
            None => Ok(None),
        }
    }

    /// Create or merge the dictionary described by `raw_xml`.
    ///
    /// Signs are written one by one; if a write fails part way, calling this
    /// again with the same upload finishes the job.
    pub fn import_into_dictionary(&self, raw_xml: &str, owner_id: Option<&str>) -> Result<DictionaryImport> {
        if raw_xml.trim().is_empty() {
            return Err(PuddleError::InvalidArgument(
                "uploaded file is empty".to_string(),
            ));
        }
        let doc = spml::parse_spml(raw_xml)?;
        let puddle_type = doc.doc_type.as_deref().filter(|t| !t.is_empty());

        if let Some(dictionary) = self.store.find_dictionary(puddle_type, doc.puddle_id)? {
            let existing = self.store.signs_for(&dictionary.id)?;
            let plan = reconcile::merge(&dictionary.id, &existing, &doc)?;
            let (added, updated) = (plan.to_add.len(), plan.to_update.len());
            for sign in plan.to_add.into_iter().chain(plan.to_update) {
                self.store.put_sign(sign)?;
            }
            info!(
                dictionary_id = %dictionary.id,
                added,
                updated,
                "merged SPML upload into dictionary"
            );
            return Ok(DictionaryImport {
                dictionary,
                created: false,
                added,
                updated,
                unchanged: plan.unchanged,
                skipped: plan.skipped,
            });
        }

        let dictionary = mapper::to_dictionary(&doc, owner_id);
        let signs = mapper::to_signs(&doc, &dictionary.id);
        let added = signs.len();
        self.store.put_dictionary(dictionary.clone())?;
        for sign in signs {
            self.store.put_sign(sign)?;
        }
        info!(
            dictionary_id = %dictionary.id,
            name = %dictionary.name,
            added,
            "created dictionary from SPML upload"
        );
        Ok(DictionaryImport {
            dictionary,
            created: true,
            added,
            updated: 0,
            unchanged: 0,
            skipped: doc.entries.len() - added,
        })
    }
}
