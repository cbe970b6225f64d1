//! Persistence facade over stored SPML documents.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use puddle_core::{mapper, PuddleError, Result};
use serde_json::json;
use spml::LegacyDocument;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::{
    partition_key, DocumentFilter, ImportResult, StoreStats, StoredDocument, ANONYMOUS_OWNER,
};
use crate::store::DocumentStore;

/// Optional details attached to a document when it is saved.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub owner_id: Option<String>,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
}

impl SaveOptions {
    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Save/get/list/update/delete/export and stats over [`StoredDocument`]s.
pub struct SpmlService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DocumentStore + ?Sized> Clone for SpmlService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore + ?Sized> SpmlService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store a parsed document with the XML text it came from.
    pub fn save(
        &self,
        legacy: LegacyDocument,
        raw_xml: &str,
        options: SaveOptions,
    ) -> Result<StoredDocument> {
        if raw_xml.trim().is_empty() {
            return Err(PuddleError::InvalidArgument(
                "raw XML must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let mut metadata = BTreeMap::new();
        metadata.insert("dictionary_name".to_string(), json!(legacy.dictionary_name()));
        metadata.insert("entry_count".to_string(), json!(legacy.entry_count()));

        let doc = StoredDocument {
            id: Uuid::new_v4().to_string(),
            partition_key: partition_key(&legacy),
            legacy_document: Some(legacy),
            original_xml: Some(raw_xml.to_string()),
            owner_id: options.owner_id,
            saved_at: now,
            updated_at: now,
            description: options.description,
            tags: options.tags,
            metadata,
        };
        self.store.put(doc.clone())?;

        info!(
            id = %doc.id,
            partition = %doc.partition_key,
            entries = doc.entry_count(),
            "saved SPML document"
        );
        Ok(doc)
    }

    /// Parse, save and map an upload in one step.
    ///
    /// Never returns an error: any failure becomes `success == false` with a
    /// message starting with "Failed to import:".
    pub fn import_and_save(&self, raw_xml: &str, options: SaveOptions) -> ImportResult {
        match self.try_import(raw_xml, options) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "SPML import failed");
                ImportResult::failed(e)
            }
        }
    }

    fn try_import(&self, raw_xml: &str, options: SaveOptions) -> Result<ImportResult> {
        if raw_xml.trim().is_empty() {
            return Err(PuddleError::InvalidArgument(
                "uploaded file is empty".to_string(),
            ));
        }
        let legacy = spml::parse_spml(raw_xml)?;
        let owner = options.owner_id.clone();
        let stored = self.save(legacy, raw_xml, options)?;

        let legacy = stored
            .legacy_document
            .as_ref()
            .ok_or_else(|| PuddleError::Store("saved document has no SPML model".to_string()))?;
        let dictionary = mapper::to_dictionary(legacy, owner.as_deref());
        let signs = mapper::to_signs(legacy, &dictionary.id);

        Ok(ImportResult::succeeded(stored, dictionary, signs))
    }

    /// `None` for blank or unknown ids.
    pub fn get(&self, id: &str) -> Result<Option<StoredDocument>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }
        self.store.get(id)
    }

    pub fn list_all(&self) -> Result<Vec<StoredDocument>> {
        self.store.scan(&DocumentFilter::default())
    }

    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<StoredDocument>> {
        self.store.scan(&DocumentFilter::owner(owner_id))
    }

    pub fn list_by_type(&self, doc_type: &str) -> Result<Vec<StoredDocument>> {
        self.store.scan(&DocumentFilter::doc_type(doc_type))
    }

    pub fn list_by_puddle_id(&self, puddle_id: i64) -> Result<Vec<StoredDocument>> {
        self.store.scan(&DocumentFilter::puddle_id(puddle_id))
    }

    pub fn list(&self, filter: &DocumentFilter) -> Result<Vec<StoredDocument>> {
        self.store.scan(filter)
    }

    /// Replace a stored document, bumping `updated_at`.
    ///
    /// `None` when no document with that id exists.
    pub fn update(&self, mut doc: StoredDocument) -> Result<Option<StoredDocument>> {
        if doc.id.trim().is_empty() {
            return Err(PuddleError::InvalidArgument(
                "document id is required for update".to_string(),
            ));
        }
        doc.updated_at = Utc::now();
        if !self.store.replace(doc.clone())? {
            debug!(id = %doc.id, "update of unknown document");
            return Ok(None);
        }
        info!(id = %doc.id, "updated SPML document");
        Ok(Some(doc))
    }

    /// Change description and/or tags of a stored document.
    pub fn update_details(
        &self,
        id: &str,
        description: Option<String>,
        tags: Option<BTreeSet<String>>,
    ) -> Result<Option<StoredDocument>> {
        let Some(mut doc) = self.get(id)? else {
            return Ok(None);
        };
        if let Some(description) = description {
            doc.description = Some(description);
        }
        if let Some(tags) = tags {
            doc.tags = tags;
        }
        self.update(doc)
    }

    /// `false` when nothing was stored under `id`.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(false);
        }
        let removed = self.store.remove(id)?;
        if removed {
            info!(id, "deleted SPML document");
        }
        Ok(removed)
    }

    /// The original upload if kept, otherwise a fresh serialization.
    pub fn export_as_xml(&self, id: &str) -> Result<Option<String>> {
        let Some(doc) = self.get(id)? else {
            return Ok(None);
        };
        if let Some(xml) = doc.original_xml {
            return Ok(Some(xml));
        }
        let legacy = doc.legacy_document.as_ref().ok_or_else(|| {
            PuddleError::Serialization(format!("document {} has no SPML content", doc.id))
        })?;
        Ok(Some(spml::serialize_spml(legacy)?))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let docs = self.list_all()?;
        let mut stats = StoreStats {
            total_documents: docs.len(),
            ..Default::default()
        };
        for doc in &docs {
            stats.total_entries += doc.entry_count();
            *stats
                .documents_by_type
                .entry(doc.partition_key.clone())
                .or_default() += 1;
            let owner = doc.owner_id.as_deref().unwrap_or(ANONYMOUS_OWNER);
            *stats.documents_by_owner.entry(owner.to_string()).or_default() += 1;
        }
        Ok(stats)
    }
}
