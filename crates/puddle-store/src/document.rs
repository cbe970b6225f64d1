//! Stored SPML documents and the values the facade hands back.
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use puddle_core::{Dictionary, Sign};
use serde::{Deserialize, Serialize};
use spml::LegacyDocument;

/// Partition used when a document carries no `type`.
pub const UNKNOWN_PARTITION: &str = "unknown";

/// Owner bucket in [`StoreStats`] for documents saved without an owner.
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// A parsed SPML document together with the text it was parsed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    /// Document type, or [`UNKNOWN_PARTITION`]
    pub partition_key: String,
    /// `None` when a stored record could not be decoded
    #[serde(default)]
    pub legacy_document: Option<LegacyDocument>,
    /// Exact upload; preferred over re-serialization on export
    pub original_xml: Option<String>,
    pub owner_id: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl StoredDocument {
    pub fn entry_count(&self) -> usize {
        self.legacy_document
            .as_ref()
            .map_or(0, LegacyDocument::entry_count)
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.legacy_document.as_ref()?.doc_type.as_deref()
    }

    pub fn puddle_id(&self) -> Option<i64> {
        self.legacy_document.as_ref().map(|d| d.puddle_id)
    }
}

/// Partition key for a document: its type, or [`UNKNOWN_PARTITION`].
pub fn partition_key(doc: &LegacyDocument) -> String {
    doc.doc_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_PARTITION)
        .to_string()
}

/// Outcome of `import_and_save`; failures are reported here, never raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_document: Option<StoredDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<Dictionary>,
    #[serde(default)]
    pub signs: Vec<Sign>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportResult {
    pub fn succeeded(stored: StoredDocument, dictionary: Dictionary, signs: Vec<Sign>) -> Self {
        let message = format!(
            "Imported \"{}\" with {} sign(s) from {} entr{}",
            dictionary.name,
            signs.len(),
            stored.entry_count(),
            if stored.entry_count() == 1 { "y" } else { "ies" }
        );
        Self {
            success: true,
            stored_document: Some(stored),
            dictionary: Some(dictionary),
            signs,
            message,
            error: None,
        }
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        let error = error.to_string();
        Self {
            success: false,
            stored_document: None,
            dictionary: None,
            signs: Vec::new(),
            message: format!("Failed to import: {}", error),
            error: Some(error),
        }
    }
}

/// Aggregate counts over every stored document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreStats {
    pub total_documents: usize,
    pub total_entries: usize,
    pub documents_by_type: BTreeMap<String, usize>,
    pub documents_by_owner: BTreeMap<String, usize>,
}

/// Secondary lookup dimensions; `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DocumentFilter {
    pub owner: Option<String>,
    pub doc_type: Option<String>,
    pub puddle_id: Option<i64>,
}

impl DocumentFilter {
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Default::default()
        }
    }

    pub fn doc_type(doc_type: impl Into<String>) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            ..Default::default()
        }
    }

    pub fn puddle_id(puddle_id: i64) -> Self {
        Self {
            puddle_id: Some(puddle_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, doc: &StoredDocument) -> bool {
        if let Some(owner) = &self.owner {
            if doc.owner_id.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(doc_type) = &self.doc_type {
            if doc.partition_key != *doc_type {
                return false;
            }
        }
        if let Some(puddle_id) = self.puddle_id {
            if doc.puddle_id() != Some(puddle_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(doc: Option<LegacyDocument>, owner: Option<&str>) -> StoredDocument {
        StoredDocument {
            id: "1".to_string(),
            partition_key: doc.as_ref().map_or(UNKNOWN_PARTITION.to_string(), partition_key),
            legacy_document: doc,
            original_xml: None,
            owner_id: owner.map(str::to_string),
            saved_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
            description: None,
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_partition_key_defaults() {
        assert_eq!(partition_key(&LegacyDocument::new("sgn", 1)), "sgn");
        assert_eq!(partition_key(&LegacyDocument::new(" ", 1)), UNKNOWN_PARTITION);
        assert_eq!(partition_key(&LegacyDocument::default()), UNKNOWN_PARTITION);
    }

    #[test]
    fn test_filter_matching() {
        let doc = stored(Some(LegacyDocument::new("sgn", 4)), Some("alice"));
        assert!(DocumentFilter::default().matches(&doc));
        assert!(DocumentFilter::owner("alice").matches(&doc));
        assert!(!DocumentFilter::owner("bob").matches(&doc));
        assert!(DocumentFilter::doc_type("sgn").matches(&doc));
        assert!(DocumentFilter::puddle_id(4).matches(&doc));
        assert!(!DocumentFilter::puddle_id(5).matches(&doc));
    }

    #[test]
    fn test_corrupted_record_counts_zero_entries() {
        let doc = stored(None, None);
        assert_eq!(doc.entry_count(), 0);
        assert!(!DocumentFilter::puddle_id(0).matches(&doc));
    }

    #[test]
    fn test_failed_import_message() {
        let result = ImportResult::failed("PARSE/bad");
        assert!(!result.success);
        assert_eq!(result.message, "Failed to import: PARSE/bad");
        assert_eq!(result.error.as_deref(), Some("PARSE/bad"));
    }
}
