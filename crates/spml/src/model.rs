//! In-memory model of one SPML dictionary document.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsw;

/// Name used when no title, meta title or free text is available.
pub const UNKNOWN_NAME: &str = "Unknown";

/// One parsed SPML file: puddle header plus its ordered entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyDocument {
    /// `root` attribute (URI of the source puddle)
    pub root_uri: Option<String>,
    /// `type` attribute (language family code, e.g. "sgn").
    /// Parsing always sets it; only hand-built documents leave it unset.
    pub doc_type: Option<String>,
    /// `puddle` attribute
    pub puddle_id: i64,
    pub uuid: Option<String>,
    /// Unix seconds
    pub created_at: Option<i64>,
    /// Unix seconds
    pub modified_at: Option<i64>,
    /// Advisory counter from the source system
    pub next_entry_id: i64,
    pub titles: Vec<String>,
    pub free_text: Vec<String>,
    pub png: Option<String>,
    pub svg: Option<String>,
    pub sources: Vec<String>,
    pub entries: Vec<LegacyEntry>,
    pub meta: Vec<MetaPair>,
}

/// `<meta name=".." value=".." lang=".."/>` annotation on a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetaPair {
    pub name: String,
    pub value: String,
    pub lang: Option<String>,
}

/// One sign record inside a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacyEntry {
    /// `id` attribute; `None` when absent or not an integer
    pub entry_id: Option<i64>,
    pub uuid: Option<String>,
    pub prev_id: Option<String>,
    pub next_id: Option<String>,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    /// `usr` attribute, empty when absent
    pub user: String,
    /// Notation plus glosses, in source order
    pub terms: Vec<String>,
    pub free_text: Vec<String>,
    pub png: Option<String>,
    pub svg: Option<String>,
    pub video: Option<String>,
    pub sources: Vec<String>,
}

impl LegacyDocument {
    /// Create an empty document of the given type and puddle id.
    pub fn new(doc_type: impl Into<String>, puddle_id: i64) -> Self {
        Self {
            doc_type: Some(doc_type.into()),
            puddle_id,
            ..Default::default()
        }
    }

    /// Resolve the display name of the dictionary.
    ///
    /// Order: `title` meta pair (case-insensitive) → first non-empty term →
    /// first non-empty text block → [`UNKNOWN_NAME`].
    pub fn dictionary_name(&self) -> String {
        self.meta
            .iter()
            .filter(|m| m.name.eq_ignore_ascii_case("title"))
            .map(|m| m.value.as_str())
            .chain(self.titles.iter().map(String::as_str))
            .chain(self.free_text.iter().map(String::as_str))
            .find(|v| !v.trim().is_empty())
            .unwrap_or(UNKNOWN_NAME)
            .to_string()
    }

    /// Value of the first meta pair with this name (case-insensitive).
    pub fn meta_value(&self, name: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.value.as_str())
    }

    pub fn created(&self) -> DateTime<Utc> {
        to_datetime(self.created_at)
    }

    pub fn modified(&self) -> DateTime<Utc> {
        to_datetime(self.modified_at)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

impl LegacyEntry {
    pub fn new(entry_id: i64) -> Self {
        Self {
            entry_id: Some(entry_id),
            ..Default::default()
        }
    }

    /// The notation term: first term starting with `AS` or `M`.
    pub fn notation(&self) -> Option<&str> {
        self.terms
            .iter()
            .map(String::as_str)
            .find(|t| is_notation_term(t))
    }

    /// All terms that are not notation, in order.
    pub fn gloss_list(&self) -> Vec<String> {
        self.terms
            .iter()
            .filter(|t| !is_notation_term(t))
            .cloned()
            .collect()
    }

    /// Whether the notation term is strictly valid FSW.
    pub fn has_valid_fsw(&self) -> bool {
        self.notation().is_some_and(fsw::is_valid_fsw)
    }

    pub fn first_free_text(&self) -> Option<&str> {
        self.free_text.first().map(String::as_str)
    }

    pub fn created(&self) -> DateTime<Utc> {
        to_datetime(self.created_at)
    }

    pub fn modified(&self) -> DateTime<Utc> {
        to_datetime(self.modified_at)
    }
}

fn is_notation_term(term: &str) -> bool {
    term.starts_with("AS") || term.starts_with('M')
}

/// Convert optional Unix seconds to UTC; absent or out of range → epoch.
pub fn to_datetime(secs: Option<i64>) -> DateTime<Utc> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
