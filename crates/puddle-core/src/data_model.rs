//! Data Model: Dictionary, Sign
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dictionary {
    pub id: String,
    /// Source puddle id (SPML `puddle` attribute)
    pub puddle_id: Option<i64>,
    /// Source puddle type (SPML `type` attribute, e.g. "sgn")
    pub puddle_type: Option<String>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    pub owner_id: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sign {
    pub id: String,
    pub dictionary_id: String,
    /// SPML entry id; unique within a dictionary and the re-import merge key
    pub puddle_sign_id: i64,
    pub puddle_id: Option<i64>,
    /// FSW notation
    pub fsw: String,
    pub glosses: Vec<String>,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl Sign {
    pub fn first_gloss(&self) -> Option<&str> {
        self.glosses.first().map(String::as_str)
    }
}

/// Stable id for the sign holding `puddle_sign_id` in a dictionary.
///
/// Importing or merging the same entry always yields the same sign id.
pub fn sign_id(dictionary_id: &str, puddle_sign_id: i64) -> String {
    let name = format!("{}/{}", dictionary_id, puddle_sign_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

pub fn new_dictionary_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_id_is_stable() {
        assert_eq!(sign_id("dict", 1), sign_id("dict", 1));
        assert_ne!(sign_id("dict", 1), sign_id("dict", 2));
        assert_ne!(sign_id("dict", 1), sign_id("other", 1));
    }

    #[test]
    fn test_dictionary_defaults_public() {
        let json = r#"{
            "id": "d1", "puddle_id": null, "puddle_type": null, "name": "n",
            "description": null, "owner_id": null,
            "created": "1970-01-01T00:00:00Z", "updated": "1970-01-01T00:00:00Z"
        }"#;
        let dict: Dictionary = serde_json::from_str(json).unwrap();
        assert!(dict.is_public);
    }
}
