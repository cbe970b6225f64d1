//! Entity Mapper: SPML document → Dictionary and Sign records.
//!
//! Pure transforms, no I/O.
use spml::{LegacyDocument, LegacyEntry};

use crate::data_model::{new_dictionary_id, sign_id, Dictionary, Sign};

/// Build the dictionary record for a freshly imported document.
pub fn to_dictionary(doc: &LegacyDocument, owner_id: Option<&str>) -> Dictionary {
    Dictionary {
        id: new_dictionary_id(),
        puddle_id: Some(doc.puddle_id),
        puddle_type: doc.doc_type.clone().filter(|t| !t.is_empty()),
        name: doc.dictionary_name(),
        description: Some(format!(
            "Imported from SignPuddle {} puddle {}",
            doc.doc_type.as_deref().filter(|t| !t.is_empty()).unwrap_or("unknown"),
            doc.puddle_id
        )),
        is_public: true,
        owner_id: owner_id.map(str::to_string),
        created: doc.created(),
        updated: doc.modified(),
    }
}

/// Convert every importable entry into a sign, keeping document order.
///
/// An entry is importable only when it has an id, a notation that is strictly
/// valid FSW, and at least one gloss.
pub fn to_signs(doc: &LegacyDocument, dictionary_id: &str) -> Vec<Sign> {
    doc.entries
        .iter()
        .filter_map(|entry| to_sign(entry, doc.puddle_id, dictionary_id))
        .collect()
}

fn to_sign(entry: &LegacyEntry, puddle_id: i64, dictionary_id: &str) -> Option<Sign> {
    let entry_id = entry.entry_id?;
    let fsw = entry.notation().filter(|n| spml::is_valid_fsw(n))?;
    let glosses = entry.gloss_list();
    if glosses.is_empty() {
        return None;
    }
    Some(build_sign(entry, entry_id, fsw, glosses, puddle_id, dictionary_id))
}

pub(crate) fn build_sign(
    entry: &LegacyEntry,
    entry_id: i64,
    fsw: &str,
    glosses: Vec<String>,
    puddle_id: i64,
    dictionary_id: &str,
) -> Sign {
    let user = attribution(entry);
    Sign {
        id: sign_id(dictionary_id, entry_id),
        dictionary_id: dictionary_id.to_string(),
        puddle_sign_id: entry_id,
        puddle_id: Some(puddle_id),
        fsw: fsw.to_string(),
        glosses,
        description: entry.first_free_text().map(str::to_string),
        created: entry.created(),
        updated: entry.modified(),
        created_by: user.clone(),
        updated_by: user,
    }
}

/// The entry's `usr` attribute, copied as is (empty when absent).
pub(crate) fn attribution(entry: &LegacyEntry) -> Option<String> {
    Some(entry.user.clone())
}
