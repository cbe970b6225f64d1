//! Reconciliation Engine: merge a re-imported SPML document into the signs a
//! dictionary already holds.
//!
//! ```text
//! existing signs ──► index by puddle_sign_id
//!                          │
//! doc.entries ──► gate ──► known id?  ── yes ─► changed? ── yes ─► to_update
//!                          │                       └─ no ──► unchanged
//!                          └─ no ──► to_add
//! ```
//!
//! The engine is pure: the caller persists `to_add` and `to_update` one sign
//! at a time, and running the same merge again re-derives the same plan from
//! whatever made it to the store.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spml::{LegacyDocument, LegacyEntry};
use tracing::debug;

use crate::data_model::Sign;
use crate::error::{PuddleError, Result};
use crate::mapper::{attribution, build_sign};

/// What the caller has to write after a merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergePlan {
    pub to_add: Vec<Sign>,
    pub to_update: Vec<Sign>,
    /// Entries that failed the gate (no id, notation or gloss)
    pub skipped: usize,
    /// Known entries whose fields all matched
    pub unchanged: usize,
}

impl MergePlan {
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty()
    }
}

/// Merge `doc` into `existing`, stamping updates with the current time.
pub fn merge(dictionary_id: &str, existing: &[Sign], doc: &LegacyDocument) -> Result<MergePlan> {
    merge_at(dictionary_id, existing, doc, Utc::now())
}

/// Same as [`merge`] with an explicit clock for the `updated` stamp.
pub fn merge_at(
    dictionary_id: &str,
    existing: &[Sign],
    doc: &LegacyDocument,
    now: DateTime<Utc>,
) -> Result<MergePlan> {
    if dictionary_id.trim().is_empty() {
        return Err(PuddleError::InvalidArgument(
            "dictionary id is required for merge".to_string(),
        ));
    }

    let by_entry_id: HashMap<i64, &Sign> = existing
        .iter()
        .map(|sign| (sign.puddle_sign_id, sign))
        .collect();

    let mut plan = MergePlan::default();
    for entry in &doc.entries {
        // Looser than the import gate: any non-empty notation passes.
        let Some((entry_id, notation, glosses)) = mergeable(entry) else {
            plan.skipped += 1;
            continue;
        };

        match by_entry_id.get(&entry_id) {
            Some(current) => match apply_changes(current, entry, notation, glosses, now) {
                Some(updated) => plan.to_update.push(updated),
                None => plan.unchanged += 1,
            },
            None => plan.to_add.push(build_sign(
                entry,
                entry_id,
                notation,
                glosses,
                doc.puddle_id,
                dictionary_id,
            )),
        }
    }

    debug!(
        dictionary_id,
        add = plan.to_add.len(),
        update = plan.to_update.len(),
        unchanged = plan.unchanged,
        skipped = plan.skipped,
        "merge planned"
    );
    Ok(plan)
}

fn mergeable(entry: &LegacyEntry) -> Option<(i64, &str, Vec<String>)> {
    let entry_id = entry.entry_id?;
    let notation = entry.notation().filter(|n| !n.is_empty())?;
    let glosses = entry.gloss_list();
    if glosses.first().map_or(true, |g| g.is_empty()) {
        return None;
    }
    Some((entry_id, notation, glosses))
}

/// Copy of `current` with the entry's values, or `None` when nothing differs.
fn apply_changes(
    current: &Sign,
    entry: &LegacyEntry,
    notation: &str,
    glosses: Vec<String>,
    now: DateTime<Utc>,
) -> Option<Sign> {
    let description = entry.first_free_text();
    let fsw_changed = current.fsw != notation;
    let gloss_changed = current.first_gloss() != glosses.first().map(String::as_str);
    let description_changed = current.description.as_deref() != description;

    if !(fsw_changed || gloss_changed || description_changed) {
        return None;
    }

    let mut updated = current.clone();
    if fsw_changed {
        updated.fsw = notation.to_string();
    }
    if gloss_changed {
        updated.glosses = glosses;
    }
    if description_changed {
        updated.description = description.map(str::to_string);
    }
    updated.updated = now;
    updated.updated_by = attribution(entry);
    Some(updated)
}
