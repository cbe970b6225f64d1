//! Parse → serialize → parse round-trips over real-shaped SPML.

use spml::{parse_spml, serialize_spml, LegacyDocument};

const SAMPLE: &str = include_str!("fixtures/asl-sample.spml");

fn entry_keys(doc: &LegacyDocument) -> Vec<(Option<i64>, Option<String>, Vec<String>)> {
    doc.entries
        .iter()
        .map(|e| (e.entry_id, e.notation().map(str::to_string), e.gloss_list()))
        .collect()
}

fn assert_roundtrip(xml: &str) -> LegacyDocument {
    let first = parse_spml(xml).unwrap();
    let serialized = serialize_spml(&first).unwrap();
    let second = parse_spml(&serialized).unwrap();

    assert_eq!(second.doc_type, first.doc_type);
    assert_eq!(second.puddle_id, first.puddle_id);
    assert_eq!(second.dictionary_name(), first.dictionary_name());
    assert_eq!(second.entries.len(), first.entries.len());
    assert_eq!(entry_keys(&second), entry_keys(&first));
    assert_eq!(second, first);
    first
}

#[test]
fn test_sample_roundtrip() {
    let doc = assert_roundtrip(SAMPLE);
    assert_eq!(doc.dictionary_name(), "ASL Puddle");
    assert_eq!(doc.entries.len(), 5);
    assert_eq!(doc.free_text[1], "<p>Contributed by the <b>community</b>.</p>");
}

#[test]
fn test_serialized_output_roundtrips_again() {
    let doc = parse_spml(SAMPLE).unwrap();
    let once = serialize_spml(&doc).unwrap();
    let twice = serialize_spml(&parse_spml(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_empty_document_roundtrip() {
    let doc = assert_roundtrip(r#"<?xml version="1.0"?><spml type="sgn" puddle="9"></spml>"#);
    assert!(doc.entries.is_empty());
    assert_eq!(doc.dictionary_name(), "Unknown");
}

#[test]
fn test_large_text_roundtrip() {
    let big = "ẞ🤟 <html> & ".repeat(4_000);
    let mut doc = LegacyDocument::new("sgn", 1);
    doc.free_text.push(big.clone());
    let xml = serialize_spml(&doc).unwrap();
    assert!(xml.len() > 40_000);

    let parsed = assert_roundtrip(&xml);
    assert_eq!(parsed.free_text, vec![big]);
}

#[test]
fn test_whitespace_in_terms_preserved() {
    let doc = assert_roundtrip(
        "<spml type=\"sgn\"><entry id=\"1\"><term>  padded gloss </term><term></term></entry></spml>",
    );
    assert_eq!(doc.entries[0].terms, vec!["  padded gloss ", ""]);
}

#[test]
fn test_entries_without_ids_roundtrip() {
    let doc = parse_spml(SAMPLE).unwrap();
    let orphan = doc.entries.iter().find(|e| e.uuid.as_deref() == Some("no-id")).unwrap();
    assert_eq!(orphan.entry_id, None);

    let reparsed = parse_spml(&serialize_spml(&doc).unwrap()).unwrap();
    assert_eq!(reparsed.entries[3].entry_id, None);
    assert_eq!(reparsed.entries[3].uuid.as_deref(), Some("no-id"));
}

#[test]
fn test_document_serializes_to_json() {
    let doc = parse_spml(SAMPLE).unwrap();
    let json = serde_json::to_string(&doc).unwrap();
    let back: LegacyDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back, doc);
}
