use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::SpmlError;
use crate::model::{LegacyDocument, LegacyEntry};

pub const SPML_DTD_URI: &str = "http://www.signpuddle.net/spml_1.6.dtd";

/// Write a document back out as SPML 1.6.
///
/// Children are emitted in a fixed order: terms, text blocks, png, svg,
/// sources, entries, then meta pairs.
pub fn serialize_spml(doc: &LegacyDocument) -> Result<String, SpmlError> {
    let doc_type = doc
        .doc_type
        .as_deref()
        .ok_or_else(|| SpmlError::Serialization("document type is not set".to_string()))?;

    let mut w = SpmlWriter {
        inner: Writer::new_with_indent(Vec::new(), b' ', 2),
    };
    w.event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    w.event(Event::DocType(BytesText::from_escaped(format!(
        "spml SYSTEM \"{}\"",
        SPML_DTD_URI
    ))))?;

    let puddle = doc.puddle_id.to_string();
    let next_id = doc.next_entry_id.to_string();
    let created = doc.created_at.map(|v| v.to_string());
    let modified = doc.modified_at.map(|v| v.to_string());

    let mut root = BytesStart::new("spml");
    push_opt(&mut root, "root", doc.root_uri.as_deref());
    root.push_attribute(("type", doc_type));
    root.push_attribute(("puddle", puddle.as_str()));
    push_opt(&mut root, "uuid", doc.uuid.as_deref());
    push_opt(&mut root, "cdt", created.as_deref());
    push_opt(&mut root, "mdt", modified.as_deref());
    root.push_attribute(("nextid", next_id.as_str()));
    w.event(Event::Start(root))?;

    w.leaves("term", &doc.titles)?;
    w.leaves("text", &doc.free_text)?;
    w.leaf_opt("png", doc.png.as_deref())?;
    w.leaf_opt("svg", doc.svg.as_deref())?;
    w.leaves("src", &doc.sources)?;

    for entry in &doc.entries {
        w.entry(entry)?;
    }

    for meta in &doc.meta {
        let mut el = BytesStart::new("meta");
        el.push_attribute(("name", meta.name.as_str()));
        el.push_attribute(("value", meta.value.as_str()));
        push_opt(&mut el, "lang", meta.lang.as_deref());
        w.event(Event::Empty(el))?;
    }

    w.event(Event::End(BytesEnd::new("spml")))?;

    String::from_utf8(w.inner.into_inner())
        .map_err(|e| SpmlError::Serialization(e.to_string()))
}

struct SpmlWriter {
    inner: Writer<Vec<u8>>,
}

impl SpmlWriter {
    fn event(&mut self, event: Event<'_>) -> Result<(), SpmlError> {
        self.inner
            .write_event(event)
            .map_err(|e| SpmlError::Serialization(e.to_string()))
    }

    fn leaf(&mut self, name: &str, text: &str) -> Result<(), SpmlError> {
        if text.is_empty() {
            return self.event(Event::Empty(BytesStart::new(name)));
        }
        self.event(Event::Start(BytesStart::new(name)))?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn leaves(&mut self, name: &str, values: &[String]) -> Result<(), SpmlError> {
        for value in values {
            self.leaf(name, value)?;
        }
        Ok(())
    }

    fn leaf_opt(&mut self, name: &str, value: Option<&str>) -> Result<(), SpmlError> {
        match value {
            Some(v) => self.leaf(name, v),
            None => Ok(()),
        }
    }

    fn entry(&mut self, entry: &LegacyEntry) -> Result<(), SpmlError> {
        let id = entry.entry_id.map(|v| v.to_string());
        let created = entry.created_at.map(|v| v.to_string());
        let modified = entry.modified_at.map(|v| v.to_string());

        let mut el = BytesStart::new("entry");
        push_opt(&mut el, "id", id.as_deref());
        push_opt(&mut el, "uuid", entry.uuid.as_deref());
        push_opt(&mut el, "prev", entry.prev_id.as_deref());
        push_opt(&mut el, "next", entry.next_id.as_deref());
        push_opt(&mut el, "cdt", created.as_deref());
        push_opt(&mut el, "mdt", modified.as_deref());
        if !entry.user.is_empty() {
            el.push_attribute(("usr", entry.user.as_str()));
        }
        self.event(Event::Start(el))?;

        self.leaves("term", &entry.terms)?;
        self.leaves("text", &entry.free_text)?;
        self.leaf_opt("png", entry.png.as_deref())?;
        self.leaf_opt("svg", entry.svg.as_deref())?;
        self.leaf_opt("video", entry.video.as_deref())?;
        self.leaves("src", &entry.sources)?;

        self.event(Event::End(BytesEnd::new("entry")))
    }
}

fn push_opt(el: &mut BytesStart, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        el.push_attribute((key, v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetaPair;

    #[test]
    fn test_header_and_doctype() {
        let doc = LegacyDocument::new("sgn", 12);
        let xml = serialize_spml(&doc).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<!DOCTYPE spml SYSTEM \"http://www.signpuddle.net/spml_1.6.dtd\">"));
        assert!(xml.contains("type=\"sgn\""));
        assert!(xml.contains("puddle=\"12\""));
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let doc = LegacyDocument::default();
        let err = serialize_spml(&doc).unwrap_err();
        assert!(matches!(err, SpmlError::Serialization(_)));
    }

    #[test]
    fn test_child_order_and_escaping() {
        let mut doc = LegacyDocument::new("sgn", 1);
        doc.sources.push("source".to_string());
        doc.free_text.push("a < b & c".to_string());
        doc.titles.push("Title".to_string());
        doc.svg = Some("<svg/>".to_string());
        doc.meta.push(MetaPair {
            name: "title".to_string(),
            value: "Meta \"quoted\"".to_string(),
            lang: None,
        });
        let mut entry = LegacyEntry::new(3);
        entry.user = "admin".to_string();
        entry.terms.push("M500x500".to_string());
        doc.entries.push(entry);

        let xml = serialize_spml(&doc).unwrap();
        let term = xml.find("<term>Title</term>").unwrap();
        let text = xml.find("<text>a &lt; b &amp; c</text>").unwrap();
        let svg = xml.find("<svg>&lt;svg/&gt;</svg>").unwrap();
        let src = xml.find("<src>source</src>").unwrap();
        let entry = xml.find("<entry id=\"3\" usr=\"admin\">").unwrap();
        let meta = xml.find("<meta name=\"title\"").unwrap();
        assert!(term < text && text < svg && svg < src && src < entry && entry < meta);
    }
}
