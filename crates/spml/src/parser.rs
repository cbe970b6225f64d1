use std::borrow::Cow;

use quick_xml::escape::EscapeError;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

use crate::error::SpmlError;
use crate::model::{LegacyDocument, LegacyEntry, MetaPair};

/// Parse SPML text into a [`LegacyDocument`].
///
/// The DOCTYPE is skipped without being fetched or validated. Missing
/// attributes and elements fall back to defaults; structurally broken XML is
/// rejected as a whole.
pub fn parse_spml(input: &str) -> Result<LegacyDocument, SpmlError> {
    let mut reader = Reader::from_str(input);
    let mut state = ParseState::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            SpmlError::Malformed(format!("{} at byte {}", e, reader.buffer_position()))
        })?;
        match event {
            Event::Start(ref e) => state.open(e, false)?,
            Event::Empty(ref e) => state.open(e, true)?,
            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                state.close(&name)?;
            }
            Event::Text(ref e) => state.text(e)?,
            Event::CData(ref e) => state.push_raw(&String::from_utf8_lossy(e))?,
            Event::Eof => break,
            // Declaration, DOCTYPE, comments and processing instructions
            _ => {}
        }
    }

    state.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Term,
    Text,
    Png,
    Svg,
    Video,
    Src,
}

impl Slot {
    fn for_element(name: &str, in_entry: bool) -> Option<Self> {
        match name {
            "term" => Some(Slot::Term),
            "text" => Some(Slot::Text),
            "png" => Some(Slot::Png),
            "svg" => Some(Slot::Svg),
            "video" if in_entry => Some(Slot::Video),
            "src" => Some(Slot::Src),
            _ => None,
        }
    }
}

/// Text being collected for one leaf element.
struct Capture {
    slot: Slot,
    in_entry: bool,
    /// Depth of raw markup nested inside the leaf
    nested: usize,
    buf: String,
}

#[derive(Default)]
struct ParseState {
    doc: Option<LegacyDocument>,
    root_closed: bool,
    entry: Option<LegacyEntry>,
    capture: Option<Capture>,
    depth: usize,
}

impl ParseState {
    fn open(&mut self, e: &BytesStart, empty: bool) -> Result<(), SpmlError> {
        if let Some(cap) = self.capture.as_mut() {
            // Markup inside a text node is kept as opaque content.
            cap.buf.push('<');
            cap.buf.push_str(&String::from_utf8_lossy(e));
            if empty {
                cap.buf.push_str("/>");
            } else {
                cap.buf.push('>');
                cap.nested += 1;
                self.depth += 1;
            }
            return Ok(());
        }

        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        match self.depth {
            0 => {
                if self.root_closed {
                    return Err(SpmlError::Malformed(format!(
                        "unexpected element <{}> after the root element",
                        name
                    )));
                }
                if name != "spml" {
                    return Err(SpmlError::Malformed(format!(
                        "expected <spml> root element, found <{}>",
                        name
                    )));
                }
                self.doc = Some(read_document(e)?);
                if empty {
                    self.root_closed = true;
                    return Ok(());
                }
            }
            1 => match name.as_str() {
                "entry" => {
                    let entry = read_entry(e)?;
                    if empty {
                        self.document_mut()?.entries.push(entry);
                        return Ok(());
                    }
                    self.entry = Some(entry);
                }
                "meta" => {
                    let meta = read_meta(e)?;
                    self.document_mut()?.meta.push(meta);
                }
                _ => self.begin_capture(&name, false, empty)?,
            },
            2 if self.entry.is_some() => self.begin_capture(&name, true, empty)?,
            _ => {}
        }

        if !empty {
            self.depth += 1;
        }
        Ok(())
    }

    fn begin_capture(&mut self, name: &str, in_entry: bool, empty: bool) -> Result<(), SpmlError> {
        let Some(slot) = Slot::for_element(name, in_entry) else {
            return Ok(());
        };
        if empty {
            self.assign(slot, in_entry, String::new())
        } else {
            self.capture = Some(Capture {
                slot,
                in_entry,
                nested: 0,
                buf: String::new(),
            });
            Ok(())
        }
    }

    fn close(&mut self, name: &str) -> Result<(), SpmlError> {
        if self.depth == 0 {
            return Err(SpmlError::Malformed(format!(
                "closing tag </{}> without a matching open tag",
                name
            )));
        }
        self.depth -= 1;

        if let Some(cap) = self.capture.as_mut() {
            if cap.nested > 0 {
                cap.nested -= 1;
                cap.buf.push_str("</");
                cap.buf.push_str(name);
                cap.buf.push('>');
                return Ok(());
            }
        }
        if let Some(cap) = self.capture.take() {
            return self.assign(cap.slot, cap.in_entry, cap.buf);
        }

        match self.depth {
            0 => self.root_closed = true,
            1 if name == "entry" => {
                if let Some(entry) = self.entry.take() {
                    self.document_mut()?.entries.push(entry);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, e: &BytesText) -> Result<(), SpmlError> {
        let text = unescape_text(e)?;
        if self.depth == 0 {
            if !text.trim().is_empty() {
                return Err(SpmlError::Malformed(format!(
                    "text outside the root element: {:?}",
                    text.trim()
                )));
            }
            return Ok(());
        }
        let Some(cap) = self.capture.as_mut() else {
            return Ok(());
        };
        if cap.nested > 0 {
            // Keep nested markup exactly as written, entities included.
            cap.buf.push_str(&String::from_utf8_lossy(e));
        } else {
            cap.buf.push_str(&text);
        }
        Ok(())
    }

    fn push_raw(&mut self, text: &str) -> Result<(), SpmlError> {
        if self.depth == 0 {
            return Err(SpmlError::Malformed(
                "CDATA outside the root element".to_string(),
            ));
        }
        if let Some(cap) = self.capture.as_mut() {
            cap.buf.push_str(text);
        }
        Ok(())
    }

    fn assign(&mut self, slot: Slot, in_entry: bool, value: String) -> Result<(), SpmlError> {
        if in_entry {
            let entry = self
                .entry
                .as_mut()
                .ok_or_else(|| SpmlError::Malformed("entry content outside an entry".to_string()))?;
            match slot {
                Slot::Term => entry.terms.push(value),
                Slot::Text => entry.free_text.push(value),
                Slot::Png => entry.png = Some(value),
                Slot::Svg => entry.svg = Some(value),
                Slot::Video => entry.video = Some(value),
                Slot::Src => entry.sources.push(value),
            }
        } else {
            let doc = self.document_mut()?;
            match slot {
                Slot::Term => doc.titles.push(value),
                Slot::Text => doc.free_text.push(value),
                Slot::Png => doc.png = Some(value),
                Slot::Svg => doc.svg = Some(value),
                Slot::Src => doc.sources.push(value),
                Slot::Video => {}
            }
        }
        Ok(())
    }

    fn document_mut(&mut self) -> Result<&mut LegacyDocument, SpmlError> {
        self.doc
            .as_mut()
            .ok_or_else(|| SpmlError::Malformed("content outside the root element".to_string()))
    }

    fn finish(self) -> Result<LegacyDocument, SpmlError> {
        if self.depth > 0 {
            return Err(SpmlError::Malformed(format!(
                "unexpected end of input with {} unclosed element(s)",
                self.depth
            )));
        }
        self.doc
            .ok_or_else(|| SpmlError::Malformed("missing <spml> root element".to_string()))
    }
}

/// Unescape character data.
///
/// Unknown named entities (HTML `&nbsp;` and friends) keep their raw
/// spelling. A bare `&` or a broken character reference is malformed.
fn unescape_text<'a>(e: &'a BytesText) -> Result<Cow<'a, str>, SpmlError> {
    match e.unescape() {
        Ok(text) => Ok(text),
        Err(quick_xml::Error::EscapeError(EscapeError::UnrecognizedSymbol(..))) => {
            Ok(Cow::Owned(String::from_utf8_lossy(e).into_owned()))
        }
        Err(err) => Err(SpmlError::Malformed(format!("bad character data: {}", err))),
    }
}

fn read_attributes(e: &BytesStart) -> Result<Vec<(String, String)>, SpmlError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SpmlError::Malformed(format!("bad attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        out.push((key, value));
    }
    Ok(out)
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn read_document(e: &BytesStart) -> Result<LegacyDocument, SpmlError> {
    let mut doc = LegacyDocument {
        doc_type: Some(String::new()),
        ..Default::default()
    };
    for (key, value) in read_attributes(e)? {
        match key.as_str() {
            "root" => doc.root_uri = Some(value),
            "type" => doc.doc_type = Some(value),
            "puddle" => doc.puddle_id = parse_int(&value).unwrap_or(0),
            "uuid" => doc.uuid = Some(value),
            "cdt" => doc.created_at = parse_int(&value),
            "mdt" => doc.modified_at = parse_int(&value),
            "nextid" => doc.next_entry_id = parse_int(&value).unwrap_or(0),
            _ => {}
        }
    }
    Ok(doc)
}

fn read_entry(e: &BytesStart) -> Result<LegacyEntry, SpmlError> {
    let mut entry = LegacyEntry::default();
    for (key, value) in read_attributes(e)? {
        match key.as_str() {
            "id" => entry.entry_id = parse_int(&value),
            "uuid" => entry.uuid = Some(value),
            "prev" => entry.prev_id = Some(value),
            "next" => entry.next_id = Some(value),
            "cdt" => entry.created_at = parse_int(&value),
            "mdt" => entry.modified_at = parse_int(&value),
            "usr" => entry.user = value,
            _ => {}
        }
    }
    Ok(entry)
}

fn read_meta(e: &BytesStart) -> Result<MetaPair, SpmlError> {
    let mut meta = MetaPair::default();
    for (key, value) in read_attributes(e)? {
        match key.as_str() {
            "name" => meta.name = value,
            "value" => meta.value = value,
            "lang" => meta.lang = Some(value),
            _ => {}
        }
    }
    Ok(meta)
}
