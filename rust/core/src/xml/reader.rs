// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build a [`Document`] from quick-xml events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::{Attribute, Document, Element, NodeKey, NodeKind};
use crate::error::{Error, Result};

/// UTF-8 byte-order mark as it appears after decoding.
const BOM: char = '\u{FEFF}';

/// Namespace declarations introduced by one element.
type Scope = Vec<(Option<String>, String)>;

impl Document {
    /// Parse uploaded bytes: decode as UTF-8 (lossy), drop a leading
    /// byte-order mark and leading whitespace, then parse.
    pub fn from_upload(bytes: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(bytes);
        Self::parse(text.trim_start_matches(BOM).trim_start())
    }

    /// Parse XML text into a mutable document.
    ///
    /// Whitespace text is preserved so that serialization round-trips the
    /// original layout. Fails with [`Error::MissingRootElement`] when the
    /// input holds no element at all.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut doc = Document::new();
        let mut open: Vec<NodeKey> = Vec::new();
        let mut scopes: Vec<Scope> = Vec::new();

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| Error::InvalidXml {
                position,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    let key = start_element(&mut doc, &open, &mut scopes, &e, position)?;
                    open.push(key);
                }
                Event::Empty(e) => {
                    start_element(&mut doc, &open, &mut scopes, &e, position)?;
                    scopes.pop();
                }
                Event::End(_) => {
                    if open.pop().is_none() {
                        return Err(Error::InvalidXml {
                            position,
                            message: "closing tag without matching start tag".into(),
                        });
                    }
                    scopes.pop();
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| Error::InvalidXml {
                        position,
                        message: err.to_string(),
                    })?;
                    match open.last() {
                        Some(&parent) => {
                            let node = doc.create(NodeKind::Text(text.into_owned()));
                            doc.append_child(parent, node);
                        }
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(Error::InvalidXml {
                                position,
                                message: "text outside the root element".into(),
                            })
                        }
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_misc(&mut doc, &open, NodeKind::CData(text));
                }
                Event::Comment(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_misc(&mut doc, &open, NodeKind::Comment(text));
                }
                Event::PI(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_misc(&mut doc, &open, NodeKind::ProcessingInstruction(text));
                }
                Event::DocType(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    append_misc(&mut doc, &open, NodeKind::DocType(text));
                }
                // Serialization always writes its own UTF-8 declaration
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        if !open.is_empty() {
            return Err(Error::InvalidXml {
                position: xml.len(),
                message: "unexpected end of input inside an element".into(),
            });
        }
        if doc.root_element().is_none() {
            return Err(Error::MissingRootElement);
        }

        Ok(doc)
    }
}

fn append_misc(doc: &mut Document, open: &[NodeKey], kind: NodeKind) {
    let parent = open.last().copied().unwrap_or(doc.document);
    let node = doc.create(kind);
    doc.append_child(parent, node);
}

/// Create the element for a start (or empty) tag, push its namespace scope
/// and attach it to the current parent.
fn start_element(
    doc: &mut Document,
    open: &[NodeKey],
    scopes: &mut Vec<Scope>,
    event: &BytesStart<'_>,
    position: usize,
) -> Result<NodeKey> {
    let invalid = |message: String| Error::InvalidXml { position, message };

    let name = std::str::from_utf8(event.name().as_ref())
        .map_err(|e| invalid(e.to_string()))?
        .to_string();

    let mut attributes = Vec::new();
    let mut scope: Scope = Vec::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|e| invalid(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| invalid(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| invalid(e.to_string()))?
            .into_owned();

        if key == "xmlns" {
            scope.push((None, value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value.clone()));
        }
        attributes.push(Attribute { name: key, value });
    }
    scopes.push(scope);

    if open.is_empty() && doc.root_element().is_some() {
        return Err(invalid("document has more than one root element".into()));
    }

    let (prefix, local) = match name.split_once(':') {
        Some((p, l)) => (Some(p.to_string()), l.to_string()),
        None => (None, name),
    };
    let namespace = resolve(scopes, prefix.as_deref());
    if prefix.is_some() && namespace.is_none() {
        return Err(invalid(format!(
            "unbound namespace prefix '{}'",
            prefix.as_deref().unwrap_or_default()
        )));
    }

    let key = doc.create_element(Element {
        prefix,
        local,
        namespace,
        attributes,
    });
    let parent = open.last().copied().unwrap_or(doc.document);
    doc.append_child(parent, key);
    Ok(key)
}

/// Innermost binding for `prefix` (`None` = default namespace).
fn resolve(scopes: &[Scope], prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some("http://www.w3.org/XML/1998/namespace".to_string());
    }
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}
