// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialize a [`Document`] back to XML text.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::document::{Document, NodeKey, NodeKind};
use crate::error::{Error, Result};

fn xml_error(err: quick_xml::Error) -> Error {
    Error::Serialize(err.to_string())
}

impl Document {
    /// Serialize the document with a UTF-8 XML declaration.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new("\n")))
            .map_err(xml_error)?;

        for &child in self.children(self.document) {
            self.write_node(&mut writer, child)?;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Serialize to bytes, as written to disk for the simulator.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        self.to_xml_string().map(String::into_bytes)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, key: NodeKey) -> Result<()> {
        let Some(kind) = self.kind(key) else {
            return Ok(());
        };

        match kind {
            NodeKind::Document => {}
            NodeKind::Element(element) => {
                let name = element.qualified_name();
                let mut start = BytesStart::new(name.as_str());
                for attr in &element.attributes {
                    start.push_attribute((attr.name.as_str(), attr.value.as_str()));
                }

                let children = self.children(key);
                if children.is_empty() {
                    writer.write_event(Event::Empty(start)).map_err(xml_error)?;
                } else {
                    writer.write_event(Event::Start(start)).map_err(xml_error)?;
                    for &child in children {
                        self.write_node(writer, child)?;
                    }
                    writer
                        .write_event(Event::End(BytesEnd::new(name.as_str())))
                        .map_err(xml_error)?;
                }
            }
            NodeKind::Text(text) => {
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(xml_error)?;
            }
            NodeKind::CData(text) => {
                writer
                    .write_event(Event::CData(BytesCData::new(text.as_str())))
                    .map_err(xml_error)?;
            }
            NodeKind::Comment(text) => {
                writer
                    .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                    .map_err(xml_error)?;
            }
            NodeKind::ProcessingInstruction(text) => {
                writer
                    .write_event(Event::PI(BytesText::from_escaped(text.as_str())))
                    .map_err(xml_error)?;
            }
            NodeKind::DocType(text) => {
                writer
                    .write_event(Event::DocType(BytesText::from_escaped(text.as_str())))
                    .map_err(xml_error)?;
            }
        }
        Ok(())
    }
}
