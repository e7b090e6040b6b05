// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mutable XML documents.
//!
//! [`Document`] is an arena-backed tree built from [quick-xml](https://docs.rs/quick-xml)
//! events. Namespaces are resolved at parse time so path queries can match
//! on namespace URI rather than on whatever prefix a file happens to use.

mod document;
mod reader;
mod writer;

pub use document::{Attribute, Document, Element, NodeKey, NodeKind};
