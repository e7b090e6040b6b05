// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena storage for a mutable XML tree.
//!
//! Every node lives in a [`SlotMap`] keyed by [`NodeKey`]. Parent links and
//! ordered child lists give the same navigation a DOM offers, but mutation
//! never invalidates keys held by other nodes: removing a subtree frees its
//! slots and detaches it from the parent's child list.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable key of a node inside a [`Document`].
    pub struct NodeKey;
}

/// An attribute as written in the source, qualified name included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element payload: qualified name, resolved namespace and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub prefix: Option<String>,
    pub local: String,
    /// Namespace URI the prefix (or default namespace) resolved to.
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element with no attributes.
    pub fn new(prefix: Option<&str>, local: &str, namespace: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
        }
    }

    /// Name as it appears in markup (`prefix:local` or `local`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Look up an attribute value by its written name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

/// Node payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic owner of the root element and top-level misc nodes.
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

/// A parsed, mutable XML document.
///
/// # Example
///
/// ```
/// use studiox_core::xml::Document;
///
/// let mut doc = Document::parse("<a><b>old</b></a>").unwrap();
/// let root = doc.root_element().unwrap();
/// let b = doc.children(root)[0];
/// doc.set_text(b, "new");
/// assert_eq!(doc.first_text(b), Some("new"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: SlotMap<NodeKey, NodeData>,
    pub(crate) document: NodeKey,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document (no root element yet).
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let document = nodes.insert(NodeData {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, document }
    }

    /// Key of the synthetic document node.
    pub fn document_node(&self) -> NodeKey {
        self.document
    }

    /// The first element child of the document node.
    pub fn root_element(&self) -> Option<NodeKey> {
        self.children(self.document)
            .iter()
            .copied()
            .find(|&k| self.element(k).is_some())
    }

    /// Namespace URI of the root element, if any.
    pub fn root_namespace(&self) -> Option<&str> {
        self.root_element()
            .and_then(|k| self.element(k))
            .and_then(|e| e.namespace.as_deref())
    }

    /// Number of live nodes, the document node included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(key).map(|n| &n.kind)
    }

    pub fn element(&self, key: NodeKey) -> Option<&Element> {
        match self.kind(key) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, key: NodeKey) -> Option<&mut Element> {
        match self.nodes.get_mut(key).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Element children only.
    pub fn child_elements(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        self.children(key)
            .iter()
            .copied()
            .filter(move |&k| self.element(k).is_some())
    }

    /// `key` followed by all of its descendants in document order.
    pub fn descendants_or_self(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Data of the first child when that child is a text node.
    pub fn first_text(&self, key: NodeKey) -> Option<&str> {
        let first = *self.children(key).first()?;
        match self.kind(first) {
            Some(NodeKind::Text(t)) | Some(NodeKind::CData(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self, key: NodeKey) -> String {
        let mut out = String::new();
        for k in self.descendants_or_self(key) {
            if let Some(NodeKind::Text(t)) | Some(NodeKind::CData(t)) = self.kind(k) {
                out.push_str(t);
            }
        }
        out
    }

    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.element(key).and_then(|e| e.attribute(name))
    }

    /// Overwrite the first text child, or append a text node when the first
    /// child is not text (or there are no children).
    pub fn set_text(&mut self, key: NodeKey, value: &str) {
        if let Some(&first) = self.children(key).first() {
            if let Some(NodeKind::Text(t)) = self.nodes.get_mut(first).map(|n| &mut n.kind) {
                *t = value.to_string();
                return;
            }
        }
        let text = self.create_text(value);
        self.append_child(key, text);
    }

    /// Replace every child of `key` with a single text node.
    pub fn replace_text_content(&mut self, key: NodeKey, value: &str) {
        self.remove_children(key);
        if !value.is_empty() {
            let text = self.create_text(value);
            self.append_child(key, text);
        }
    }

    /// Set or overwrite an attribute. No-op for non-element nodes.
    pub fn set_attribute(&mut self, key: NodeKey, name: &str, value: &str) {
        if let Some(element) = self.element_mut(key) {
            match element.attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value.to_string(),
                None => element.attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
            }
        }
    }

    /// Insert a detached node.
    pub(crate) fn create(&mut self, kind: NodeKind) -> NodeKey {
        self.nodes.insert(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        })
    }

    /// Create a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeKey {
        self.create(NodeKind::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, value: &str) -> NodeKey {
        self.create(NodeKind::Text(value.to_string()))
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, key: NodeKey) {
        if let Some(parent) = self.parent(key) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|&c| c != key);
            }
        }
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = None;
        }
    }

    /// Detach `key` and free its whole subtree.
    pub fn remove(&mut self, key: NodeKey) {
        if key == self.document {
            return;
        }
        self.detach(key);
        for k in self.descendants_or_self(key) {
            self.nodes.remove(k);
        }
    }

    /// Free every child subtree of `key`.
    pub fn remove_children(&mut self, key: NodeKey) {
        let children: Vec<NodeKey> = self.children(key).to_vec();
        for child in children {
            self.remove(child);
        }
    }
}
