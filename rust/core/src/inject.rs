// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter injection: write form values into a gbXML document.
//!
//! An [`Injector`] is compiled once from a [`FieldCatalog`] (all path
//! expressions parsed up front) and then applied to one document per
//! request. Scalar targets overwrite the first matching node. List-shaped
//! targets (HVAC template flags, output meters) are rebuilt wholesale from
//! the current values, so repeated injection never accumulates entries.

use rustc_hash::FxHashMap;

use crate::catalog::{FieldCatalog, FieldTarget};
use crate::error::Result;
use crate::path::{Namespaces, PathExpr};
use crate::xml::{Document, Element, NodeKey};

/// Flag value that enables template and meter entries.
const ENABLED: &str = "Yes";

const METER_ELEMENT: &str = "OutputMeter";
const METER_KEY_ELEMENT: &str = "KeyName";
const METER_FREQUENCY_ELEMENT: &str = "ReportingFrequency";

/// Submitted form values, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
    values: FxHashMap<String, String>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

/// What an injection pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// Targets that were written.
    pub applied: usize,
    /// Fields whose path matched nothing in this document.
    pub unresolved: Vec<String>,
    /// Submitted names that are not in the catalog.
    pub ignored: Vec<String>,
    /// Template flags and meters written after list replacement.
    pub list_entries: usize,
}

#[derive(Debug, Clone)]
enum Op {
    Text(PathExpr),
    TextIfPresent(PathExpr),
    Attribute(PathExpr, String),
    IndexedGain {
        path: PathExpr,
        index: usize,
        attribute: String,
        attribute_value: String,
    },
    Switch {
        path: PathExpr,
        when: String,
        yes: String,
        no: String,
    },
    TemplateFlag {
        container: PathExpr,
        element: String,
    },
    OutputMeter {
        key: String,
        frequency: String,
    },
}

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    default: String,
    op: Op,
}

/// A catalog compiled for repeated use.
#[derive(Debug, Clone)]
pub struct Injector {
    prefix: String,
    fields: Vec<CompiledField>,
    fixed: Vec<(PathExpr, String)>,
    meters: PathExpr,
}

impl Injector {
    /// Compile every path in `catalog`.
    pub fn new(catalog: &FieldCatalog) -> Result<Self> {
        catalog.validate()?;

        let mut fields = Vec::with_capacity(catalog.field_count());
        for spec in catalog.fields() {
            let op = match &spec.target {
                FieldTarget::Text { path } => Op::Text(PathExpr::parse(path)?),
                FieldTarget::TextIfPresent { path } => Op::TextIfPresent(PathExpr::parse(path)?),
                FieldTarget::Attribute { path, attribute } => {
                    Op::Attribute(PathExpr::parse(path)?, attribute.clone())
                }
                FieldTarget::IndexedGain {
                    path,
                    index,
                    attribute,
                    attribute_value,
                } => Op::IndexedGain {
                    path: PathExpr::parse(path)?,
                    index: *index,
                    attribute: attribute.clone(),
                    attribute_value: attribute_value.clone(),
                },
                FieldTarget::Switch { path, when, yes, no } => Op::Switch {
                    path: PathExpr::parse(path)?,
                    when: when.clone(),
                    yes: yes.clone(),
                    no: no.clone(),
                },
                FieldTarget::TemplateFlag { container, element } => Op::TemplateFlag {
                    container: PathExpr::parse(container)?,
                    element: element.clone(),
                },
                FieldTarget::OutputMeter { key, frequency } => Op::OutputMeter {
                    key: key.clone(),
                    frequency: frequency.clone(),
                },
            };
            fields.push(CompiledField {
                name: spec.name.clone(),
                default: spec.default.clone(),
                op,
            });
        }

        let fixed = catalog
            .fixed
            .iter()
            .map(|f| Ok((PathExpr::parse(&f.path)?, f.value.clone())))
            .collect::<Result<Vec<_>>>()?;

        let meters = PathExpr::parse(&format!("//{}:{}", catalog.prefix, METER_ELEMENT))?;

        Ok(Self {
            prefix: catalog.prefix.clone(),
            fields,
            fixed,
            meters,
        })
    }

    /// Parse an uploaded document and inject `values` into it.
    pub fn inject_upload(&self, bytes: &[u8], values: &FieldValues) -> Result<(Document, InjectionReport)> {
        let mut doc = Document::from_upload(bytes)?;
        let report = self.inject(&mut doc, values)?;
        Ok((doc, report))
    }

    /// Write every catalog field into `doc`.
    ///
    /// A field's value is the submitted one when present (even if empty),
    /// otherwise the catalog default. Paths that match nothing are skipped
    /// and listed in [`InjectionReport::unresolved`].
    pub fn inject(&self, doc: &mut Document, values: &FieldValues) -> Result<InjectionReport> {
        let mut report = InjectionReport::default();
        let root_namespace = doc.root_namespace().unwrap_or_default().to_string();
        let namespaces = Namespaces::new().with(&self.prefix, &root_namespace);

        let mut containers: Vec<(&PathExpr, Vec<(&str, &str)>)> = Vec::new();
        let mut meters: Vec<(&str, &str, &str)> = Vec::new();

        for field in &self.fields {
            let value = values.get(&field.name).unwrap_or(field.default.as_str());
            let written = match &field.op {
                Op::Text(path) => set_first_text(doc, &namespaces, path, value)?,
                Op::TextIfPresent(path) => {
                    if value.is_empty() {
                        continue;
                    }
                    set_first_text(doc, &namespaces, path, value)?
                }
                Op::Attribute(path, attribute) => match path.select_first(doc, &namespaces)? {
                    Some(node) => {
                        doc.set_attribute(node, attribute, value);
                        true
                    }
                    None => false,
                },
                Op::IndexedGain {
                    path,
                    index,
                    attribute,
                    attribute_value,
                } => match path.select(doc, &namespaces)?.get(*index) {
                    Some(&node) => {
                        doc.set_attribute(node, attribute, attribute_value);
                        doc.replace_text_content(node, value);
                        true
                    }
                    None => false,
                },
                Op::Switch { path, when, yes, no } => {
                    let text = if value == when.as_str() { yes } else { no };
                    set_first_text(doc, &namespaces, path, text)?
                }
                Op::TemplateFlag { container, element } => {
                    match containers
                        .iter_mut()
                        .find(|(p, _)| p.as_str() == container.as_str())
                    {
                        Some((_, flags)) => flags.push((element.as_str(), value)),
                        None => containers.push((container, vec![(element.as_str(), value)])),
                    }
                    continue;
                }
                Op::OutputMeter { key, frequency } => {
                    meters.push((key.as_str(), frequency.as_str(), value));
                    continue;
                }
            };

            if written {
                report.applied += 1;
            } else {
                tracing::debug!(field = %field.name, "No node matched field target");
                report.unresolved.push(field.name.clone());
            }
        }

        for (path, value) in &self.fixed {
            if set_first_text(doc, &namespaces, path, value)? {
                report.applied += 1;
            }
        }

        for (container, flags) in containers {
            let Some(parent) = container.select_first(doc, &namespaces)? else {
                tracing::debug!(container = %container, "Template container not present");
                continue;
            };
            doc.remove_children(parent);
            for (element, value) in flags {
                if value == ENABLED {
                    let child = self.new_element(doc, element);
                    doc.set_text(child, ENABLED);
                    doc.append_child(parent, child);
                    report.list_entries += 1;
                }
            }
        }

        if !meters.is_empty() {
            for existing in self.meters.select(doc, &namespaces)? {
                doc.remove(existing);
            }
            if let Some(root) = doc.root_element() {
                for (key, frequency, value) in meters {
                    if value != ENABLED {
                        continue;
                    }
                    let meter = self.new_element(doc, METER_ELEMENT);
                    let key_node = self.new_element(doc, METER_KEY_ELEMENT);
                    doc.set_text(key_node, key);
                    let frequency_node = self.new_element(doc, METER_FREQUENCY_ELEMENT);
                    doc.set_text(frequency_node, frequency);
                    doc.append_child(meter, key_node);
                    doc.append_child(meter, frequency_node);
                    doc.append_child(root, meter);
                    report.list_entries += 1;
                }
            }
        }

        report.ignored = values
            .names()
            .filter(|name| !self.fields.iter().any(|f| f.name == *name))
            .map(str::to_string)
            .collect();
        report.ignored.sort();

        tracing::debug!(
            applied = report.applied,
            unresolved = report.unresolved.len(),
            ignored = report.ignored.len(),
            list_entries = report.list_entries,
            "Injection complete"
        );

        Ok(report)
    }

    /// A detached element in the root's namespace, written with the root's
    /// prefix so it serializes without a fresh declaration.
    fn new_element(&self, doc: &mut Document, local: &str) -> NodeKey {
        let (prefix, namespace) = doc
            .root_element()
            .and_then(|k| doc.element(k))
            .map(|e| (e.prefix.clone(), e.namespace.clone()))
            .unwrap_or_default();
        doc.create_element(Element {
            prefix,
            local: local.to_string(),
            namespace,
            attributes: Vec::new(),
        })
    }
}

fn set_first_text(doc: &mut Document, namespaces: &Namespaces, path: &PathExpr, value: &str) -> Result<bool> {
    match path.select_first(doc, namespaces)? {
        Some(node) => {
            doc.set_text(node, value);
            Ok(true)
        }
        None => Ok(false),
    }
}
