// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field catalog: which form field writes to which node of the gbXML.
//!
//! The catalog is plain data so a different schema version can be targeted
//! by loading another JSON file instead of editing the injector. Paths are
//! written with the `gb` prefix (see [`FieldCatalog::prefix`]), which the
//! injector binds to the namespace of the uploaded document's root.

mod builtin;

use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::PathExpr;

/// How a field value is written into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldTarget {
    /// Overwrite the first matching node's text.
    Text { path: String },
    /// Like `Text`, skipped when the value is empty.
    TextIfPresent { path: String },
    /// Set an attribute on the first matching element.
    Attribute { path: String, attribute: String },
    /// Tag the `index`-th (0-based) match with `attribute=attribute_value`
    /// and replace its whole content with the value.
    IndexedGain {
        path: String,
        index: usize,
        attribute: String,
        attribute_value: String,
    },
    /// Write `yes` when the value equals `when`, otherwise `no`.
    Switch {
        path: String,
        when: String,
        yes: String,
        no: String,
    },
    /// One child `element` of `container`, present when the value is `Yes`.
    /// All flags sharing a container rebuild it from scratch.
    TemplateFlag { container: String, element: String },
    /// One meter appended to the root when the value is `Yes`. Existing
    /// meters are always removed first.
    OutputMeter { key: String, frequency: String },
}

impl FieldTarget {
    /// Path expressions referenced by this target.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            FieldTarget::Text { path }
            | FieldTarget::TextIfPresent { path }
            | FieldTarget::Attribute { path, .. }
            | FieldTarget::IndexedGain { path, .. }
            | FieldTarget::Switch { path, .. } => vec![path.as_str()],
            FieldTarget::TemplateFlag { container, .. } => vec![container.as_str()],
            FieldTarget::OutputMeter { .. } => Vec::new(),
        }
    }
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub default: String,
    pub target: FieldTarget,
}

/// A titled group of fields, as shown on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

/// A value written on every run regardless of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedValue {
    pub path: String,
    pub value: String,
}

fn default_prefix() -> String {
    "gb".to_string()
}

/// The complete catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalog {
    /// Prefix bound to the root namespace when evaluating paths.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub sections: Vec<Section>,
    #[serde(default)]
    pub fixed: Vec<FixedValue>,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldCatalog {
    /// The catalog for gbXML documents consumed by the OpenStudio
    /// `convert.osw` workflow.
    pub fn builtin() -> Self {
        builtin::catalog()
    }

    /// Decode and validate a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: FieldCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a JSON catalog from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// All fields in form order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.name == name)
    }

    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    /// Field name → default value, in form order.
    pub fn defaults(&self) -> IndexMap<String, String> {
        self.fields()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }

    /// Check that field names are unique and every path parses.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(Error::InvalidCatalog("namespace prefix is empty".into()));
        }

        let mut names = FxHashSet::default();
        for field in self.fields() {
            if field.name.is_empty() {
                return Err(Error::InvalidCatalog("field with empty name".into()));
            }
            if !names.insert(field.name.as_str()) {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            for path in field.target.paths() {
                self.check_path(path)?;
            }
        }

        for fixed in &self.fixed {
            self.check_path(&fixed.path)?;
        }
        Ok(())
    }

    /// The path parses and names no prefix other than [`Self::prefix`], the
    /// only one the injector binds.
    fn check_path(&self, path: &str) -> Result<()> {
        let expr = PathExpr::parse(path)?;
        if let Some(other) = expr.prefixes().find(|p| *p != self.prefix) {
            return Err(Error::InvalidCatalog(format!(
                "path '{}' uses unbound prefix '{}' (catalog prefix is '{}')",
                path, other, self.prefix
            )));
        }
        Ok(())
    }
}
