// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # StudioX Core
//!
//! gbXML parameterization and EnergyPlus report extraction for the StudioX
//! building-energy dashboard.
//!
//! ## Overview
//!
//! - **XML Document**: Arena-backed, namespace-aware mutable tree built on
//!   [quick-xml](https://docs.rs/quick-xml)
//! - **Path Queries**: A small XPath subset parsed with [nom](https://docs.rs/nom)
//! - **Field Catalog**: Serde data mapping form fields to gbXML targets
//! - **Injection**: Writes form values into a document, rebuilding
//!   list-shaped sections wholesale
//! - **Report Extraction**: Reads the tabular HTML report with
//!   [scraper](https://docs.rs/scraper) into six fixed categories
//!
//! ## Quick Start
//!
//! ```rust
//! use studiox_core::{FieldCatalog, FieldValues, Injector};
//!
//! let catalog = FieldCatalog::builtin();
//! let injector = Injector::new(&catalog).unwrap();
//!
//! let upload = br#"<?xml version="1.0"?>
//! <gbXML xmlns="http://www.gbxml.org/schema">
//!   <Campus><Location><Name>Old</Name></Location></Campus>
//! </gbXML>"#;
//! let values: FieldValues = [("locName", "Busan, KR")].into_iter().collect();
//! let (doc, report) = injector.inject_upload(upload, &values).unwrap();
//!
//! assert!(report.applied > 0);
//! assert!(doc.to_xml_string().unwrap().contains("<Name>Busan, KR</Name>"));
//! ```
//!
//! Extraction never fails; sections missing from the report come back
//! empty:
//!
//! ```rust
//! use studiox_core::extract_report;
//!
//! let report = extract_report("<html></html>");
//! assert!(report.building_performance.end_uses_gj.is_empty());
//! ```

pub mod catalog;
pub mod error;
pub mod inject;
pub mod path;
pub mod report;
pub mod xml;

pub use catalog::{FieldCatalog, FieldSpec, FieldTarget, FixedValue, Section};
pub use error::{Error, Result};
pub use inject::{FieldValues, InjectionReport, Injector};
pub use path::{Namespaces, PathExpr};
pub use report::{extract_report, ExtractedReport, ReportKpis};
pub use xml::{Document, NodeKey};
