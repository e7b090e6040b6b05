// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use serde::{Deserialize, Serialize};
use studiox_core::{FieldCatalog, InjectionReport};

/// Simulation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateResponse {
    /// Raw EnergyPlus tabular report (HTML).
    pub report: String,
    /// Cache key for this result (SHA256 of the mutated gbXML).
    pub cache_key: String,
    /// Processing statistics.
    pub stats: SimulationStats,
}

/// Simulation statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Run identifier used in logs and run directory names.
    pub run_id: String,
    /// Field targets written into the document.
    pub applied_fields: usize,
    /// Fields whose path matched nothing in the upload.
    pub unresolved_fields: Vec<String>,
    /// Submitted names not in the catalog.
    pub ignored_fields: Vec<String>,
    /// Template flags and output meters written.
    pub list_entries: usize,
    /// Report location inside the run directory.
    pub report_path: String,
    /// Time spent injecting and serializing (ms).
    pub inject_time_ms: u64,
    /// Time spent waiting for a simulation slot (ms).
    pub queue_time_ms: u64,
    /// Time the simulator ran (ms).
    pub simulation_time_ms: u64,
    /// Total processing time (ms).
    pub total_time_ms: u64,
    /// Whether result was from cache.
    pub from_cache: bool,
}

impl SimulationStats {
    pub fn with_injection(mut self, report: &InjectionReport) -> Self {
        self.applied_fields = report.applied;
        self.unresolved_fields = report.unresolved.clone();
        self.ignored_fields = report.ignored.clone();
        self.list_entries = report.list_entries;
        self
    }
}

/// Field catalog as shown on the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsResponse {
    pub field_count: usize,
    pub sections: Vec<SectionInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
    pub default: String,
}

impl From<&FieldCatalog> for FieldsResponse {
    fn from(catalog: &FieldCatalog) -> Self {
        Self {
            field_count: catalog.field_count(),
            sections: catalog
                .sections
                .iter()
                .map(|section| SectionInfo {
                    name: section.name.clone(),
                    fields: section
                        .fields
                        .iter()
                        .map(|f| FieldInfo {
                            name: f.name.clone(),
                            label: f.label.clone(),
                            default: f.default.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
