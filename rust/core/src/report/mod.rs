// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report extraction: EnergyPlus tabular HTML → fixed-shape JSON.
//!
//! Each category parser is independent. A section that is missing from the
//! report yields empty or zero values for that part only; extraction never
//! fails.
//!
//! ```
//! use studiox_core::report::extract_report;
//!
//! let html = r#"<p>Report:<b> Annual Building Utility Performance Summary</b></p>
//!     <b>Site and Source Energy</b>
//!     <table><tr><td></td><td>Total Energy [GJ]</td></tr>
//!     <tr><td>Total Site Energy</td><td>123.4</td></tr></table>"#;
//! let report = extract_report(html);
//! let energy = &report.building_performance.site_and_source_energy;
//! assert_eq!(energy.total_site_energy_gj, 123.4);
//! assert_eq!(report.kpis().eui_mj_per_m2, 0.0);
//! ```

pub mod building;
pub mod co2;
pub mod demand;
mod kpi;
mod numbers;
pub mod source;
mod table;
pub mod tabular;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use building::BuildingPerformance;
pub use co2::Co2ResilienceSummary;
pub use demand::DemandEndUseComponents;
pub use kpi::{eui, PeakLoads, ReportKpis};
pub use numbers::{extract_number, parse_optional_number, CellValue};
pub use source::SourceEnergySummary;
pub use table::{ReportDocument, SectionTable};
pub use tabular::{HvacSizingSummary, LightingSummary, RowObject};

/// Fuel columns of the end-use tables, in report order.
pub const FUELS: [&str; 14] = [
    "Electricity",
    "Natural Gas",
    "Gasoline",
    "Diesel",
    "Coal",
    "Fuel Oil No 1",
    "Fuel Oil No 2",
    "Propane",
    "Other Fuel 1",
    "Other Fuel 2",
    "District Cooling",
    "District Heating Water",
    "District Heating Steam",
    "Water",
];

/// Fuel → value, always holding all of [`FUELS`].
pub type FuelValues = IndexMap<String, f64>;

/// Values of `row` for each fuel, reading from column `first_column`.
pub(crate) fn fuel_values(row: &[String], first_column: usize) -> FuelValues {
    FUELS
        .iter()
        .enumerate()
        .map(|(idx, fuel)| {
            let value = row.get(first_column + idx).map_or(0.0, |c| extract_number(c));
            (fuel.to_string(), value)
        })
        .collect()
}

/// The six report categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReport {
    pub building_performance: BuildingPerformance,
    pub demand_end_use_components: DemandEndUseComponents,
    pub source_energy_end_use_components_summary: SourceEnergySummary,
    pub hvac_sizing_summary: HvacSizingSummary,
    pub lighting_summary: LightingSummary,
    pub co2_resilience_summary: Co2ResilienceSummary,
}

impl ExtractedReport {
    pub fn kpis(&self) -> ReportKpis {
        ReportKpis::from_report(self)
    }
}

/// Extract every category from report HTML.
pub fn extract_report(html: &str) -> ExtractedReport {
    let doc = ReportDocument::parse(html);
    let timestamp = numbers::report_timestamp(html);
    let facility = numbers::report_facility(html);
    let (timestamp, facility) = (timestamp.as_deref(), facility.as_deref());

    let report = ExtractedReport {
        building_performance: building::parse(&doc),
        demand_end_use_components: demand::parse(&doc),
        source_energy_end_use_components_summary: source::parse(&doc, timestamp),
        hvac_sizing_summary: tabular::parse_hvac(&doc, timestamp, facility),
        lighting_summary: tabular::parse_lighting(&doc, timestamp, facility),
        co2_resilience_summary: co2::parse(&doc, timestamp, facility),
    };

    tracing::debug!(
        tables = doc.table_count(),
        end_uses = report.building_performance.end_uses_gj.len(),
        "Extracted report"
    );
    report
}
