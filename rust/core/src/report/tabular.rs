// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reports whose tables are returned row by row: HVAC Sizing Summary and
//! Lighting Summary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::numbers::{hvac_header_key, lighting_header_key, CellValue};
use super::table::{ReportDocument, SectionTable};

pub const HVAC_REPORT_NAME: &str = "HVAC Sizing Summary";
pub const LIGHTING_REPORT_NAME: &str = "Lighting Summary";

/// One table row keyed by normalized header.
pub type RowObject = IndexMap<String, CellValue>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HvacSizingSummary {
    pub timestamp: Option<String>,
    pub facility: Option<String>,
    pub space_sensible_cooling: Vec<RowObject>,
    pub zone_sensible_cooling: Vec<RowObject>,
    pub space_sensible_heating: Vec<RowObject>,
    pub zone_sensible_heating: Vec<RowObject>,
    pub system_design_air_flow_rates: Vec<RowObject>,
    pub plant_loop_coincident_design_fluid_flow_rate_adjustments: Vec<RowObject>,
    pub coil_sizing_summary: Vec<RowObject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingSummary {
    pub timestamp: Option<String>,
    pub facility: Option<String>,
    pub interior_lighting: Vec<RowObject>,
    pub daylighting: Vec<RowObject>,
    pub exterior_lighting: Vec<RowObject>,
}

pub fn parse_hvac(doc: &ReportDocument, timestamp: Option<&str>, facility: Option<&str>) -> HvacSizingSummary {
    let section = |title: &str| row_objects(&doc.section_table_in(HVAC_REPORT_NAME, title), hvac_header_key);
    HvacSizingSummary {
        timestamp: timestamp.map(str::to_string),
        facility: facility.map(str::to_string),
        space_sensible_cooling: section("Space Sensible Cooling"),
        zone_sensible_cooling: section("Zone Sensible Cooling"),
        space_sensible_heating: section("Space Sensible Heating"),
        zone_sensible_heating: section("Zone Sensible Heating"),
        system_design_air_flow_rates: section("System Design Air Flow Rates"),
        plant_loop_coincident_design_fluid_flow_rate_adjustments: section(
            "Plant Loop Coincident Design Fluid Flow Rate Adjustments",
        ),
        coil_sizing_summary: section("Coil Sizing Summary"),
    }
}

pub fn parse_lighting(doc: &ReportDocument, timestamp: Option<&str>, facility: Option<&str>) -> LightingSummary {
    let section =
        |title: &str| row_objects(&doc.section_table_in(LIGHTING_REPORT_NAME, title), lighting_header_key);
    LightingSummary {
        timestamp: timestamp.map(str::to_string),
        facility: facility.map(str::to_string),
        interior_lighting: section("Interior Lighting"),
        daylighting: section("Daylighting"),
        exterior_lighting: section("Exterior Lighting"),
    }
}

/// Every row after the header as an object. Tables with fewer than two
/// rows have no data.
fn row_objects(table: &SectionTable, key: fn(&str) -> String) -> Vec<RowObject> {
    if table.len() < 2 {
        return Vec::new();
    }
    let headers: Vec<String> = table.rows[0].iter().map(|h| key(h)).collect();
    table
        .rows_from(1)
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let cell = row.get(idx).map_or("", String::as_str);
                    (header.clone(), CellValue::from_cell(cell))
                })
                .collect()
        })
        .collect()
}
