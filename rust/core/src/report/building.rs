// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Annual Building Utility Performance Summary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::numbers::extract_number;
use super::table::ReportDocument;
use super::{fuel_values, FuelValues};

pub const REPORT_NAME: &str = "Annual Building Utility Performance Summary";

/// Rows of the end-use tables that are not end uses.
const NON_END_USE_ROWS: [&str; 2] = ["Time of Peak", "Total End Uses"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteAndSourceEnergy {
    pub total_site_energy_gj: f64,
    pub net_site_energy_gj: f64,
    pub total_source_energy_gj: f64,
    pub net_source_energy_gj: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingArea {
    pub total: f64,
    pub conditioned: f64,
    pub unconditioned: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingPerformance {
    pub site_and_source_energy: SiteAndSourceEnergy,
    pub site_to_source_conversion_factors: IndexMap<String, f64>,
    pub building_area_m2: BuildingArea,
    /// End use → fuel → GJ.
    pub end_uses_gj: IndexMap<String, FuelValues>,
}

pub fn parse(doc: &ReportDocument) -> BuildingPerformance {
    BuildingPerformance {
        site_and_source_energy: site_and_source_energy(doc),
        site_to_source_conversion_factors: conversion_factors(doc),
        building_area_m2: building_area(doc),
        end_uses_gj: end_uses(doc),
    }
}

fn site_and_source_energy(doc: &ReportDocument) -> SiteAndSourceEnergy {
    let table = doc.section_table_in(REPORT_NAME, "Site and Source Energy");
    let value = |label: &str| {
        table
            .rows
            .iter()
            .find(|row| row.iter().any(|cell| cell.contains(label)))
            .and_then(|row| row.get(1))
            .map_or(0.0, |cell| extract_number(cell))
    };
    SiteAndSourceEnergy {
        total_site_energy_gj: value("Total Site Energy"),
        net_site_energy_gj: value("Net Site Energy"),
        total_source_energy_gj: value("Total Source Energy"),
        net_source_energy_gj: value("Net Source Energy"),
    }
}

fn conversion_factors(doc: &ReportDocument) -> IndexMap<String, f64> {
    let table = doc.section_table_in(REPORT_NAME, "Site to Source Energy Conversion Factors");
    table
        .rows_from(1)
        .iter()
        .filter_map(|row| {
            let key = row.first().filter(|k| !k.is_empty())?;
            let value = row.get(1).map_or(0.0, |v| extract_number(v));
            Some((key.clone(), value))
        })
        .collect()
}

fn building_area(doc: &ReportDocument) -> BuildingArea {
    let table = doc.section_table_in(REPORT_NAME, "Building Area");
    let mut areas: IndexMap<String, f64> = IndexMap::new();
    for row in table.rows_from(1) {
        let key: String = row
            .first()
            .map(|k| k.chars().filter(char::is_ascii_alphabetic).collect())
            .unwrap_or_default();
        let value = row.get(1).map_or(0.0, |v| extract_number(v));
        areas.insert(key.to_ascii_lowercase(), value);
    }
    let area = |key: &str| areas.get(key).copied().unwrap_or(0.0);
    BuildingArea {
        total: area("totalbuildingarea"),
        conditioned: area("netconditionedbuildingarea"),
        unconditioned: area("unconditionedbuildingarea"),
    }
}

fn end_uses(doc: &ReportDocument) -> IndexMap<String, FuelValues> {
    let table = doc.section_table_in(REPORT_NAME, "End Uses");
    table
        .rows_from(1)
        .iter()
        .filter_map(|row| {
            let category = row.first().filter(|c| !c.is_empty())?;
            if NON_END_USE_ROWS.contains(&category.as_str()) {
                return None;
            }
            Some((category.clone(), fuel_values(row, 1)))
        })
        .collect()
}
