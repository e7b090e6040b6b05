// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dashboard figures derived from an extracted report.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{ExtractedReport, FuelValues};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakLoads {
    pub heating_kw: f64,
    pub cooling_kw: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportKpis {
    pub total_site_energy_gj: f64,
    pub net_site_energy_gj: f64,
    pub total_source_energy_gj: f64,
    pub net_source_energy_gj: f64,
    pub total_area_m2: f64,
    /// Site energy use intensity in MJ/m², one decimal.
    pub eui_mj_per_m2: f64,
    /// End use → GJ summed over fuels.
    pub end_use_totals_gj: IndexMap<String, f64>,
    pub peak_loads: PeakLoads,
    /// Subcategory → kW summed over fuels.
    pub subcategory_demand_kw: IndexMap<String, f64>,
}

impl ReportKpis {
    pub fn from_report(report: &ExtractedReport) -> Self {
        let building = &report.building_performance;
        let energy = &building.site_and_source_energy;
        let demand = &report.demand_end_use_components;
        let total_area = building.building_area_m2.total;

        ReportKpis {
            total_site_energy_gj: energy.total_site_energy_gj,
            net_site_energy_gj: energy.net_site_energy_gj,
            total_source_energy_gj: energy.total_source_energy_gj,
            net_source_energy_gj: energy.net_source_energy_gj,
            total_area_m2: total_area,
            eui_mj_per_m2: eui(energy.total_site_energy_gj, total_area),
            end_use_totals_gj: building
                .end_uses_gj
                .iter()
                .map(|(category, fuels)| (category.clone(), fuel_sum(fuels)))
                .collect(),
            peak_loads: PeakLoads {
                heating_kw: demand.peak_demand_w.get("Heating").map_or(0.0, kilo),
                cooling_kw: demand.peak_demand_w.get("Cooling").map_or(0.0, kilo),
            },
            subcategory_demand_kw: demand
                .by_subcategory_w
                .iter()
                .map(|(category, fuels)| (category.clone(), kilo(fuels)))
                .collect(),
        }
    }
}

/// MJ/m² from GJ and m²; `0` without a positive area.
pub fn eui(total_site_energy_gj: f64, area_m2: f64) -> f64 {
    if area_m2 <= 0.0 {
        return 0.0;
    }
    (total_site_energy_gj * 1000.0 / area_m2 * 10.0).round() / 10.0
}

fn fuel_sum(fuels: &FuelValues) -> f64 {
    fuels.values().sum()
}

fn kilo(fuels: &FuelValues) -> f64 {
    fuel_sum(fuels) / 1000.0
}
