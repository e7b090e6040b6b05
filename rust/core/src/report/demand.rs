// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Demand End Use Components Summary: instantaneous demand at the time of
//! each fuel's peak, in W.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::table::ReportDocument;
use super::{fuel_values, FuelValues};

pub const REPORT_NAME: &str = "Demand End Use Components Summary";

/// Rows of the demand table that are not end uses. `None` is the label
/// EnergyPlus prints when a fuel never peaks.
const NON_END_USE_ROWS: [&str; 3] = ["Time of Peak", "None", "Total End Uses"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandEndUseComponents {
    /// End use → fuel → W.
    pub peak_demand_w: IndexMap<String, FuelValues>,
    /// Subcategory row label → fuel → W. Continuation rows with an empty
    /// label are skipped.
    pub by_subcategory_w: IndexMap<String, FuelValues>,
}

pub fn parse(doc: &ReportDocument) -> DemandEndUseComponents {
    let peak = doc.section_table_in(REPORT_NAME, "End Uses");
    let peak_demand_w = peak
        .rows_from(1)
        .iter()
        .filter_map(|row| {
            let category = row.first().filter(|c| !c.is_empty())?;
            if NON_END_USE_ROWS.contains(&category.as_str()) {
                return None;
            }
            Some((category.clone(), fuel_values(row, 1)))
        })
        .collect();

    // Column 1 holds the subcategory name; fuels start at column 2.
    let subcategories = doc.section_table_in(REPORT_NAME, "End Uses By Subcategory");
    let by_subcategory_w = subcategories
        .rows_from(1)
        .iter()
        .filter_map(|row| {
            let category = row.first().filter(|c| !c.is_empty())?;
            Some((category.clone(), fuel_values(row, 2)))
        })
        .collect();

    DemandEndUseComponents {
        peak_demand_w,
        by_subcategory_w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"
<p>Report:<b> Annual Building Utility Performance Summary</b></p>
<b>End Uses</b>
<table>
  <tr><td></td><td>Electricity [GJ]</td></tr>
  <tr><td>Heating</td><td>99.0</td></tr>
</table>
<p>Report:<b> Demand End Use Components Summary</b></p>
<b>End Uses</b>
<table>
  <tr><td></td><td>Electricity [W]</td><td>Natural Gas [W]</td></tr>
  <tr><td>Time of Peak</td><td>21-JAN-07:15</td><td>21-JAN-07:15</td></tr>
  <tr><td>Heating</td><td>1,500.00</td><td>8000.00</td></tr>
  <tr><td>Cooling</td><td>2500.00</td><td>0.00</td></tr>
  <tr><td>None</td><td>0.00</td><td>0.00</td></tr>
  <tr><td>Total End Uses</td><td>4000.00</td><td>8000.00</td></tr>
</table>
<b>End Uses By Subcategory</b>
<table>
  <tr><td></td><td>Subcategory</td><td>Electricity [W]</td></tr>
  <tr><td>Heating</td><td>General</td><td>1500.00</td></tr>
  <tr><td></td><td>Boiler Parasitic</td><td>12.00</td></tr>
  <tr><td>Interior Lighting</td><td>GeneralLights</td><td>900.00</td></tr>
</table>
"#;

    #[test]
    fn test_peak_demand_is_scoped_to_demand_report() {
        let demand = parse(&ReportDocument::parse(REPORT));
        let keys: Vec<_> = demand.peak_demand_w.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Heating", "Cooling"]);
        assert_eq!(demand.peak_demand_w["Heating"]["Electricity"], 1500.0);
        assert_eq!(demand.peak_demand_w["Heating"]["Natural Gas"], 8000.0);
        assert_eq!(demand.peak_demand_w["Cooling"]["Electricity"], 2500.0);
    }

    #[test]
    fn test_subcategory_values_start_at_second_column() {
        let demand = parse(&ReportDocument::parse(REPORT));
        let keys: Vec<_> = demand.by_subcategory_w.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Heating", "Interior Lighting"]);
        assert_eq!(demand.by_subcategory_w["Interior Lighting"]["Electricity"], 900.0);
    }

    #[test]
    fn test_demand_report_without_section_does_not_borrow_energy_table() {
        let html = REPORT.replace(
            "<p>Report:<b> Demand End Use Components Summary</b></p>\n<b>End Uses</b>",
            "<p>Report:<b> Demand End Use Components Summary</b></p>\n<b>Peak Notes</b>",
        );
        let demand = parse(&ReportDocument::parse(&html));
        assert!(demand.peak_demand_w.is_empty());
        assert!(demand.by_subcategory_w.contains_key("Interior Lighting"));
    }

    #[test]
    fn test_missing_report_is_empty() {
        let demand = parse(&ReportDocument::parse("<p/>"));
        assert!(demand.peak_demand_w.is_empty());
        assert!(demand.by_subcategory_w.is_empty());
    }
}
