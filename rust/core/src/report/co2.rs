// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CO2 Resilience Summary.

use serde::{Deserialize, Serialize};

use super::numbers::extract_number;
use super::table::ReportDocument;

pub const REPORT_NAME: &str = "CO2 Resilience Summary";

/// Hours spent in each CO2 level band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Co2Hours {
    pub safe_hours: f64,
    pub caution_hours: f64,
    pub hazard_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Co2ResilienceSummary {
    pub timestamp: Option<String>,
    pub facility: Option<String>,
    pub co2_level_hours: Option<Co2Hours>,
    pub co2_level_occupanthours: Option<Co2Hours>,
    pub co2_level_occupiedhours: Option<Co2Hours>,
}

pub fn parse(doc: &ReportDocument, timestamp: Option<&str>, facility: Option<&str>) -> Co2ResilienceSummary {
    Co2ResilienceSummary {
        timestamp: timestamp.map(str::to_string),
        facility: facility.map(str::to_string),
        co2_level_hours: hours(doc, "CO2 Level Hours"),
        co2_level_occupanthours: hours(doc, "CO2 Level OccupantHours"),
        co2_level_occupiedhours: hours(doc, "CO2 Level OccupiedHours"),
    }
}

/// Bands of the first data row; `None` when the table has no data row.
fn hours(doc: &ReportDocument, title: &str) -> Option<Co2Hours> {
    let table = doc.section_table_in(REPORT_NAME, title);
    if table.len() < 2 {
        return None;
    }
    Some(Co2Hours {
        safe_hours: extract_number(table.cell(1, 1)),
        caution_hours: extract_number(table.cell(1, 2)),
        hazard_hours: extract_number(table.cell(1, 3)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_bands() {
        let html = r#"
<p>Report:<b> CO2 Resilience Summary</b></p>
<b>CO2 Level Hours</b>
<table>
  <tr><td></td><td>Safe (&lt;= 1000 ppm) [hr]</td><td>Caution [hr]</td><td>Hazard [hr]</td></tr>
  <tr><td>THERMAL ZONE 1</td><td>8,000.00</td><td>700.5</td></tr>
</table>
<b>CO2 Level OccupantHours</b>
<table><tr><td>header only</td></tr></table>"#;
        let co2 = parse(&ReportDocument::parse(html), None, Some("Entire Facility"));
        let hours = co2.co2_level_hours.unwrap();
        assert_eq!(hours.safe_hours, 8000.0);
        assert_eq!(hours.caution_hours, 700.5);
        assert_eq!(hours.hazard_hours, 0.0);
        assert_eq!(co2.co2_level_occupanthours, None);
        assert_eq!(co2.co2_level_occupiedhours, None);
    }

    #[test]
    fn test_serializes_missing_tables_as_null() {
        let co2 = parse(&ReportDocument::parse(""), None, None);
        let json = serde_json::to_value(&co2).unwrap();
        assert!(json["co2_level_hours"].is_null());
        assert!(json["timestamp"].is_null());
    }
}
