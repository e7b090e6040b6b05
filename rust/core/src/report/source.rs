// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source Energy End Use Components Summary.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::numbers::parse_optional_number;
use super::table::ReportDocument;

pub const REPORT_NAME: &str = "Source Energy End Use Components Summary";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEndUse {
    pub category: String,
    /// Column header → value; `None` for not-applicable cells.
    pub values: IndexMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEnergySummary {
    pub report_name: String,
    /// Empty when the report carries no timestamp.
    pub timestamp: String,
    pub end_uses: Vec<SourceEndUse>,
}

impl Default for SourceEnergySummary {
    fn default() -> Self {
        Self {
            report_name: REPORT_NAME.to_string(),
            timestamp: String::new(),
            end_uses: Vec::new(),
        }
    }
}

/// Header row first, a units/blank row second, totals last; only the rows
/// in between are end uses.
pub fn parse(doc: &ReportDocument, timestamp: Option<&str>) -> SourceEnergySummary {
    let mut table = doc.section_table(REPORT_NAME);
    if table.is_empty() {
        tracing::debug!("Source energy summary heading not found, using first table");
        table = doc.first_table();
    }

    let mut summary = SourceEnergySummary {
        timestamp: timestamp.unwrap_or_default().to_string(),
        ..Default::default()
    };
    if table.len() < 3 {
        return summary;
    }

    let headers = table.rows[0].get(1..).unwrap_or(&[]);
    for row in &table.rows[2..table.len() - 1] {
        let category = row.first().cloned().unwrap_or_default();
        let values = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = row.get(idx + 1).and_then(|cell| parse_optional_number(cell));
                (header.clone(), value)
            })
            .collect();
        summary.end_uses.push(SourceEndUse { category, values });
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"
<p>Report:<b> Source Energy End Use Components Summary</b></p>
<b>Source Energy End Use Components Summary</b>
<table>
  <tr><td></td><td>Source Electricity [GJ]</td><td>Source Natural Gas [GJ]</td></tr>
  <tr><td></td><td></td><td></td></tr>
  <tr><td>Heating</td><td>1,234.00</td><td>-</td></tr>
  <tr><td>Cooling</td><td>56.5</td></tr>
  <tr><td>Total Source Energy End Use Components</td><td>1290.5</td><td>0</td></tr>
</table>
"#;

    #[test]
    fn test_rows_between_header_and_total() {
        let summary = parse(&ReportDocument::parse(REPORT), Some("2024-05-01 12:00:00"));
        assert_eq!(summary.report_name, REPORT_NAME);
        assert_eq!(summary.timestamp, "2024-05-01 12:00:00");
        assert_eq!(summary.end_uses.len(), 2);

        let heating = &summary.end_uses[0];
        assert_eq!(heating.category, "Heating");
        assert_eq!(heating.values["Source Electricity [GJ]"], Some(1234.0));
        assert_eq!(heating.values["Source Natural Gas [GJ]"], None);

        let cooling = &summary.end_uses[1];
        assert_eq!(cooling.values["Source Electricity [GJ]"], Some(56.5));
        assert_eq!(cooling.values["Source Natural Gas [GJ]"], None);
    }

    #[test]
    fn test_falls_back_to_first_table() {
        let html = "<table><tr><td></td><td>A</td></tr><tr></tr>\
                    <tr><td>Fans</td><td>3</td></tr><tr><td>Total</td><td>3</td></tr></table>";
        let summary = parse(&ReportDocument::parse(html), None);
        assert_eq!(summary.timestamp, "");
        assert_eq!(summary.end_uses.len(), 1);
        assert_eq!(summary.end_uses[0].values["A"], Some(3.0));
    }

    #[test]
    fn test_short_table_yields_no_rows() {
        let html = "<table><tr><td></td><td>A</td></tr><tr><td>x</td></tr></table>";
        let summary = parse(&ReportDocument::parse(html), None);
        assert!(summary.end_uses.is_empty());
    }
}
