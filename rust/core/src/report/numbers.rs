// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cell coercion and report metadata.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A table cell as it appears in row objects: numeric when it parses,
/// otherwise its text, `null` when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Null,
}

impl CellValue {
    pub fn from_cell(text: &str) -> Self {
        if let Some(n) = parse_number(text) {
            CellValue::Number(n)
        } else if text.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(text.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Strip thousands separators and spaces, then parse. Non-finite values
/// are rejected.
fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | ' ')).collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric cell value, `0` when the cell is empty or not a number.
///
/// ```
/// use studiox_core::report::extract_number;
///
/// assert_eq!(extract_number("1,234.5"), 1234.5);
/// assert_eq!(extract_number("-"), 0.0);
/// ```
pub fn extract_number(text: &str) -> f64 {
    parse_number(text).unwrap_or(0.0)
}

/// Numeric cell value, `None` for not-applicable cells (`-`, empty) and for
/// text that is not a number.
pub fn parse_optional_number(text: &str) -> Option<f64> {
    match text {
        "" | "-" => None,
        other => parse_number(other),
    }
}

/// Header key used by HVAC sizing tables: lower-cased, runs of whitespace,
/// brackets, braces and slashes collapsed to `_`.
pub fn hvac_header_key(header: &str) -> String {
    header_key(header, |c| c.is_whitespace() || matches!(c, '[' | ']' | '{' | '}' | '/'))
}

/// Header key used by lighting tables: lower-cased, runs of whitespace,
/// brackets, parentheses, `>` and `%` collapsed to `_`.
pub fn lighting_header_key(header: &str) -> String {
    header_key(header, |c| {
        c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '>' | '%')
    })
}

fn header_key(header: &str, separator: impl Fn(char) -> bool) -> String {
    let mut key = String::with_capacity(header.len());
    let mut in_run = false;
    for c in header.chars().flat_map(char::to_lowercase) {
        if separator(c) {
            if !in_run {
                key.push('_');
                in_run = true;
            }
        } else {
            key.push(c);
            in_run = false;
        }
    }
    let key = key.trim_end_matches('_');
    // The row-label column has an empty header.
    if key.is_empty() {
        "name".to_string()
    } else {
        key.to_string()
    }
}

/// Report generation time, e.g. `2024-05-01 12:34:56`.
pub fn report_timestamp(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"Timestamp:\s*(?:<b>\s*)?([\d\-:\s]+)").expect("timestamp pattern")
    });
    let captured = re.captures(html)?.get(1)?.as_str();
    let normalized = captured.split_whitespace().collect::<Vec<_>>().join(" ");
    (!normalized.is_empty()).then_some(normalized)
}

/// The `For:` line of the first report, e.g. `Entire Facility`.
pub fn report_facility(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"For:\s*<b>(.*?)</b>").expect("facility pattern"));
    let captured = re.captures(html)?.get(1)?.as_str().trim();
    Some(captured.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("123.4"), 123.4);
        assert_eq!(extract_number("1,234"), 1234.0);
        assert_eq!(extract_number(" 1 234.5 "), 1234.5);
        assert_eq!(extract_number(""), 0.0);
        assert_eq!(extract_number("-"), 0.0);
        assert_eq!(extract_number("abc"), 0.0);
        assert_eq!(extract_number("NaN"), 0.0);
        assert_eq!(extract_number("inf"), 0.0);
        assert_eq!(extract_number("-3.5E+02"), -350.0);
    }

    #[test]
    fn test_parse_optional_number() {
        assert_eq!(parse_optional_number("-"), None);
        assert_eq!(parse_optional_number(""), None);
        assert_eq!(parse_optional_number("1,234"), Some(1234.0));
        assert_eq!(parse_optional_number("n/a"), None);
    }

    #[test]
    fn test_cell_value() {
        assert_eq!(CellValue::from_cell("12.5"), CellValue::Number(12.5));
        assert_eq!(CellValue::from_cell("SPACE1-1"), CellValue::Text("SPACE1-1".into()));
        assert_eq!(CellValue::from_cell(""), CellValue::Null);
        assert_eq!(serde_json::to_string(&CellValue::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&CellValue::Number(2.0)).unwrap(), "2.0");
    }

    #[test]
    fn test_header_keys() {
        assert_eq!(hvac_header_key("Calculated Design Load [W]"), "calculated_design_load_w");
        assert_eq!(hvac_header_key("Design Air Flow {m3/s}"), "design_air_flow_m3_s");
        assert_eq!(hvac_header_key(""), "name");
        assert_eq!(
            lighting_header_key("Lighting Power Density [W/m2]"),
            "lighting_power_density_w/m2"
        );
        assert_eq!(lighting_header_key("Return Air Fraction (%)"), "return_air_fraction");
        assert_eq!(lighting_header_key("Hours > 1% [hr]"), "hours_1_hr");
    }

    #[test]
    fn test_metadata() {
        let html = "<p>Report:<b> X</b></p><p>For:<b> Entire Facility </b></p>\
                    <p>Timestamp: <b>2024-05-01\n    12:34:56</b></p>";
        assert_eq!(report_timestamp(html).as_deref(), Some("2024-05-01 12:34:56"));
        assert_eq!(report_facility(html).as_deref(), Some("Entire Facility"));
        assert_eq!(report_timestamp("<p>nothing</p>"), None);
        assert_eq!(report_facility("<p>nothing</p>"), None);
    }
}
