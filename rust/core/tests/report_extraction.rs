// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction of a complete EnergyPlus tabular report.

use std::fs;
use std::path::Path;

use serde_json::Value;
use studiox_core::report::{extract_report, CellValue};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Structural equality with numbers compared as floats.
fn assert_json_matches(actual: &Value, expected: &Value, at: &str) {
    match (actual, expected) {
        (Value::Number(a), Value::Number(e)) => {
            let (a, e) = (a.as_f64().unwrap(), e.as_f64().unwrap());
            assert!((a - e).abs() < 1e-9, "{at}: {a} != {e}");
        }
        (Value::Object(a), Value::Object(e)) => {
            let mut actual_keys: Vec<_> = a.keys().collect();
            let mut expected_keys: Vec<_> = e.keys().collect();
            actual_keys.sort();
            expected_keys.sort();
            assert_eq!(actual_keys, expected_keys, "{at}: keys differ");
            for (key, value) in e {
                assert_json_matches(&a[key], value, &format!("{at}.{key}"));
            }
        }
        (Value::Array(a), Value::Array(e)) => {
            assert_eq!(a.len(), e.len(), "{at}: length differs");
            for (i, (a, e)) in a.iter().zip(e).enumerate() {
                assert_json_matches(a, e, &format!("{at}[{i}]"));
            }
        }
        (a, e) => assert_eq!(a, e, "{at}"),
    }
}

#[test]
fn test_fixture_report_matches_expected_json() {
    let report = extract_report(&fixture("eplustbl.html"));
    let actual = serde_json::to_value(&report).unwrap();
    let expected: Value = serde_json::from_str(&fixture("expected_report.json")).unwrap();
    assert_json_matches(&actual, &expected, "$");
}

#[test]
fn test_fixture_sections_resolve_to_their_reports() {
    let report = extract_report(&fixture("eplustbl.html"));

    let building = &report.building_performance;
    assert_eq!(building.site_and_source_energy.total_site_energy_gj, 1234.56);
    assert_eq!(building.building_area_m2.total, 927.2);
    assert_eq!(building.end_uses_gj["Heating"]["Natural Gas"], 456.7);
    assert!(!building.end_uses_gj.contains_key("Total End Uses"));

    // "End Uses" exists in both reports; demand figures are in W.
    let demand = &report.demand_end_use_components;
    assert_eq!(demand.peak_demand_w["Heating"]["Natural Gas"], 85250.5);
    assert!(!demand.peak_demand_w.contains_key("Time of Peak"));
    assert!(!demand.peak_demand_w.contains_key("None"));
    assert_eq!(demand.by_subcategory_w["Fans"]["Electricity"], 3210.4);

    let source = &report.source_energy_end_use_components_summary;
    assert_eq!(source.timestamp, "2024-05-01 12:34:56");
    assert_eq!(source.end_uses.len(), 4);
    assert_eq!(source.end_uses[0].values["Source District Cooling [GJ]"], None);

    let hvac = &report.hvac_sizing_summary;
    assert_eq!(hvac.facility.as_deref(), Some("Entire Facility"));
    assert_eq!(
        hvac.zone_sensible_cooling[0]["design_day_name"],
        CellValue::Text("SEOUL DESIGN COOLING".into())
    );
    assert!(hvac.plant_loop_coincident_design_fluid_flow_rate_adjustments.is_empty());
    assert!(hvac.coil_sizing_summary.is_empty());

    let co2 = &report.co2_resilience_summary;
    assert_eq!(co2.co2_level_hours.unwrap().caution_hours, 219.0);
    assert_eq!(co2.co2_level_occupanthours.unwrap().safe_hours, 21320.5);
    assert!(co2.co2_level_occupiedhours.is_none());
}

#[test]
fn test_fixture_kpis() {
    let kpis = extract_report(&fixture("eplustbl.html")).kpis();
    assert_eq!(kpis.eui_mj_per_m2, 1331.5);
    assert!((kpis.end_use_totals_gj["Heating"] - 469.04).abs() < 1e-9);
    assert!((kpis.peak_loads.heating_kw - 86.7505).abs() < 1e-9);
    assert!((kpis.peak_loads.cooling_kw - 42.1).abs() < 1e-9);
    assert!((kpis.subcategory_demand_kw["Interior Lighting"] - 9.87).abs() < 1e-9);
}

#[test]
fn test_site_energy_parsed_from_section() {
    let html = "<b>Site and Source Energy</b><table>\
        <tr><td></td><td>Total Energy [GJ]</td></tr>\
        <tr><td>Total Site Energy</td><td>123.4</td></tr></table>";
    let report = extract_report(html);
    assert_eq!(report.building_performance.site_and_source_energy.total_site_energy_gj, 123.4);
}

#[test]
fn test_missing_sections_yield_defaults() {
    let report = extract_report("<html><body><p>Report:<b> Something Else</b></p></body></html>");
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["building_performance"]["end_uses_gj"], serde_json::json!({}));
    assert_eq!(json["demand_end_use_components"]["peak_demand_w"], serde_json::json!({}));
    assert_eq!(
        json["source_energy_end_use_components_summary"]["end_uses"],
        serde_json::json!([])
    );
    assert_eq!(json["lighting_summary"]["interior_lighting"], serde_json::json!([]));
    assert!(json["co2_resilience_summary"]["co2_level_hours"].is_null());
    assert_eq!(report.kpis().eui_mj_per_m2, 0.0);
}

#[test]
fn test_report_fragment_with_body_level_headings() {
    // No table of contents: the body text opens with the report label and
    // section headings sit directly under <body>.
    let html = "Report:<b> Annual Building Utility Performance Summary</b>\
        <b>End Uses</b>\
        <table>\
          <tr><td></td><td>Electricity [GJ]</td><td>Natural Gas [GJ]</td></tr>\
          <tr><td>Heating</td><td>11.0</td><td>22.0</td></tr>\
        </table>\
        <p>Report:<b> Demand End Use Components Summary</b></p>\
        <p>For:<b> Entire Facility</b></p>\
        <b>End Uses</b>\
        <table>\
          <tr><td></td><td>Electricity [W]</td><td>Natural Gas [W]</td></tr>\
          <tr><td>Time of Peak</td><td>21-JAN-07:15</td><td>21-JAN-07:15</td></tr>\
          <tr><td>Heating</td><td>1,500.00</td><td>8000.00</td></tr>\
          <tr><td>Cooling</td><td>2500.00</td><td>0.00</td></tr>\
          <tr><td>Total End Uses</td><td>4000.00</td><td>8000.00</td></tr>\
        </table>";
    let report = extract_report(html);

    let peak = &report.demand_end_use_components.peak_demand_w;
    let keys: Vec<_> = peak.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Heating", "Cooling"]);
    assert_eq!(peak["Heating"]["Electricity"], 1500.0);
    assert_eq!(peak["Heating"]["Natural Gas"], 8000.0);
    assert_eq!(peak["Cooling"]["Electricity"], 2500.0);

    let kpis = report.kpis();
    assert!((kpis.peak_loads.heating_kw - 9.5).abs() < 1e-9);
    assert!((kpis.peak_loads.cooling_kw - 2.5).abs() < 1e-9);
}
