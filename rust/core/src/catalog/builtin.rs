// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in catalog for gbXML consumed by the OpenStudio workflow.

use super::{FieldCatalog, FieldSpec, FieldTarget, FixedValue, Section};

fn field(name: &str, label: &str, default: &str, target: FieldTarget) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        label: label.to_string(),
        default: default.to_string(),
        target,
    }
}

fn text(name: &str, label: &str, default: &str, path: &str) -> FieldSpec {
    field(
        name,
        label,
        default,
        FieldTarget::Text {
            path: path.to_string(),
        },
    )
}

fn attribute(name: &str, label: &str, default: &str, path: &str, attr: &str) -> FieldSpec {
    field(
        name,
        label,
        default,
        FieldTarget::Attribute {
            path: path.to_string(),
            attribute: attr.to_string(),
        },
    )
}

/// "WindowMaterialGlazing" -> "Window Material Glazing"
fn humanize(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len() + 8);
    let mut prev: Option<char> = None;
    for c in tag.chars() {
        if c.is_uppercase() && prev.is_some_and(char::is_lowercase) {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Element-named fields that write their own top-level tag's text.
fn tag_texts(tags: &[&str]) -> Vec<FieldSpec> {
    tags.iter()
        .map(|tag| text(tag, &humanize(tag), "", &format!("//gb:{tag}")))
        .collect()
}

fn section(name: &str, fields: Vec<FieldSpec>) -> Section {
    Section {
        name: name.to_string(),
        fields,
    }
}

const HVAC_TEMPLATES: &[(&str, &str)] = &[
    ("HVACTemplateThermostat", "Yes"),
    ("HVACTemplateZoneIdealLoadsAirSystem", "Yes"),
    ("HVACTemplateZoneFanCoil", "No"),
    ("HVACTemplateZonePTAC", "No"),
    ("HVACTemplateZonePTHP", "No"),
    ("HVACTemplateZoneWaterToAirHeatPump", "No"),
    ("HVACTemplateZoneVRF", "No"),
    ("HVACTemplateZoneUnitary", "No"),
    ("HVACTemplateZoneVAV", "No"),
    ("HVACTemplateSystemUnitary", "No"),
    ("HVACTemplateSystemVAV", "No"),
    ("HVACTemplateSystemDedicatedOutdoorAir", "No"),
    ("HVACTemplatePlantChilledWaterLoop", "No"),
    ("HVACTemplatePlantHotWaterLoop", "No"),
    ("HVACTemplatePlantChiller", "No"),
    ("HVACTemplatePlantBoiler", "No"),
];

const OUTPUT_METERS: &[(&str, &str)] = &[
    ("Electricity:Facility", "Yes"),
    ("NaturalGas:Facility", "Yes"),
    ("DistrictHeatingWater:Facility", "No"),
    ("DistrictCooling:Facility", "No"),
];

pub(super) fn catalog() -> FieldCatalog {
    const LOCATION: &str = "//gb:Campus/gb:Location";
    const BUILDING: &str = "//gb:Campus/gb:Building";
    const PARAM: &str = "//gb:Space/gb:AnalysisParameter";
    const DD1: &str = "//gb:SizingPeriodDesignDay[1]";
    const DD2: &str = "//gb:SizingPeriodDesignDay[2]";
    const RUN: &str = "//gb:RunPeriod";

    let location = section(
        "Location",
        vec![
            text("stationId", "Station ID", "471080", &format!("{LOCATION}/gb:StationId")),
            text("zipcode", "Zip / Postal Code", "04524", &format!("{LOCATION}/gb:ZipcodeOrPostalCode")),
            text("longitude", "Longitude", "126.978", &format!("{LOCATION}/gb:Longitude")),
            text("latitude", "Latitude", "37.566", &format!("{LOCATION}/gb:Latitude")),
            text("elevation", "Elevation (m)", "38", &format!("{LOCATION}/gb:Elevation")),
            text("cadAzimuth", "CAD Model Azimuth", "0", &format!("{LOCATION}/gb:CADModelAzimuth")),
            text("locName", "Location Name", "Seoul, KR", &format!("{LOCATION}/gb:Name")),
        ],
    );

    let building = section(
        "Building",
        vec![
            attribute("bldgType", "Building Type", "Office", BUILDING, "buildingType"),
            text("street", "Street Address", "110 Sejong-daero", &format!("{BUILDING}/gb:StreetAddress")),
            text("bldgArea", "Building Area (m²)", "1000", &format!("{BUILDING}/gb:Area")),
            text("bldgName", "Building Name", "StudioX Office", &format!("{BUILDING}/gb:Name")),
        ],
    );

    let space_loads = section(
        "Space Loads",
        vec![
            text("peopleNum", "People", "10", "//gb:Space/gb:PeopleNumber"),
            text("lightWm2", "Lighting (W/m²)", "10.76", "//gb:Space/gb:LightPowerPerArea"),
            text("equipWm2", "Equipment (W/m²)", "10.76", "//gb:Space/gb:EquipPowerPerArea"),
            text("ach", "Air Changes per Hour", "0.5", "//gb:Space/gb:AirChangesPerHour"),
            text("spaceArea", "Space Area (m²)", "100", "//gb:Space/gb:Area"),
            text("spaceVol", "Space Volume (m³)", "300", "//gb:Space/gb:Volume"),
        ],
    );

    let gain = |name: &str, label: &str, default: &str, index: usize, kind: &str| {
        field(
            name,
            label,
            default,
            FieldTarget::IndexedGain {
                path: "//gb:Space/gb:PeopleHeatGain".to_string(),
                index,
                attribute: "heatGainType".to_string(),
                attribute_value: kind.to_string(),
            },
        )
    };
    let heat_gain = section(
        "People Heat Gain",
        vec![
            gain("heatTotal", "Total (W/person)", "120", 0, "Total"),
            gain("heatLatent", "Latent (W/person)", "45", 1, "Latent"),
            gain("heatSens", "Sensible (W/person)", "75", 2, "Sensible"),
        ],
    );

    let param = |name: &str, label: &str, default: &str, parameter: &str| {
        text(
            name,
            label,
            default,
            &format!("{PARAM}[gb:Name='{parameter}']/gb:ParameterValue"),
        )
    };
    let ventilation = section(
        "Ventilation",
        vec![
            param("oaMethod", "OA Flow Method", "Sum", "OAFlowMethod"),
            param("oaArea", "OA per Area (m³/s·m²)", "0.0003", "OAFlowPerArea"),
            param("oaPerson", "OA per Person (m³/s)", "0.0025", "OAFlowPerPerson"),
            param("oaSpace", "OA per Space (m³/s)", "0", "OAFlowPerSpace"),
            param("infArea", "Infiltration per Area (m³/s·m²)", "0.0003", "InfiltrationFlowPerArea"),
        ],
    );

    let simulation = section(
        "Simulation Parameters",
        vec![
            field(
                "simulationControl",
                "Simulation Control",
                "RunSimulationAndSizing",
                FieldTarget::Switch {
                    path: "//gb:SimulationControl/gb:DoZoneSizingCalculation".to_string(),
                    when: "RunSimulationAndSizing".to_string(),
                    yes: "Yes".to_string(),
                    no: "No".to_string(),
                },
            ),
            text("timestep", "Timesteps per Hour", "6", "//gb:Timestep"),
            text("version", "EnergyPlus Version", "24.1", "//gb:Version"),
        ],
    );

    let design_days = section(
        "Design Days",
        vec![
            text("dd1Month", "Cooling DD Month", "7", &format!("{DD1}/gb:Month")),
            text("dd1Day", "Cooling DD Day", "21", &format!("{DD1}/gb:DayOfMonth")),
            text("dd1Type", "Cooling DD Type", "SummerDesignDay", &format!("{DD1}/gb:DayType")),
            text("dd1MaxDryBulb", "Cooling DD Max Dry-Bulb (°C)", "33.3", &format!("{DD1}/gb:MaximumDryBulbTemperature")),
            text("dd1DryBulbRange", "Cooling DD Dry-Bulb Range (°C)", "7.6", &format!("{DD1}/gb:DailyDryBulbTemperatureRange")),
            text("dd2Month", "Heating DD Month", "1", &format!("{DD2}/gb:Month")),
            text("dd2Day", "Heating DD Day", "21", &format!("{DD2}/gb:DayOfMonth")),
            text("dd2Type", "Heating DD Type", "WinterDesignDay", &format!("{DD2}/gb:DayType")),
            text("dd2MaxDryBulb", "Heating DD Max Dry-Bulb (°C)", "-11.3", &format!("{DD2}/gb:MaximumDryBulbTemperature")),
            text("dd2DryBulbRange", "Heating DD Dry-Bulb Range (°C)", "0", &format!("{DD2}/gb:DailyDryBulbTemperatureRange")),
        ],
    );

    let run_period = section(
        "Run Period",
        vec![
            text("runPeriodStartMonth", "Begin Month", "1", &format!("{RUN}/gb:BeginMonth")),
            text("runPeriodStartDay", "Begin Day", "1", &format!("{RUN}/gb:BeginDayOfMonth")),
            text("runPeriodEndMonth", "End Month", "12", &format!("{RUN}/gb:EndMonth")),
            text("runPeriodEndDay", "End Day", "31", &format!("{RUN}/gb:EndDayOfMonth")),
            text("runPeriodControlSpecialDays", "Special Day Codes", "", &format!("{RUN}/gb:SpecialDayCodes")),
            text("runPeriodControlDaylightSavingsStart", "Daylight Saving Start", "", &format!("{RUN}/gb:DaylightSavingStartDate")),
            text("runPeriodControlDaylightSavingsEnd", "Daylight Saving End", "", &format!("{RUN}/gb:DaylightSavingEndDate")),
        ],
    );

    let ground = section(
        "Ground & Water Temperatures",
        vec![
            text(
                "siteGroundTempsMonthly",
                "Monthly Ground Temperature (°C)",
                "18",
                "//gb:SiteGroundTemperatureBuildingSurface/gb:MonthlyAverageGroundTemperature",
            ),
            text(
                "siteWaterMainsTemp",
                "Water Mains Temperature (°C)",
                "10",
                "//gb:SiteWaterMainsTemperature/gb:WaterMainsTemperature",
            ),
        ],
    );

    let mut schedule_fields = tag_texts(&["ScheduleCompact", "ScheduleTypeLimits", "ScheduleConstant"]);
    for tag in ["ScheduleDayInterval", "ScheduleWeekDaily", "ScheduleYearDefinition"] {
        schedule_fields.push(attribute(tag, &humanize(tag), "", &format!("//gb:{tag}"), "Name"));
    }
    schedule_fields.push(field(
        "scheduleFile",
        "Schedule File",
        "",
        FieldTarget::TextIfPresent {
            path: "//gb:ScheduleFile".to_string(),
        },
    ));
    let schedules = section("Schedules", schedule_fields);

    let constructions = section(
        "Surface Construction Elements",
        tag_texts(&[
            "Material",
            "MaterialNoMass",
            "MaterialAirGap",
            "WindowMaterialGlazing",
            "WindowMaterialGas",
            "WindowMaterialSimpleGlazingSystem",
            "Construction",
        ]),
    );

    let internal_gains = section(
        "Internal Gains",
        tag_texts(&[
            "People",
            "Lights",
            "ElectricEquipment",
            "GasEquipment",
            "OtherEquipment",
            "ElectricEquipmentITEAirCooled",
            "SwimmingPoolIndoor",
            "ComfortViewFactorAngles",
        ]),
    );

    let daylighting = section(
        "Daylighting",
        tag_texts(&[
            "DaylightingControls",
            "DaylightingReferencePoint",
            "DaylightingDeviceTubular",
            "DaylightingDeviceShelf",
            "DaylightingDeviceLightWell",
        ]),
    );

    let advanced = section(
        "Advanced Construction & Surface Properties",
        tag_texts(&[
            "FoundationKiva",
            "FoundationKivaSettings",
            "SurfacePropertyExposedFoundationPerimeter",
            "SurfaceControlMovableInsulation",
            "SurfacePropertyUnderwater",
            "SurfacePropertyExteriorNaturalVentedCavity",
        ]),
    );

    let exterior = section(
        "Exterior Equipment",
        tag_texts(&["ExteriorLights", "ExteriorFuelEquipment", "ExteriorWaterEquipment"]),
    );

    let airflow = section(
        "Zone Airflow",
        tag_texts(&[
            "ZoneInfiltrationDesignFlowRate",
            "ZoneInfiltrationEffectiveLeakageArea",
            "ZoneInfiltrationFlowCoefficient",
            "ZoneVentilationDesignFlowRate",
            "ZoneVentilationWindandStackOpenArea",
            "ZoneMixing",
            "ZoneCrossMixing",
            "ZoneRefrigerationDoorMixing",
            "ZoneEarthtube",
            "ZoneCoolTowerShower",
            "ZoneThermalChimney",
        ]),
    );

    let hvac = section(
        "HVAC Templates",
        HVAC_TEMPLATES
            .iter()
            .map(|(name, default)| {
                field(
                    name,
                    &humanize(name.trim_start_matches("HVACTemplate")),
                    default,
                    FieldTarget::TemplateFlag {
                        container: "//gb:HVACTemplates".to_string(),
                        element: name.to_string(),
                    },
                )
            })
            .collect(),
    );

    let mut output_fields = tag_texts(&[
        "OutputTableSummaryReports",
        "OutputControlTableStyle",
        "OutputTableTimeBins",
        "OutputTableMonthly",
        "OutputTableAnnual",
        "OutputVariableDictionary",
        "OutputDiagnostics",
        "OutputDebuggingData",
        "OutputSQLite",
        "OutputSurfacesList",
        "OutputSurfacesDrawing",
        "OutputControlSurfaceColorScheme",
        "OutputSchedules",
        "OutputConstructions",
        "OutputEnergyManagementSystem",
        "OutputControlReportingTolerances",
    ]);
    for (key, default) in OUTPUT_METERS {
        output_fields.push(field(
            &format!("outputMeter{}", key.replace(':', "")),
            &format!("Meter {key}"),
            default,
            FieldTarget::OutputMeter {
                key: key.to_string(),
                frequency: "Timestep".to_string(),
            },
        ));
    }
    let outputs = section("Output Reporting & Meters", output_fields);

    let economics = section(
        "Economics",
        tag_texts(&[
            "ComponentCostLineItem",
            "ComponentCostAdjustments",
            "ComponentCostReference",
            "LifeCycleCostParameters",
            "LifeCycleCostRecurringCosts",
            "LifeCycleCostNonrecurringCost",
            "LifeCycleCostUsePriceEscalation",
            "LifeCycleCostUseAdjustment",
            "CurrencyType",
            "UtilityCostTariff",
            "UtilityCostQualify",
            "UtilityCostChargeSimple",
            "UtilityCostChargeBlock",
            "UtilityCostRatchet",
            "UtilityCostVariable",
            "UtilityCostComputation",
        ]),
    );

    let control = "//gb:SimulationControl";
    let fixed = [
        ("DoSystemSizingCalculation", "No"),
        ("DoPlantSizingCalculation", "No"),
        ("RunSimulationForSizingPeriods", "Yes"),
        ("RunSimulationForWeatherFileRunPeriods", "Yes"),
        ("DoHVACSizingSimulationForSizingPeriods", "Yes"),
        ("MaximumNumberOfHVACSizingSimulationPasses", "1"),
    ]
    .into_iter()
    .map(|(tag, value)| FixedValue {
        path: format!("{control}/gb:{tag}"),
        value: value.to_string(),
    })
    .collect();

    FieldCatalog {
        prefix: "gb".to_string(),
        sections: vec![
            location,
            building,
            space_loads,
            heat_gain,
            ventilation,
            simulation,
            design_days,
            run_period,
            ground,
            schedules,
            constructions,
            internal_gains,
            daylighting,
            advanced,
            exterior,
            airflow,
            hvac,
            outputs,
            economics,
        ],
        fixed,
    }
}
