// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub simulator: SimulatorStatus,
}

/// Simulator capacity and whether its workflow is in place.
#[derive(Debug, Serialize)]
pub struct SimulatorStatus {
    pub binary: String,
    pub workflow_present: bool,
    pub max_concurrent: usize,
    pub available_slots: usize,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let runner = &state.runner;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "studiox-server",
        simulator: SimulatorStatus {
            binary: runner.config().simulator_bin.clone(),
            workflow_present: runner.config().workflow_dir.is_dir(),
            max_concurrent: runner.max_concurrent(),
            available_slots: runner.available_slots(),
        },
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "studiox-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "gbXML parameterization, OpenStudio simulation and report extraction",
        endpoints: vec![
            EndpointInfo {
                method: "GET",
                path: "/api/v1/health",
                description: "Health check endpoint",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/fields",
                description: "Form fields with labels and defaults",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/simulate",
                description: "Inject form values into a gbXML and run the simulation",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/simulate/document",
                description: "Inject form values and return the gbXML without simulating",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/report",
                description: "Extract structured results from an EnergyPlus HTML report",
            },
            EndpointInfo {
                method: "POST",
                path: "/api/v1/report/kpis",
                description: "Headline KPIs of an EnergyPlus HTML report",
            },
            EndpointInfo {
                method: "GET",
                path: "/api/v1/cache/:key",
                description: "Retrieve cached simulation result",
            },
        ],
    })
}
