// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Report extraction endpoints. The body is the raw `eplustbl.htm`.

use crate::error::ApiError;
use axum::Json;
use bytes::Bytes;
use std::time::Instant;
use studiox_core::{extract_report, ExtractedReport, ReportKpis};

fn report_html(body: Bytes) -> Result<String, ApiError> {
    let html = String::from_utf8(body.to_vec())?;
    if html.trim().is_empty() {
        return Err(ApiError::MissingReport);
    }
    Ok(html)
}

async fn extract(body: Bytes) -> Result<ExtractedReport, ApiError> {
    let html = report_html(body)?;
    let size = html.len();
    let start = Instant::now();

    // Tree construction is CPU-bound
    let report = tokio::task::spawn_blocking(move || extract_report(&html)).await?;

    tracing::info!(
        size,
        elapsed_ms = start.elapsed().as_millis() as u64,
        end_uses = report.building_performance.end_uses_gj.len(),
        "Extracted report"
    );
    Ok(report)
}

/// POST /api/v1/report - Structured results of an EnergyPlus HTML report.
pub async fn extract_full(body: Bytes) -> Result<Json<ExtractedReport>, ApiError> {
    Ok(Json(extract(body).await?))
}

/// POST /api/v1/report/kpis - Headline figures only.
pub async fn extract_kpis(body: Bytes) -> Result<Json<ReportKpis>, ApiError> {
    Ok(Json(extract(body).await?.kpis()))
}
