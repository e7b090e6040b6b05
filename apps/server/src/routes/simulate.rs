// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Simulation endpoints: form values into a gbXML, then OpenStudio.

use crate::error::ApiError;
use crate::services::cache::DiskCache;
use crate::types::{
    SimulateOptions, SimulateResponse, SimulationStats, SimulationUpload, GBXML_FIELD,
};
use crate::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::{header, HeaderName},
    response::{IntoResponse, Response},
    Json,
};
use std::time::{Duration, Instant};
use studiox_core::{FieldValues, InjectionReport};

const CACHE_KEY_HEADER: HeaderName = HeaderName::from_static("x-cache-key");
const CACHED_HEADER: HeaderName = HeaderName::from_static("x-cached");

/// Split a multipart form into the gbXML file and the named text fields.
async fn extract_upload(
    multipart: &mut Multipart,
    max_file_size_mb: usize,
) -> Result<SimulationUpload, ApiError> {
    let mut gbxml = None;
    let mut values = FieldValues::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == GBXML_FIELD {
            let bytes = field.bytes().await?;
            tracing::debug!(size = bytes.len(), "Extracted gbXML from multipart");
            gbxml = Some(bytes.to_vec());
        } else if !name.is_empty() {
            let value = field.text().await?;
            values.insert(name, value);
        }
    }

    let Some(gbxml) = gbxml else {
        tracing::warn!("No 'gbxml' field found in multipart request");
        return Err(ApiError::MissingFile);
    };

    if gbxml.len() > max_file_size_mb * 1024 * 1024 {
        return Err(ApiError::FileTooLarge {
            max_mb: max_file_size_mb,
        });
    }

    Ok(SimulationUpload { gbxml, values })
}

/// The mutated document and what the injector did.
struct Prepared {
    xml: Vec<u8>,
    injection: InjectionReport,
    cache_key: String,
    elapsed: Duration,
}

async fn prepare(state: &AppState, upload: SimulationUpload) -> Result<Prepared, ApiError> {
    let start = Instant::now();
    let injector = state.injector.clone();

    // Parse, inject and serialize on the blocking pool (CPU-bound)
    let (xml, injection) = tokio::task::spawn_blocking(move || {
        let (doc, injection) = injector.inject_upload(&upload.gbxml, &upload.values)?;
        Ok::<_, studiox_core::Error>((doc.to_xml_bytes()?, injection))
    })
    .await??;

    let cache_key = DiskCache::generate_key(&xml);
    Ok(Prepared {
        xml,
        injection,
        cache_key,
        elapsed: start.elapsed(),
    })
}

/// POST /api/v1/simulate - Inject form values and run the simulation.
pub async fn simulate(
    State(state): State<AppState>,
    Query(options): Query<SimulateOptions>,
    mut multipart: Multipart,
) -> Result<Json<SimulateResponse>, ApiError> {
    let total = Instant::now();
    let upload = extract_upload(&mut multipart, state.config.max_file_size_mb).await?;
    let prepared = prepare(&state, upload).await?;
    let cache_key = prepared.cache_key.clone();

    if !options.skip_cache {
        if let Some(mut cached) = state.cache.get::<SimulateResponse>(&cache_key).await? {
            tracing::info!(cache_key = %cache_key, "Cache HIT");
            cached.stats.from_cache = true;
            return Ok(Json(cached));
        }
    }

    tracing::info!(
        cache_key = %cache_key,
        size = prepared.xml.len(),
        applied = prepared.injection.applied,
        unresolved = prepared.injection.unresolved.len(),
        "Cache MISS - simulating"
    );

    let output = state.runner.run(&prepared.xml).await?;

    let stats = SimulationStats {
        run_id: output.run_id.to_string(),
        report_path: output.report_path.display().to_string(),
        inject_time_ms: prepared.elapsed.as_millis() as u64,
        queue_time_ms: output.queue_time.as_millis() as u64,
        simulation_time_ms: output.run_time.as_millis() as u64,
        total_time_ms: total.elapsed().as_millis() as u64,
        from_cache: false,
        ..Default::default()
    }
    .with_injection(&prepared.injection);

    let response = SimulateResponse {
        report: output.report_html,
        cache_key: cache_key.clone(),
        stats,
    };

    // Cache result (background)
    let cache = state.cache.clone();
    let response_clone = response.clone();
    tokio::spawn(async move {
        if let Err(e) = cache.set(&cache_key, &response_clone).await {
            tracing::error!(error = %e, "Failed to cache result");
        }
    });

    Ok(Json(response))
}

/// POST /api/v1/simulate/document - Inject form values and return the
/// gbXML that would be simulated. `x-cached` tells whether a result for it
/// already exists.
pub async fn document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = extract_upload(&mut multipart, state.config.max_file_size_mb).await?;
    let prepared = prepare(&state, upload).await?;
    let cached = state.cache.has(&prepared.cache_key).await;

    tracing::info!(
        cache_key = %prepared.cache_key,
        cached,
        applied = prepared.injection.applied,
        elapsed_ms = prepared.elapsed.as_millis() as u64,
        "Prepared gbXML"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8".to_string()),
            (CACHE_KEY_HEADER, prepared.cache_key),
            (CACHED_HEADER, cached.to_string()),
        ],
        prepared.xml,
    )
        .into_response())
}
