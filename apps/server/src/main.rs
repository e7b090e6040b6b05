// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! StudioX Server - gbXML parameterization and EnergyPlus report extraction.
//!
//! This server takes a gbXML upload together with building form values,
//! writes the values into the document, runs the OpenStudio workflow on the
//! result and hands back the EnergyPlus tabular report. It also turns such
//! reports into structured JSON.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/fields` - Form fields, labels and defaults
//! - `POST /api/v1/simulate` - Inject form values and simulate
//! - `POST /api/v1/simulate/document` - Inject form values, return the gbXML
//! - `POST /api/v1/report` - Extract structured results from a report
//! - `POST /api/v1/report/kpis` - Report KPIs
//! - `GET /api/v1/cache/:key` - Retrieve cached simulation result

use anyhow::Context;
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    BoxError, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use studiox_core::{FieldCatalog, Injector};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::{DiskCache, RunnerConfig, SimulationRunner};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DiskCache>,
    pub config: Arc<Config>,
    pub catalog: Arc<FieldCatalog>,
    pub injector: Arc<Injector>,
    pub runner: Arc<SimulationRunner>,
}

impl AppState {
    pub async fn new(config: Config, catalog: FieldCatalog) -> anyhow::Result<Self> {
        let injector = Injector::new(&catalog).context("compiling field catalog")?;
        let cache = DiskCache::new(&config.cache_dir).await;
        let runner = SimulationRunner::new(
            RunnerConfig::from(&config),
            config.max_concurrent_simulations,
        );

        Ok(Self {
            cache: Arc::new(cache),
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            injector: Arc::new(injector),
            runner: Arc::new(runner),
        })
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,studiox_server=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}

fn load_catalog(config: &Config) -> anyhow::Result<FieldCatalog> {
    match &config.field_catalog_path {
        Some(path) => FieldCatalog::from_json_file(path)
            .with_context(|| format!("loading field catalog {}", path.display())),
        None => Ok(FieldCatalog::builtin()),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Bound every request by `timeout`; expiry answers 408 with a JSON body.
fn with_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let secs = timeout.as_secs();
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                error::middleware_error(err, secs)
            }))
            .timeout(timeout),
    )
}

fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Form fields
        .route("/api/v1/fields", get(routes::fields::list))
        // Simulation endpoints
        .route("/api/v1/simulate", post(routes::simulate::simulate))
        .route("/api/v1/simulate/document", post(routes::simulate::document))
        // Report endpoints
        .route("/api/v1/report", post(routes::report::extract_full))
        .route("/api/v1/report/kpis", post(routes::report::extract_kpis))
        // Cache endpoints
        .route("/api/v1/cache/:key", get(routes::cache::get_cached))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_body_bytes()))
        .layer(CompressionLayer::new());

    with_timeout(api, Duration::from_secs(config.request_timeout_secs))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.json_logs);

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_file_size_mb = config.max_file_size_mb,
        simulator = %config.simulator_bin,
        workflow_dir = %config.workflow_dir.display(),
        max_concurrent_simulations = config.max_concurrent_simulations,
        "Starting StudioX Server"
    );

    if !config.workflow_dir.is_dir() {
        tracing::warn!(
            workflow_dir = %config.workflow_dir.display(),
            "Workflow directory missing; simulations will fail until it exists"
        );
    }

    let catalog = load_catalog(&config)?;
    tracing::info!(
        fields = catalog.field_count(),
        sections = catalog.sections.len(),
        "Loaded field catalog"
    );

    let port = config.port;
    let state = AppState::new(config, catalog).await?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SimulateResponse, SimulationStats};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, Response, StatusCode};
    use serde_json::Value;
    use std::path::PathBuf;
    use tower::ServiceExt;

    const BOUNDARY: &str = "studiox-test-boundary";

    struct TestApp {
        router: Router,
        state: AppState,
        _dir: tempfile::TempDir,
    }

    impl TestApp {
        async fn with_simulator(bin: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let workflow = dir.path().join("workflow");
            std::fs::create_dir_all(&workflow).unwrap();
            std::fs::write(workflow.join("convert.osw"), "{}").unwrap();

            let config = Config {
                port: 0,
                cache_dir: dir.path().join("cache").to_string_lossy().into_owned(),
                max_file_size_mb: 1,
                request_timeout_secs: 30,
                simulator_bin: bin.to_string(),
                workflow_dir: workflow,
                workflow_file: "convert.osw".to_string(),
                gbxml_relative_path: PathBuf::from("gbxmls/test.xml"),
                run_root: Some(dir.path().join("runs")),
                max_concurrent_simulations: 1,
                keep_run_dirs: false,
                field_catalog_path: None,
                cors_origins: vec!["*".to_string()],
                json_logs: false,
            };
            let state = AppState::new(config, FieldCatalog::builtin()).await.unwrap();

            Self {
                router: build_router(state.clone()),
                state,
                _dir: dir,
            }
        }

        async fn send(&self, request: Request<Body>) -> Response<Body> {
            self.router.clone().oneshot(request).await.unwrap()
        }
    }

    fn fixture(relative: &str) -> Vec<u8> {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../rust/core/tests/fixtures")
            .join(relative);
        std::fs::read(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    fn multipart(uri: &str, gbxml: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(xml) = gbxml {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"gbxml\"; filename=\"model.xml\"\r\nContent-Type: application/xml\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(xml);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/html")
            .body(body.into())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_info() {
        let app = TestApp::with_simulator("true").await;

        let response = app.send(get("/api/v1/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["simulator"]["workflow_present"], true);
        assert_eq!(body["simulator"]["available_slots"], 1);

        let body = json(app.send(get("/")).await).await;
        assert_eq!(body["service"], "studiox-server");
        assert_eq!(body["endpoints"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_fields_lists_catalog() {
        let app = TestApp::with_simulator("true").await;
        let body = json(app.send(get("/api/v1/fields")).await).await;

        assert_eq!(body["field_count"], app.state.catalog.field_count());
        let location = body["sections"]
            .as_array()
            .unwrap()
            .iter()
            .flat_map(|s| s["fields"].as_array().unwrap().iter())
            .find(|f| f["name"] == "locName")
            .unwrap();
        assert_eq!(location["default"], "Seoul, KR");
    }

    #[tokio::test]
    async fn test_document_contains_submitted_value() {
        let app = TestApp::with_simulator("true").await;
        let gbxml = fixture("sample.gbxml");
        let response = app
            .send(multipart(
                "/api/v1/simulate/document",
                Some(&gbxml),
                &[("locName", "Busan, KR")],
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/xml"));
        assert_eq!(response.headers()["x-cache-key"].len(), 64);
        assert_eq!(response.headers()["x-cached"], "false");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let xml = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(xml.contains("<Name>Busan, KR</Name>"));
        assert!(!xml.contains("Template Location"));
    }

    #[tokio::test]
    async fn test_simulate_rejects_bad_uploads() {
        let app = TestApp::with_simulator("true").await;

        let response = app
            .send(multipart("/api/v1/simulate", None, &[("locName", "Busan")]))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "MISSING_FILE");

        let response = app
            .send(multipart("/api/v1/simulate", Some(b"this is not xml"), &[]))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_XML");

        let response = app
            .send(multipart("/api/v1/simulate", Some(b"  "), &[]))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_XML");
    }

    #[tokio::test]
    async fn test_simulator_failure_is_server_error() {
        let app = TestApp::with_simulator("false").await;
        let gbxml = fixture("sample.gbxml");
        let response = app
            .send(multipart("/api/v1/simulate", Some(&gbxml), &[]))
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["code"], "SIMULATION_FAILED");
        assert!(body["error"].as_str().unwrap().contains("code 1"));
    }

    #[tokio::test]
    async fn test_simulate_serves_cached_result() {
        let app = TestApp::with_simulator("false").await;
        let gbxml = fixture("sample.gbxml");
        let form = [("locName", "Busan, KR")];

        let response = app
            .send(multipart("/api/v1/simulate/document", Some(&gbxml), &form))
            .await;
        let key = response.headers()["x-cache-key"].to_str().unwrap().to_string();

        let cached = SimulateResponse {
            report: "<html>cached</html>".to_string(),
            cache_key: key.clone(),
            stats: SimulationStats::default(),
        };
        app.state.cache.set(&key, &cached).await.unwrap();

        let response = app
            .send(multipart("/api/v1/simulate/document", Some(&gbxml), &form))
            .await;
        assert_eq!(response.headers()["x-cached"], "true");

        // The simulator would fail; a hit never reaches it.
        let response = app
            .send(multipart("/api/v1/simulate", Some(&gbxml), &form))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["report"], "<html>cached</html>");
        assert_eq!(body["stats"]["from_cache"], true);

        let body = json(app.send(get(&format!("/api/v1/cache/{key}"))).await).await;
        assert_eq!(body["cache_key"], key);

        let response = app.send(get("/api/v1/cache/unknown")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_report_extraction() {
        let app = TestApp::with_simulator("true").await;
        let html = fixture("eplustbl.html");

        let response = app.send(post_raw("/api/v1/report", html.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(
            body["building_performance"]["site_and_source_energy"]["total_site_energy_gj"],
            1234.56
        );
        assert_eq!(body["hvac_sizing_summary"]["facility"], "Entire Facility");

        let body = json(app.send(post_raw("/api/v1/report/kpis", html)).await).await;
        assert_eq!(body["eui_mj_per_m2"], 1331.5);
    }

    #[tokio::test]
    async fn test_report_rejects_bad_bodies() {
        let app = TestApp::with_simulator("true").await;

        let response = app.send(post_raw("/api/v1/report", "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "MISSING_REPORT");

        let response = app.send(post_raw("/api/v1/report", vec![0xff, 0xfe, 0x00])).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["code"], "INVALID_UTF8");

        let oversized = vec![b'a'; 2 * 1024 * 1024];
        let response = app.send(post_raw("/api/v1/report", oversized)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_timeout_answers_with_json_error() {
        let router = with_timeout(
            Router::new().route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            ),
            Duration::from_millis(20),
        );

        let response = router.oneshot(get("/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = json(response).await;
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
        assert!(body["error"].as_str().unwrap().starts_with("Request timed out"));
    }

    #[test]
    fn test_cors_ignores_invalid_origins() {
        // Construction must not panic on a malformed origin.
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&["*".to_string()]);
    }
}
