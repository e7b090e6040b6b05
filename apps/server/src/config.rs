// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory for cache storage.
    pub cache_dir: String,
    /// Maximum upload size in MB.
    pub max_file_size_mb: usize,
    /// Request timeout in seconds. Simulations run inside the request, so
    /// this also bounds a single simulation.
    pub request_timeout_secs: u64,
    /// Simulator executable.
    pub simulator_bin: String,
    /// Workflow template directory copied into every run directory.
    pub workflow_dir: PathBuf,
    /// Workflow file passed to `<simulator> run -w`.
    pub workflow_file: String,
    /// Where the mutated gbXML is written, relative to the run directory.
    pub gbxml_relative_path: PathBuf,
    /// Parent directory for run directories (system temp when unset).
    pub run_root: Option<PathBuf>,
    /// Simulations allowed to run at once.
    pub max_concurrent_simulations: usize,
    /// Keep run directories after completion (debugging).
    pub keep_run_dirs: bool,
    /// JSON field catalog replacing the built-in one.
    pub field_catalog_path: Option<PathBuf>,
    /// Allowed CORS origins (comma-separated, or "*" for all).
    pub cors_origins: Vec<String>,
    /// Emit JSON logs instead of pretty ones.
    pub json_logs: bool,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 8080),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| {
                // Docker images ship /app/cache; local runs use ./.cache
                if std::path::Path::new("/.dockerenv").exists() {
                    "/app/cache".into()
                } else {
                    std::env::current_dir()
                        .ok()
                        .and_then(|dir| dir.join(".cache").to_str().map(|s| s.to_string()))
                        .unwrap_or_else(|| "./.cache".into())
                }
            }),
            max_file_size_mb: env_or("MAX_FILE_SIZE_MB", 100),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 1800),
            simulator_bin: std::env::var("SIMULATOR_BIN").unwrap_or_else(|_| "openstudio".into()),
            workflow_dir: env_path("WORKFLOW_DIR").unwrap_or_else(|| PathBuf::from("./openstudio")),
            workflow_file: std::env::var("WORKFLOW_FILE").unwrap_or_else(|_| "convert.osw".into()),
            gbxml_relative_path: env_path("GBXML_RELATIVE_PATH")
                .unwrap_or_else(|| PathBuf::from("gbxmls/test.xml")),
            run_root: env_path("RUN_ROOT"),
            max_concurrent_simulations: env_or("MAX_CONCURRENT_SIMULATIONS", 1usize).max(1),
            keep_run_dirs: env_flag("KEEP_RUN_DIRS"),
            field_catalog_path: env_path("FIELD_CATALOG_PATH"),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
