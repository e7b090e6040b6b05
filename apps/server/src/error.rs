// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    extract::multipart::MultipartError,
    BoxError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::SimulationError;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing 'gbxml' file in request")]
    MissingFile,

    #[error("Missing report HTML in request body")]
    MissingReport,

    #[error("File too large: maximum size is {max_mb} MB")]
    FileTooLarge { max_mb: usize },

    #[error("Invalid UTF-8 content")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    InvalidDocument(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Join error")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ApiError::MissingReport => (StatusCode::BAD_REQUEST, "MISSING_REPORT"),
            ApiError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE"),
            ApiError::InvalidUtf8(_) => (StatusCode::BAD_REQUEST, "INVALID_UTF8"),
            ApiError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE")
            }
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MULTIPART_ERROR"),
            ApiError::InvalidDocument(_) => (StatusCode::BAD_REQUEST, "INVALID_XML"),
            ApiError::Processing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR"),
            ApiError::Simulation(e) => (StatusCode::INTERNAL_SERVER_ERROR, simulation_code(e)),
            ApiError::Cache(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            ApiError::Timeout { .. } => (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        }
    }
}

fn simulation_code(err: &SimulationError) -> &'static str {
    match err {
        SimulationError::ExternalProcessFailure { .. } => "SIMULATION_FAILED",
        SimulationError::ReportNotFound(_) => "REPORT_NOT_FOUND",
        SimulationError::Spawn { .. } | SimulationError::WorkflowMissing(_) => {
            "SIMULATOR_UNAVAILABLE"
        }
        SimulationError::QueueClosed | SimulationError::Io(_) => "SIMULATION_IO_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Errors raised by the middleware stack (only the request timeout today),
/// rendered with the same `{error, code}` body as handler errors.
pub fn middleware_error(err: BoxError, timeout_secs: u64) -> ApiError {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout { secs: timeout_secs }
    } else {
        ApiError::Internal(format!("Unhandled middleware error: {err}"))
    }
}

impl From<studiox_core::Error> for ApiError {
    fn from(err: studiox_core::Error) -> Self {
        if err.is_caller_error() {
            ApiError::InvalidDocument(err.to_string())
        } else {
            ApiError::Processing(err.to_string())
        }
    }
}

impl From<cacache::Error> for ApiError {
    fn from(err: cacache::Error) -> Self {
        ApiError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_split_by_blame() {
        let caller: ApiError = studiox_core::Error::MissingRootElement.into();
        assert_eq!(caller.status_and_code(), (StatusCode::BAD_REQUEST, "INVALID_XML"));

        let server: ApiError = studiox_core::Error::Serialize("boom".into()).into();
        assert_eq!(
            server.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR")
        );
    }

    #[test]
    fn test_middleware_errors() {
        let err = middleware_error(BoxError::from("connection reset"), 30);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );

        let err = ApiError::Timeout { secs: 30 };
        assert_eq!(
            err.status_and_code(),
            (StatusCode::REQUEST_TIMEOUT, "REQUEST_TIMEOUT")
        );
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn test_simulation_errors_are_server_errors() {
        let err: ApiError = SimulationError::ExternalProcessFailure { code: Some(1) }.into();
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "SIMULATION_FAILED")
        );
        assert_eq!(err.to_string(), "Simulation failed: Simulator exited with code 1");

        let err: ApiError = SimulationError::ReportNotFound("run".into()).into();
        assert_eq!(err.status_and_code().1, "REPORT_NOT_FOUND");
    }
}
