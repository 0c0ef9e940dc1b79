use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lightmap_shared::{ErrorEnvelope, FailureKind};
use thiserror::Error;

const ORCHESTRATION_ERROR_MESSAGE: &str = "Failed to fetch data from API";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("region set is empty")]
    EmptyRegionSet,

    #[error("region at index {index} is blank")]
    BlankRegion { index: usize },

    #[error("region {0:?} is listed more than once")]
    DuplicateRegion(String),

    #[error("invalid upstream URL {url:?}: {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure of a single division's upstream call. Absorbed by the fan-out,
/// never surfaced as a request-level error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timeout for {region} after {}ms", .after.as_millis())]
    Timeout { region: String, after: Duration },

    #[error("error fetching data for {region}: upstream returned {status}")]
    Upstream {
        region: String,
        status: reqwest::StatusCode,
    },

    #[error("network error fetching data for {region}: {source}")]
    Network {
        region: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed prediction for {region}: {source}")]
    Decode {
        region: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn region(&self) -> &str {
        match self {
            Self::Timeout { region, .. }
            | Self::Upstream { region, .. }
            | Self::Network { region, .. }
            | Self::Decode { region, .. } => region,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Network { .. } => FailureKind::Network,
            Self::Decode { .. } => FailureKind::Decode,
        }
    }
}

/// Failure of the fan-out harness itself. This is the only error that reaches
/// HTTP callers.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("fan-out task for {region} did not complete: {source}")]
    Task {
        region: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl IntoResponse for OrchestrationError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "proxy error");
        let body = ErrorEnvelope {
            error: ORCHESTRATION_ERROR_MESSAGE.to_string(),
            details: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
