use std::fmt::Write as _;

use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use lightmap_shared::{Coordinates, DivisionLocation, locate_division};
use serde::Deserialize;

use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let client = state.fan_out.client();
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "regions": state.fan_out.regions().len(),
        "upstream_url": client.url().as_str(),
        "upstream_timeout_ms": client.timeout().as_millis() as u64,
        "observability": {
            "proxy_requests_total": observability.proxy_requests_total,
            "report_requests_total": observability.report_requests_total,
            "orchestration_failures_total": observability.orchestration_failures_total,
            "fanout_rounds_total": observability.fanout_rounds_total,
            "upstream_success_total": observability.upstream_success_total,
            "upstream_timeouts_total": observability.upstream_timeouts_total,
            "upstream_status_errors_total": observability.upstream_status_errors_total,
            "upstream_network_errors_total": observability.upstream_network_errors_total,
            "upstream_decode_errors_total": observability.upstream_decode_errors_total,
            "upstream_unrecognized_payloads_total": observability.upstream_unrecognized_payloads_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = render_prometheus_metrics(
        state.fan_out.regions().len(),
        state.observability.snapshot(),
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

fn render_prometheus_metrics(region_count: usize, observability: ObservabilitySnapshot) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "lightmap_regions",
        "gauge",
        "Number of divisions queried per fan-out round.",
        region_count as u64,
    );

    let counters = [
        (
            "lightmap_proxy_requests_total",
            "Total /proxy requests.",
            observability.proxy_requests_total,
        ),
        (
            "lightmap_report_requests_total",
            "Total /api/predictions requests.",
            observability.report_requests_total,
        ),
        (
            "lightmap_orchestration_failures_total",
            "Total fan-out rounds that failed as a whole.",
            observability.orchestration_failures_total,
        ),
        (
            "lightmap_fanout_rounds_total",
            "Total fan-out rounds started.",
            observability.fanout_rounds_total,
        ),
        (
            "lightmap_upstream_success_total",
            "Total division predictions received.",
            observability.upstream_success_total,
        ),
        (
            "lightmap_upstream_timeouts_total",
            "Total division calls cancelled at the deadline.",
            observability.upstream_timeouts_total,
        ),
        (
            "lightmap_upstream_status_errors_total",
            "Total division calls answered with a non-success status.",
            observability.upstream_status_errors_total,
        ),
        (
            "lightmap_upstream_network_errors_total",
            "Total division calls that failed in transport.",
            observability.upstream_network_errors_total,
        ),
        (
            "lightmap_upstream_decode_errors_total",
            "Total division calls with an unreadable prediction body.",
            observability.upstream_decode_errors_total,
        ),
        (
            "lightmap_upstream_unrecognized_payloads_total",
            "Total division predictions passed through without the documented shape.",
            observability.upstream_unrecognized_payloads_total,
        ),
    ];
    for (name, help, value) in counters {
        write_metric(&mut body, name, "counter", help, value);
    }

    body
}

/// Serve the pre-serialized division listing.
pub async fn get_divisions(State(state): State<AppState>) -> Response {
    json_bytes_response((*state.divisions_json).clone(), "public, max-age=3600")
}

#[derive(Debug, Deserialize)]
pub struct LocateQuery {
    pub lat: f64,
    pub lng: f64,
}

pub async fn locate(
    State(state): State<AppState>,
    Query(query): Query<LocateQuery>,
) -> Result<Json<DivisionLocation>, StatusCode> {
    let point = Coordinates {
        lat: query.lat,
        lng: query.lng,
    };
    locate_division(point)
        .filter(|info| state.fan_out.regions().contains(info.name))
        .map(|info| {
            Json(DivisionLocation {
                division: info.name.to_owned(),
            })
        })
        .ok_or(StatusCode::NOT_FOUND)
}

fn json_bytes_response(body: Bytes, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}
