use axum::Json;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use lightmap_shared::PredictionReport;
use serde::Deserialize;
use tracing::debug;

use crate::error::OrchestrationError;
use crate::state::AppState;

const NO_STORE: &str = "no-store";

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    #[serde(default)]
    pub year: Option<String>,
}

/// `GET /proxy?year=`: predictions keyed by division, failed divisions omitted.
pub async fn get_predictions_map(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Response, OrchestrationError> {
    state.observability.record_proxy_request();
    let year = parse_year(query.year.as_deref());

    let predictions = state
        .fan_out
        .fetch_all(year)
        .await
        .inspect_err(|_| state.observability.record_orchestration_failure())?;

    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(predictions)).into_response())
}

/// `GET /api/predictions?year=`: every division with an explicit status.
pub async fn get_prediction_report(
    State(state): State<AppState>,
    Query(query): Query<YearQuery>,
) -> Result<Response, OrchestrationError> {
    state.observability.record_report_request();
    let year = parse_year(query.year.as_deref());

    let regions = state
        .fan_out
        .fetch_report(year)
        .await
        .inspect_err(|_| state.observability.record_orchestration_failure())?;

    let report = PredictionReport {
        year,
        generated_at: Utc::now().to_rfc3339(),
        regions,
    };
    Ok(([(header::CACHE_CONTROL, NO_STORE)], Json(report)).into_response())
}

/// Numeric coercion of the `year` parameter. Anything that is not an integral
/// number in `i32` range is treated as absent and left for the prediction
/// service to judge.
fn parse_year(raw: Option<&str>) -> Option<i32> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }

    let coerced = raw
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .filter(|value| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(value))
        .map(|value| value as i32);
    if coerced.is_none() {
        debug!(raw, "year parameter is not an integer; forwarding without a year");
    }
    coerced
}
