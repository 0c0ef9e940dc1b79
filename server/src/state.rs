use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lightmap_shared::{DivisionListing, DivisionSummary, FailureKind, division_info};
use tracing::warn;

use crate::config::{ProxyConfig, RegionSet};
use crate::error::ConfigError;
use crate::services::fan_out::FanOut;
use crate::services::prediction_client::PredictionClient;

#[derive(Clone)]
pub struct AppState {
    pub fan_out: FanOut,
    /// Division listing, serialized once at startup.
    pub divisions_json: Arc<Bytes>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    proxy_requests_total: AtomicU64,
    report_requests_total: AtomicU64,
    orchestration_failures_total: AtomicU64,
    fanout_rounds_total: AtomicU64,
    upstream_success_total: AtomicU64,
    upstream_timeouts_total: AtomicU64,
    upstream_status_errors_total: AtomicU64,
    upstream_network_errors_total: AtomicU64,
    upstream_decode_errors_total: AtomicU64,
    upstream_unrecognized_payloads_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub proxy_requests_total: u64,
    pub report_requests_total: u64,
    pub orchestration_failures_total: u64,
    pub fanout_rounds_total: u64,
    pub upstream_success_total: u64,
    pub upstream_timeouts_total: u64,
    pub upstream_status_errors_total: u64,
    pub upstream_network_errors_total: u64,
    pub upstream_decode_errors_total: u64,
    pub upstream_unrecognized_payloads_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            proxy_requests_total: self.proxy_requests_total.load(Ordering::Relaxed),
            report_requests_total: self.report_requests_total.load(Ordering::Relaxed),
            orchestration_failures_total: self
                .orchestration_failures_total
                .load(Ordering::Relaxed),
            fanout_rounds_total: self.fanout_rounds_total.load(Ordering::Relaxed),
            upstream_success_total: self.upstream_success_total.load(Ordering::Relaxed),
            upstream_timeouts_total: self.upstream_timeouts_total.load(Ordering::Relaxed),
            upstream_status_errors_total: self
                .upstream_status_errors_total
                .load(Ordering::Relaxed),
            upstream_network_errors_total: self
                .upstream_network_errors_total
                .load(Ordering::Relaxed),
            upstream_decode_errors_total: self
                .upstream_decode_errors_total
                .load(Ordering::Relaxed),
            upstream_unrecognized_payloads_total: self
                .upstream_unrecognized_payloads_total
                .load(Ordering::Relaxed),
        }
    }

    pub fn record_proxy_request(&self) {
        self.proxy_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report_request(&self) {
        self.report_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_orchestration_failure(&self) {
        self.orchestration_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fanout_round(&self) {
        self.fanout_rounds_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_success(&self) {
        self.upstream_success_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unrecognized_payload(&self) {
        self.upstream_unrecognized_payloads_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_failure(&self, kind: FailureKind) {
        let counter = match kind {
            FailureKind::Timeout => &self.upstream_timeouts_total,
            FailureKind::Upstream => &self.upstream_status_errors_total,
            FailureKind::Network => &self.upstream_network_errors_total,
            FailureKind::Decode => &self.upstream_decode_errors_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(config: &ProxyConfig) -> Result<Self, ConfigError> {
        let client = PredictionClient::from_config(config)?;
        Ok(Self::with_client(client, config.regions.clone()))
    }

    pub fn with_client(client: PredictionClient, regions: RegionSet) -> Self {
        let observability = Arc::new(ObservabilityCounters::default());
        let divisions_json = Arc::new(serialize_division_listing(&regions));
        Self {
            fan_out: FanOut::new(client, regions, Arc::clone(&observability)),
            divisions_json,
            observability,
        }
    }
}

fn division_listing(regions: &RegionSet) -> DivisionListing {
    let divisions = regions
        .iter()
        .map(|name| {
            let info = division_info(name);
            DivisionSummary {
                name: name.to_owned(),
                centroid: info.map(|info| info.centroid),
                bounds: info.map(|info| info.bounds),
            }
        })
        .collect();
    DivisionListing { divisions }
}

fn serialize_division_listing(regions: &RegionSet) -> Bytes {
    serde_json::to_vec(&division_listing(regions))
        .map(Bytes::from)
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to serialize division listing");
            Bytes::from_static(br#"{"divisions":[]}"#)
        })
}
