use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use lightmap_shared::{Prediction, PredictionMap, RegionOutcome};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RegionSet;
use crate::error::{FetchError, OrchestrationError};
use crate::services::prediction_client::PredictionClient;
use crate::state::ObservabilityCounters;

type SettledRegion = (String, Result<Value, FetchError>);

/// Queries every division of a [`RegionSet`] concurrently and merges the
/// results. Division failures are absorbed here; only a broken fan-out
/// harness is reported to the caller.
#[derive(Clone)]
pub struct FanOut {
    client: PredictionClient,
    regions: RegionSet,
    observability: Arc<ObservabilityCounters>,
}

impl FanOut {
    pub fn new(
        client: PredictionClient,
        regions: RegionSet,
        observability: Arc<ObservabilityCounters>,
    ) -> Self {
        Self {
            client,
            regions,
            observability,
        }
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn client(&self) -> &PredictionClient {
        &self.client
    }

    /// Predictions for every division whose call succeeded. Failed divisions
    /// are absent; if all fail the map is empty.
    pub async fn fetch_all(&self, year: Option<i32>) -> Result<PredictionMap, OrchestrationError> {
        let settled = self.settle_round(year).await?;
        Ok(merge_successes(settled))
    }

    /// Outcome for every division of the set, failures included.
    pub async fn fetch_report(
        &self,
        year: Option<i32>,
    ) -> Result<BTreeMap<String, RegionOutcome>, OrchestrationError> {
        let settled = self.settle_round(year).await?;
        Ok(collect_outcomes(settled))
    }

    async fn settle_round(&self, year: Option<i32>) -> Result<Vec<SettledRegion>, OrchestrationError> {
        self.observability.record_fanout_round();
        let client = self.client.clone();
        let settled = settle_round_with(&self.regions, year, move |region, year| {
            let client = client.clone();
            async move { client.fetch_region(&region, year).await }
        })
        .await?;

        self.record_round(&settled);
        Ok(settled)
    }

    fn record_round(&self, settled: &[SettledRegion]) {
        let mut succeeded = 0_usize;
        for (region, result) in settled {
            match result {
                Ok(payload) => {
                    succeeded += 1;
                    self.observability.record_upstream_success();
                    if Prediction::from_payload(payload).is_none() {
                        self.observability.record_unrecognized_payload();
                        debug!(
                            region = %region,
                            "prediction payload has an unfamiliar shape; passing it through"
                        );
                    }
                }
                Err(e) => {
                    self.observability.record_upstream_failure(e.kind());
                    warn!(
                        region = e.region(),
                        kind = ?e.kind(),
                        error = %e,
                        "division fetch failed; omitting it from this round"
                    );
                }
            }
        }
        info!(
            succeeded,
            failed = settled.len() - succeeded,
            "fan-out round settled"
        );
    }
}

/// Spawn one fetch per region before awaiting any of them, then wait for all
/// of them to settle. Results come back in region-set order.
async fn settle_round_with<F, Fut>(
    regions: &RegionSet,
    year: Option<i32>,
    fetch: F,
) -> Result<Vec<SettledRegion>, OrchestrationError>
where
    F: Fn(String, Option<i32>) -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + Send + 'static,
{
    let handles: Vec<_> = regions
        .iter()
        .map(|region| tokio::spawn(fetch(region.to_owned(), year)))
        .collect();

    let joined = join_all(handles).await;

    let mut settled = Vec::with_capacity(joined.len());
    for (region, outcome) in regions.iter().zip(joined) {
        let result = outcome.map_err(|source| OrchestrationError::Task {
            region: region.to_owned(),
            source,
        })?;
        settled.push((region.to_owned(), result));
    }
    Ok(settled)
}

fn merge_successes(settled: Vec<SettledRegion>) -> PredictionMap {
    settled
        .into_iter()
        .filter_map(|(region, result)| result.ok().map(|prediction| (region, prediction)))
        .collect()
}

fn collect_outcomes(settled: Vec<SettledRegion>) -> BTreeMap<String, RegionOutcome> {
    settled
        .into_iter()
        .map(|(region, result)| {
            let outcome = match result {
                Ok(prediction) => RegionOutcome::ok(prediction),
                Err(e) => RegionOutcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                },
            };
            (region, outcome)
        })
        .collect()
}
