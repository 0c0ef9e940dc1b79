use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prediction::{PollutionLevel, Prediction, PredictionMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Upstream,
    Network,
    Decode,
}

/// Settled result of one division's upstream call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegionOutcome {
    Ok {
        /// Upstream payload, untouched.
        prediction: Value,
        /// Classification read from the payload, when it has the documented shape.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<PollutionLevel>,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl RegionOutcome {
    pub fn ok(prediction: Value) -> Self {
        let level = Prediction::from_payload(&prediction).map(|view| view.classification_result);
        Self::Ok { prediction, level }
    }

    pub fn prediction(&self) -> Option<&Value> {
        match self {
            Self::Ok { prediction, .. } => Some(prediction),
            Self::Failed { .. } => None,
        }
    }
}

/// Per-division status for one fan-out round. Unlike [`PredictionMap`], every
/// requested division is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    #[serde(default)]
    pub year: Option<i32>,
    pub generated_at: String,
    pub regions: BTreeMap<String, RegionOutcome>,
}

impl PredictionReport {
    pub fn failed(&self) -> impl Iterator<Item = (&str, FailureKind)> {
        self.regions
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                RegionOutcome::Failed { kind, .. } => Some((name.as_str(), *kind)),
                RegionOutcome::Ok { .. } => None,
            })
    }

    pub fn into_predictions(self) -> PredictionMap {
        self.regions
            .into_iter()
            .filter_map(|(name, outcome)| match outcome {
                RegionOutcome::Ok { prediction, .. } => Some((name, prediction)),
                RegionOutcome::Failed { .. } => None,
            })
            .collect()
    }
}
