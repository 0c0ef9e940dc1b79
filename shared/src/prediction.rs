use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Division name -> upstream payload, for every division whose upstream call
/// succeeded. Payloads are kept exactly as the prediction service sent them.
pub type PredictionMap = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollutionLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl PollutionLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Severe => "severe",
        }
    }
}

/// Body posted to the prediction service for one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub division: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Typed view of a prediction service payload. The proxy never re-serializes
/// payloads through this type; it is only read for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// `[night_light_mean, ndvi_mean, population_dense_mean]`
    pub regression_result: [f64; 3],
    pub classification_result: PollutionLevel,
    pub llm_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub night_light_mean: f64,
    pub ndvi_mean: f64,
    pub population_dense_mean: f64,
}

impl Prediction {
    /// `None` when the payload does not have the documented shape.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok()
    }

    pub fn regression(&self) -> RegressionResult {
        let [night_light_mean, ndvi_mean, population_dense_mean] = self.regression_result;
        RegressionResult {
            night_light_mean,
            ndvi_mean,
            population_dense_mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{PollutionLevel, Prediction, PredictionRequest};

    #[test]
    fn request_omits_missing_year() {
        let request = PredictionRequest {
            division: "Dhaka".to_string(),
            year: None,
        };
        assert_eq!(
            serde_json::to_string(&request).expect("serialize request"),
            r#"{"division":"Dhaka"}"#
        );

        let request = PredictionRequest {
            division: "Sylhet".to_string(),
            year: Some(2021),
        };
        assert_eq!(
            serde_json::to_string(&request).expect("serialize request"),
            r#"{"division":"Sylhet","year":2021}"#
        );
    }

    #[test]
    fn prediction_accepts_integer_regression_values() {
        let payload = r#"{
            "regression_result": [1, 2, 3],
            "classification_result": "low",
            "llm_suggestion": "x\ny"
        }"#;
        let prediction: Prediction = serde_json::from_str(payload).expect("parse prediction");
        assert_eq!(prediction.regression_result, [1.0, 2.0, 3.0]);
        assert_eq!(prediction.classification_result, PollutionLevel::Low);
        assert_eq!(prediction.llm_suggestion, "x\ny");

        let regression = prediction.regression();
        assert_eq!(regression.night_light_mean, 1.0);
        assert_eq!(regression.ndvi_mean, 2.0);
        assert_eq!(regression.population_dense_mean, 3.0);
    }

    #[test]
    fn prediction_rejects_unknown_level_and_wrong_arity() {
        let unknown_level = r#"{
            "regression_result": [1.0, 2.0, 3.0],
            "classification_result": "extreme",
            "llm_suggestion": ""
        }"#;
        assert!(serde_json::from_str::<Prediction>(unknown_level).is_err());

        let short_regression = r#"{
            "regression_result": [1.0, 2.0],
            "classification_result": "high",
            "llm_suggestion": ""
        }"#;
        assert!(serde_json::from_str::<Prediction>(short_regression).is_err());
    }

    #[test]
    fn view_reads_documented_payloads_and_ignores_extra_fields() {
        let payload = json!({
            "regression_result": [4, 0.5, 700.25],
            "classification_result": "severe",
            "llm_suggestion": "Dim billboards after midnight.",
            "model_version": "rf-2025"
        });
        let prediction = Prediction::from_payload(&payload).expect("documented shape");
        assert_eq!(prediction.classification_result, PollutionLevel::Severe);
        assert_eq!(prediction.regression().night_light_mean, 4.0);

        let unknown_label = json!({
            "regression_result": [4, 0.5, 700.25],
            "classification_result": "Very High",
            "llm_suggestion": ""
        });
        assert_eq!(Prediction::from_payload(&unknown_label), None);
        assert_eq!(Prediction::from_payload(&json!("plain string")), None);
    }

    #[test]
    fn pollution_level_wire_names() {
        for level in [
            PollutionLevel::Low,
            PollutionLevel::Moderate,
            PollutionLevel::High,
            PollutionLevel::Severe,
        ] {
            let json = serde_json::to_string(&level).expect("serialize level");
            assert_eq!(json, format!("\"{}\"", level.as_str()));
        }
    }
}
