use serde::{Deserialize, Serialize};

use crate::division::{Bounds, Coordinates};

/// Body of every request-level failure returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionListing {
    pub divisions: Vec<DivisionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionLocation {
    pub division: String,
}
