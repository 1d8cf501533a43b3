use serde::{Deserialize, Serialize};

/// Which single-feature resets clear the risk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExplanationResult {
    pub explanation_type: String,
    /// Drivers in canonical feature order.
    pub risk_drivers: Vec<String>,
    #[serde(default)]
    pub notes: String,
}
