use serde::{Deserialize, Serialize};

use super::error::ScoringError;

/// Integer risk code reported to callers (`0` is conventionally "low").
pub type RiskLevel = u32;

/// One threshold: scores up to and including `upper_bound` map to `code`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub code: RiskLevel,
    pub upper_bound: f64,
}

impl RiskCategory {
    pub fn new(code: RiskLevel, upper_bound: f64) -> Self {
        Self { code, upper_bound }
    }
}

/// Ordered thresholds mapping a probability to a risk code.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskClassifier {
    categories: Vec<RiskCategory>,
}

impl RiskClassifier {
    /// Sorts `categories` ascending by `upper_bound`. Empty lists and NaN bounds are rejected.
    pub fn new(mut categories: Vec<RiskCategory>) -> Result<Self, ScoringError> {
        if categories.is_empty() {
            return Err(ScoringError::EmptyCategories);
        }
        if let Some(bad) = categories.iter().find(|c| c.upper_bound.is_nan()) {
            return Err(ScoringError::InvalidCategory {
                reason: format!("category {} has a NaN upper_bound", bad.code),
            });
        }
        categories.sort_by(|a, b| a.upper_bound.total_cmp(&b.upper_bound));
        Ok(Self { categories })
    }

    /// First category whose `upper_bound >= score`; the last category otherwise.
    pub fn classify(&self, score: f64) -> RiskLevel {
        self.categories
            .iter()
            .find(|c| score <= c.upper_bound)
            .unwrap_or_else(|| self.fallback())
            .code
    }

    /// The category with the smallest upper bound.
    pub fn lowest(&self) -> &RiskCategory {
        &self.categories[0]
    }

    /// The category used when no threshold covers the score.
    pub fn fallback(&self) -> &RiskCategory {
        &self.categories[self.categories.len() - 1]
    }

    pub fn is_lowest(&self, level: RiskLevel) -> bool {
        level == self.lowest().code
    }

    pub fn categories(&self) -> &[RiskCategory] {
        &self.categories
    }
}
