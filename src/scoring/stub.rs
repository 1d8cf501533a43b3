use super::error::InferenceError;
use super::scorer::RiskScorer;

/// Weight-free scorer for development: `logit = weight * mean(input) + bias`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StubScorer {
    pub weight: f32,
    pub bias: f32,
}

impl Default for StubScorer {
    fn default() -> Self {
        Self {
            weight: 8.0,
            bias: 0.0,
        }
    }
}

impl StubScorer {
    pub fn new(weight: f32, bias: f32) -> Self {
        Self { weight, bias }
    }
}

impl RiskScorer for StubScorer {
    fn forward(&self, input: &[f32], _shape: &[usize]) -> Result<f32, InferenceError> {
        if input.is_empty() {
            return Err(InferenceError::ForwardFailed {
                reason: "empty input".to_string(),
            });
        }
        let mean = input.iter().sum::<f32>() / input.len() as f32;
        Ok(self.weight * mean + self.bias)
    }

    fn architecture(&self) -> &str {
        "stub"
    }
}
