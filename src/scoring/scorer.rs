use super::error::InferenceError;

/// Opaque model mapping an embedding to a single logit.
///
/// `input` is the row-major flattened embedding and `shape` its declared shape. Implementations
/// must be deterministic and safe to call from several threads at once.
pub trait RiskScorer: Send + Sync {
    fn forward(&self, input: &[f32], shape: &[usize]) -> Result<f32, InferenceError>;

    /// Registry key of the architecture, for logs and metadata.
    fn architecture(&self) -> &str;
}

/// Logistic function, evaluated in `f64`.
pub fn sigmoid(logit: f32) -> f64 {
    1.0 / (1.0 + (-(logit as f64)).exp())
}
