//! Counterfactual explanations: which single feature, reset to a "safe" baseline, clears
//! the predicted risk.

mod baseline;
mod counterfactual;
pub mod error;
mod types;


pub use baseline::BaselineProfile;
pub use counterfactual::{CounterfactualExplainer, ExplainerConfig};
pub use error::ExplainError;
pub use types::ExplanationResult;
