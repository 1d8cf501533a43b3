use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiceError {
    #[error("invalid DICE dimension {dim}: must be at least {min}")]
    InvalidDimension { dim: usize, min: usize },

    #[error("invalid DICE bounds [{min_bound}, {max_bound}]: {reason}")]
    InvalidBounds {
        min_bound: f64,
        max_bound: f64,
        reason: &'static str,
    },
}
