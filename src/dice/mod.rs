//! DICE: deterministic, order-preserving numeric embeddings.
//!
//! A bounded scalar is mapped linearly onto an angle in `[0, π]`, where cosine is
//! monotonically decreasing, then lifted onto a `d`-dimensional unit hypersphere and rotated
//! by a fixed orthonormal basis. Linear distance in `[min_bound, max_bound]` becomes monotonic
//! angular distance between the output vectors.
//!
//! Encoders are immutable once built and can be shared across threads freely.

mod basis;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::DiceError;

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

use crate::constants::{DEFAULT_DICE_SEED, DEFAULT_NUMERIC_DIM, MIN_DICE_DIM};

/// Numeric-to-vector encoder for one bounded feature.
#[derive(Clone)]
pub struct DiceEncoder {
    dim: usize,
    min_bound: f64,
    max_bound: f64,
    seed: u64,
    normalize: bool,
    /// `dim x dim` orthonormal rotation.
    basis: DMatrix<f64>,
}

impl std::fmt::Debug for DiceEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiceEncoder")
            .field("dim", &self.dim)
            .field("min_bound", &self.min_bound)
            .field("max_bound", &self.max_bound)
            .field("seed", &self.seed)
            .field("normalize", &self.normalize)
            .finish()
    }
}

impl DiceEncoder {
    /// Builds an L2-normalizing encoder. Fails if `dim < 2` or the bounds are unusable.
    pub fn new(dim: usize, min_bound: f64, max_bound: f64, seed: u64) -> Result<Self, DiceError> {
        if dim < MIN_DICE_DIM {
            return Err(DiceError::InvalidDimension {
                dim,
                min: MIN_DICE_DIM,
            });
        }
        if !min_bound.is_finite() || !max_bound.is_finite() {
            return Err(DiceError::InvalidBounds {
                min_bound,
                max_bound,
                reason: "bounds must be finite",
            });
        }
        if min_bound > max_bound {
            return Err(DiceError::InvalidBounds {
                min_bound,
                max_bound,
                reason: "min_bound exceeds max_bound",
            });
        }

        Ok(Self {
            dim,
            min_bound,
            max_bound,
            seed,
            normalize: true,
            basis: basis::orthonormal_basis(dim, seed),
        })
    }

    /// Builds an encoder with the crate-wide default width and seed.
    pub fn with_bounds(min_bound: f64, max_bound: f64) -> Result<Self, DiceError> {
        Self::new(DEFAULT_NUMERIC_DIM, min_bound, max_bound, DEFAULT_DICE_SEED)
    }

    /// Enables or disables the final L2 normalization (enabled by default).
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Maps `value` to `t ∈ [0, 1]`, saturating outside the bounds.
    ///
    /// A degenerate range (`min_bound == max_bound`) and `NaN` both map to `0`.
    pub fn unit_position(&self, value: f64) -> f64 {
        let span = self.max_bound - self.min_bound;
        if span == 0.0 || value.is_nan() {
            return 0.0;
        }
        ((value - self.min_bound) / span).clamp(0.0, 1.0)
    }

    /// Angle in `[0, π]` assigned to `value`.
    pub fn angle(&self, value: f64) -> f64 {
        self.unit_position(value) * PI
    }

    /// Point on the unit hypersphere for `theta`, before rotation.
    fn polar_point(&self, theta: f64) -> Vec<f64> {
        let (sin, cos) = theta.sin_cos();
        if self.dim == 2 {
            return vec![cos, sin];
        }

        (1..=self.dim)
            .map(|i| {
                if i < self.dim {
                    sin.powi(i as i32 - 1) * cos
                } else {
                    sin.powi(self.dim as i32)
                }
            })
            .collect()
    }

    /// Encodes `value` into a vector of length [`dim`](Self::dim).
    pub fn make_vector(&self, value: f64) -> Vec<f32> {
        let point = DVector::from_vec(self.polar_point(self.angle(value)));
        let mut rotated = &self.basis * point;

        if self.normalize {
            let norm = rotated.norm();
            if norm > 0.0 {
                rotated /= norm;
            }
        }

        rotated.iter().map(|&x| x as f32).collect()
    }

    /// Output vector width.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `(min_bound, max_bound)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min_bound, self.max_bound)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn normalizes(&self) -> bool {
        self.normalize
    }

    /// Orthonormal basis `Q`.
    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }
}
