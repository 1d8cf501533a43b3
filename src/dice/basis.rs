//! Seeded orthonormal basis construction.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Draws a `dim x dim` standard-Gaussian matrix from `seed`.
pub(crate) fn gaussian_matrix(dim: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    DMatrix::from_fn(dim, dim, |_, _| rng.sample::<f64, _>(StandardNormal))
}

/// The square `Q` factor of the QR decomposition of `matrix`.
pub(crate) fn q_factor(matrix: DMatrix<f64>) -> DMatrix<f64> {
    matrix.qr().q()
}

/// Seeded orthonormal basis used by every DICE encoder with this `(dim, seed)`.
pub(crate) fn orthonormal_basis(dim: usize, seed: u64) -> DMatrix<f64> {
    q_factor(gaussian_matrix(dim, seed))
}
