use nalgebra::DMatrix;

use super::basis::{gaussian_matrix, q_factor};
use super::*;

const TOLERANCE: f64 = 1e-9;

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

fn assert_orthonormal(q: &DMatrix<f64>, dim: usize) {
    assert_eq!(q.shape(), (dim, dim));
    let deviation = (q.transpose() * q - DMatrix::<f64>::identity(dim, dim)).amax();
    assert!(
        deviation < TOLERANCE,
        "QᵗQ deviates from I by {deviation} (dim={dim})"
    );
}

#[test]
fn test_rejects_dimension_below_two() {
    for dim in [0, 1] {
        let err = DiceEncoder::new(dim, 0.0, 100.0, 13).unwrap_err();
        assert_eq!(err, DiceError::InvalidDimension { dim, min: 2 });
    }
}

#[test]
fn test_rejects_inverted_or_non_finite_bounds() {
    assert!(matches!(
        DiceEncoder::new(4, 10.0, 0.0, 13),
        Err(DiceError::InvalidBounds { .. })
    ));
    assert!(matches!(
        DiceEncoder::new(4, f64::NEG_INFINITY, 0.0, 13),
        Err(DiceError::InvalidBounds { .. })
    ));
    assert!(matches!(
        DiceEncoder::new(4, 0.0, f64::NAN, 13),
        Err(DiceError::InvalidBounds { .. })
    ));
}

#[test]
fn test_basis_is_orthonormal_across_dims_and_seeds() {
    for dim in [2, 3, 5, 8, 32, 64] {
        for seed in [0, 1, 13, 9_999] {
            let encoder = DiceEncoder::new(dim, 0.0, 1.0, seed).unwrap();
            assert_orthonormal(encoder.basis(), dim);
        }
    }
}

#[test]
fn test_q_factor_of_identity_is_orthonormal() {
    let dim = 4;
    assert_orthonormal(&q_factor(DMatrix::identity(dim, dim)), dim);
}

#[test]
fn test_gaussian_matrix_is_seeded() {
    assert_eq!(gaussian_matrix(6, 13), gaussian_matrix(6, 13));
    assert_ne!(gaussian_matrix(6, 13), gaussian_matrix(6, 14));
    assert_eq!(gaussian_matrix(5, 1).shape(), (5, 5));
}

#[test]
fn test_output_is_unit_length() {
    let encoder = DiceEncoder::new(32, 0.0, 100.0, 13).unwrap();
    for value in [-5.0, 0.0, 12.5, 50.0, 99.0, 100.0, 1e9] {
        let v = encoder.make_vector(value);
        assert_eq!(v.len(), 32);
        assert!((norm(&v) - 1.0).abs() < 1e-5, "value {value} norm {}", norm(&v));
    }
}

#[test]
fn test_saturates_outside_bounds() {
    let encoder = DiceEncoder::new(16, 18.0, 90.0, 13).unwrap();

    let at_min = encoder.make_vector(18.0);
    let at_max = encoder.make_vector(90.0);

    for below in [17.999, 0.0, -1e6, f64::NEG_INFINITY] {
        assert_eq!(encoder.make_vector(below), at_min);
    }
    for above in [90.001, 1e6, f64::INFINITY] {
        assert_eq!(encoder.make_vector(above), at_max);
    }
}

#[test]
fn test_nan_maps_to_lower_bound() {
    let encoder = DiceEncoder::new(8, 0.0, 10.0, 13).unwrap();
    assert_eq!(encoder.make_vector(f64::NAN), encoder.make_vector(0.0));
}

#[test]
fn test_degenerate_range_maps_everything_to_zero_angle() {
    let encoder = DiceEncoder::new(8, 5.0, 5.0, 13).unwrap();
    assert_eq!(encoder.angle(-3.0), 0.0);
    assert_eq!(encoder.angle(5.0), 0.0);
    assert_eq!(encoder.angle(42.0), 0.0);
    assert_eq!(encoder.make_vector(1.0), encoder.make_vector(100.0));
}

#[test]
fn test_identical_encoders_are_bit_identical() {
    let a = DiceEncoder::new(32, 0.0, 1_000.0, 13).unwrap();
    let b = DiceEncoder::new(32, 0.0, 1_000.0, 13).unwrap();
    for value in [0.0, 1.0, 333.3, 999.99] {
        let va: Vec<u32> = a.make_vector(value).iter().map(|x| x.to_bits()).collect();
        let vb: Vec<u32> = b.make_vector(value).iter().map(|x| x.to_bits()).collect();
        assert_eq!(va, vb);
    }
}

#[test]
fn test_different_seeds_rotate_differently() {
    let a = DiceEncoder::new(8, 0.0, 1.0, 13).unwrap();
    let b = DiceEncoder::new(8, 0.0, 1.0, 14).unwrap();
    assert_ne!(a.make_vector(0.5), b.make_vector(0.5));
}

#[test]
fn test_dice2_endpoints_are_antipodal() {
    let encoder = DiceEncoder::new(2, 0.0, 100.0, 13).unwrap();
    assert_eq!(encoder.angle(0.0), 0.0);
    assert!((encoder.angle(100.0) - std::f64::consts::PI).abs() < TOLERANCE);

    let lo = encoder.make_vector(0.0);
    let hi = encoder.make_vector(100.0);
    assert!((dot(&lo, &hi) + 1.0).abs() < 1e-5, "cos = {}", dot(&lo, &hi));
}

#[test]
fn test_cosine_similarity_decreases_with_distance() {
    let encoder = DiceEncoder::new(32, 0.0, 100.0, 13).unwrap();
    let anchor = encoder.make_vector(10.0);

    let sims: Vec<f32> = [10.0, 20.0, 40.0, 70.0, 100.0]
        .iter()
        .map(|v| dot(&anchor, &encoder.make_vector(*v)))
        .collect();

    for pair in sims.windows(2) {
        assert!(pair[0] >= pair[1] - 1e-6, "similarities not monotone: {sims:?}");
    }
}

#[test]
fn test_without_normalization_keeps_rotation_norm() {
    let encoder = DiceEncoder::new(4, 0.0, 1.0, 13)
        .unwrap()
        .with_normalization(false);
    assert!(!encoder.normalizes());
    // θ = 0 lifts to e1, which an orthonormal rotation keeps at unit length.
    let v = encoder.make_vector(0.0);
    assert!((norm(&v) - 1.0).abs() < 1e-5);
}

#[test]
fn test_with_bounds_uses_defaults() {
    let encoder = DiceEncoder::with_bounds(0.0, 1.0).unwrap();
    assert_eq!(encoder.dim(), crate::constants::DEFAULT_NUMERIC_DIM);
    assert_eq!(encoder.seed(), crate::constants::DEFAULT_DICE_SEED);
    assert_eq!(encoder.bounds(), (0.0, 1.0));
}
