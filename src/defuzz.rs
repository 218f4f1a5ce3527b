//! Reduction of a discretized curve, or of Sugeno weighted values, to one
//! crisp number.
//!
//! Curves are `(x, y)` pairs of equal length with `x` sorted ascending.

use num::Float;

use crate::error::InferenceError;

fn check_lengths<F>(x: &[F], y: &[F]) -> Result<(), InferenceError> {
    if x.len() != y.len() {
        return Err(InferenceError::LengthMismatch { x: x.len(), y: y.len() });
    }

    Ok(())
}

fn check_curve<F>(x: &[F], y: &[F]) -> Result<(), InferenceError> {
    check_lengths(x, y)?;

    if x.is_empty() {
        return Err(InferenceError::EmptyCurve);
    }

    Ok(())
}

/// Center of gravity, `Σ xᵢ·yᵢ / Σ yᵢ`.
pub fn centroid<F: Float>(x: &[F], y: &[F]) -> Result<F, InferenceError> {
    check_curve(x, y)?;

    let (mass, area) = x
        .iter()
        .zip(y)
        .fold((F::zero(), F::zero()), |(mass, area), (&x, &y)| (mass + x * y, area + y));

    if area == F::zero() {
        return Err(InferenceError::DegenerateArea);
    }

    Ok(mass / area)
}

/// The first sample at which the running area reaches half of the total.
///
/// Areas use the rectangle rule: sample `i` spans back to sample `i - 1`,
/// and the first sample borrows the width of the first step.
pub fn bisector<F: Float>(x: &[F], y: &[F]) -> Result<F, InferenceError> {
    check_curve(x, y)?;

    if x.len() == 1 {
        return if y[0] > F::zero() {
            Ok(x[0])
        } else {
            Err(InferenceError::DegenerateArea)
        };
    }

    let mut running = F::zero();
    let integration: Vec<F> = (0..x.len())
        .map(|i| {
            let width = if i == 0 { x[1] - x[0] } else { x[i] - x[i - 1] };
            running = running + y[i] * width;
            running
        })
        .collect();
    let total = running;

    if total == F::zero() {
        return Err(InferenceError::DegenerateArea);
    }

    let half = total / (F::one() + F::one());
    let k = integration
        .iter()
        .position(|&area| area >= half)
        .unwrap_or(x.len() - 1);

    Ok(x[k])
}

/// First and last indices at which `y` attains its maximum.
fn maximum_bounds<F: Float>(y: &[F]) -> (usize, usize) {
    let maximum = y.iter().copied().fold(F::neg_infinity(), F::max);
    let first = y.iter().position(|&v| v == maximum).unwrap_or(0);
    let last = y.iter().rposition(|&v| v == maximum).unwrap_or(first);

    (first, last)
}

/// Smallest x at which the curve is maximal.
pub fn smallest_of_maximum<F: Float>(x: &[F], y: &[F]) -> Result<F, InferenceError> {
    check_curve(x, y)?;

    Ok(x[maximum_bounds(y).0])
}

/// Largest x at which the curve is maximal.
pub fn largest_of_maximum<F: Float>(x: &[F], y: &[F]) -> Result<F, InferenceError> {
    check_curve(x, y)?;

    Ok(x[maximum_bounds(y).1])
}

/// The sample halfway between the first and last maxima.
pub fn mean_of_maximum<F: Float>(x: &[F], y: &[F]) -> Result<F, InferenceError> {
    check_curve(x, y)?;

    let (first, last) = maximum_bounds(y);

    Ok(x[(first + last) / 2])
}

/// `Σ valueᵢ·weightᵢ`.
pub fn weighted_sum<F: Float>(values: &[F], weights: &[F]) -> Result<F, InferenceError> {
    check_lengths(values, weights)?;

    Ok(values
        .iter()
        .zip(weights)
        .fold(F::zero(), |sum, (&value, &weight)| sum + value * weight))
}

/// `Σ valueᵢ·weightᵢ / Σ weightᵢ`.
pub fn weighted_average<F: Float>(values: &[F], weights: &[F]) -> Result<F, InferenceError> {
    let sum = weighted_sum(values, weights)?;
    let den = weights.iter().copied().fold(F::zero(), |acc, w| acc + w);

    if den == F::zero() {
        return Err(InferenceError::DegenerateArea);
    }

    Ok(sum / den)
}

#[test]
fn test_centroid_symmetric() {
    let x = [0., 1., 2., 3., 4.];
    let y = [0., 0.5, 1., 0.5, 0.];

    assert_eq!(centroid(&x, &y), Ok(2.));
    assert_eq!(bisector(&x, &y), Ok(2.));
}

#[test]
fn test_maxima() {
    let x = [0., 1., 2., 3., 4., 5.];
    let y = [0.1, 0.7, 0.7, 0.2, 0.7, 0.];

    assert_eq!(smallest_of_maximum(&x, &y), Ok(1.));
    assert_eq!(largest_of_maximum(&x, &y), Ok(4.));
    assert_eq!(mean_of_maximum(&x, &y), Ok(2.));
}

#[test]
fn test_bisector_skewed() {
    let x = [0., 1., 2., 3., 4.];
    let y = [1., 1., 0., 0., 1.];

    // Running areas 1, 2, 2, 2, 3 against a half of 1.5
    assert_eq!(bisector(&x, &y), Ok(1.));
    assert_eq!(bisector(&[3.], &[0.5]), Ok(3.));
}

#[test]
fn test_zero_curve() {
    let x = [0., 1., 2.];
    let y = [0., 0., 0.];

    assert_eq!(centroid(&x, &y), Err(InferenceError::DegenerateArea));
    assert_eq!(bisector(&x, &y), Err(InferenceError::DegenerateArea));
    assert_eq!(weighted_average(&x, &y), Err(InferenceError::DegenerateArea));
    assert_eq!(weighted_sum(&x, &y), Ok(0.));
    assert_eq!(smallest_of_maximum(&x, &y), Ok(0.));
    assert_eq!(largest_of_maximum(&x, &y), Ok(2.));
    assert_eq!(mean_of_maximum(&x, &y), Ok(1.));
}

#[test]
fn test_malformed_curves() {
    let empty: [f64; 0] = [];

    assert_eq!(smallest_of_maximum(&empty, &empty), Err(InferenceError::EmptyCurve));
    assert_eq!(mean_of_maximum(&empty, &empty), Err(InferenceError::EmptyCurve));
    assert_eq!(
        centroid(&[0., 1.], &[1.]),
        Err(InferenceError::LengthMismatch { x: 2, y: 1 })
    );
    assert_eq!(
        weighted_sum(&[0.], &[1., 2.]),
        Err(InferenceError::LengthMismatch { x: 1, y: 2 })
    );
}

#[test]
fn test_weighted() {
    let values = [2., 10.];
    let weights = [0.75, 0.25];

    assert_eq!(weighted_sum(&values, &weights), Ok(4.));
    assert_eq!(weighted_average(&values, &[1.5, 0.5]), Ok(4.));
}
