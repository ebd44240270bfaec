//! # Vector Algebra
//!
//! Elementary operations over real vectors. Every function is pure: arguments are borrowed
//! views and results are freshly allocated.
//!
//! Length mismatches are programming errors. Callers validate dimensions before reaching this
//! layer (the solver does so in its precondition checks), so a `DimensionMismatch` surfacing
//! from here indicates a missing check upstream.

use ndarray::{Array1, ArrayView1};
use thiserror::Error;

/// Norms below this are treated as zero by [`normalize`].
pub const NORM_EPSILON: f64 = 1e-10;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    #[error("Vector dimension mismatch: {left} vs {right}.")]
    DimensionMismatch { left: usize, right: usize },
}

#[inline]
fn check_lengths(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<(), VectorError> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    Ok(())
}

/// Euclidean (L2) distance between `a` and `b`.
pub fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<f64, VectorError> {
    check_lengths(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f64>()
        .sqrt())
}

/// Elementwise `a + b`.
pub fn sum(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<Array1<f64>, VectorError> {
    check_lengths(a, b)?;
    Ok(&a + &b)
}

/// Elementwise `a - b`.
pub fn subtract(
    a: ArrayView1<'_, f64>,
    b: ArrayView1<'_, f64>,
) -> Result<Array1<f64>, VectorError> {
    check_lengths(a, b)?;
    Ok(&a - &b)
}

pub fn scale(v: ArrayView1<'_, f64>, scalar: f64) -> Array1<f64> {
    v.mapv(|x| x * scalar)
}

pub fn dot(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Result<f64, VectorError> {
    check_lengths(a, b)?;
    Ok(a.dot(&b))
}

/// L2 norm.
pub fn norm(v: ArrayView1<'_, f64>) -> f64 {
    v.dot(&v).sqrt()
}

/// Unit vector in the direction of `v`. A vector whose norm is below [`NORM_EPSILON`] maps to
/// the zero vector of the same length instead of being divided by a near-zero norm.
pub fn normalize(v: ArrayView1<'_, f64>) -> Array1<f64> {
    let length = norm(v);
    if length < NORM_EPSILON {
        return scale(v, 0.0);
    }
    scale(v, 1.0 / length)
}

/// Elementwise mean across a collection of equal-length vectors.
///
/// Returns `Ok(None)` for an empty collection; callers decide what an absent mean means.
pub fn mean<'a, I>(vectors: I) -> Result<Option<Array1<f64>>, VectorError>
where
    I: IntoIterator<Item = ArrayView1<'a, f64>>,
{
    let mut iter = vectors.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };

    let mut total = first.to_owned();
    let mut count = 1usize;
    for v in iter {
        check_lengths(total.view(), v)?;
        total += &v;
        count += 1;
    }
    total.mapv_inplace(|x| x / count as f64);
    Ok(Some(total))
}
