//! # Simplex Projection
//!
//! Maps an arbitrary weight vector back onto the probability simplex (non-negative entries
//! summing to one) after each unconstrained gradient step.
//!
//! The provided projector is a clip-and-renormalize heuristic. It is NOT the exact Euclidean
//! projection onto the simplex, which needs an O(n log n) sort-and-threshold pass. The
//! heuristic is O(n) and always lands on the simplex, but it carries no convergence-rate
//! guarantee for the surrounding gradient descent. Solvers take the projector through
//! [`SimplexProjector`].

use ndarray::Array1;

/// Clipped sums below this are treated as degenerate and replaced by the uniform distribution.
pub const DEGENERATE_SUM_THRESHOLD: f64 = 1e-10;

/// Projects a weight vector onto the probability simplex in place.
pub trait SimplexProjector {
    fn project(&self, weights: &mut Array1<f64>);
}

/// Clip negatives to zero, then divide by the sum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClipAndRenormalize;

impl SimplexProjector for ClipAndRenormalize {
    #[inline]
    fn project(&self, weights: &mut Array1<f64>) {
        project_to_simplex(weights);
    }
}

/// Clip-and-renormalize projection.
///
/// 1. Negative entries are clipped to zero.
/// 2. If the clipped sum is below [`DEGENERATE_SUM_THRESHOLD`], every entry becomes `1/n`.
/// 3. Otherwise every entry is divided by the clipped sum.
///
/// An empty vector is left as is.
pub fn project_to_simplex(weights: &mut Array1<f64>) {
    let n = weights.len();
    if n == 0 {
        return;
    }

    weights.mapv_inplace(|w| if w < 0.0 { 0.0 } else { w });
    let total = weights.sum();

    if total < DEGENERATE_SUM_THRESHOLD {
        weights.fill(1.0 / n as f64);
        return;
    }

    weights.mapv_inplace(|w| w / total);
}
