//! # Ancestry Solver
//!
//! Estimates the mixture of reference populations that best reconstructs a target G25 vector.
//! The weights are constrained to the probability simplex and found by projected gradient
//! descent:
//!
//! 1. Start from the uniform distribution over the `n` references.
//! 2. Form the weighted mixture and measure its distance to the target.
//! 3. Stop once that distance changes by less than the convergence threshold.
//! 4. Step against the gradient of the squared reconstruction error.
//! 5. Project the weights back onto the simplex and repeat.
//!
//! The convergence test measures the unsquared Euclidean distance
//! ([`reconstruction_distance`]) while the step follows the gradient of the squared distance
//! ([`squared_error_gradient`]). These are two different objectives and must stay two
//! separate functions; swapping either one shifts every reported result.

use crate::config::SolverConfig;
use crate::simplex::{ClipAndRenormalize, SimplexProjector};
use crate::types::{AncestryResult, G25_DIM, ReferencePopulation, has_g25_len};
use crate::vector::{self, VectorError};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::fmt;
use thiserror::Error;

/// What a failed dimension check was looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionSubject {
    Target,
    Population { index: usize, label: String },
    /// Internal vector arithmetic on the weighted mixture.
    Mixture,
}

impl fmt::Display for DimensionSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => f.write_str("target"),
            Self::Population { index, label } => write!(f, "population {index} ({label})"),
            Self::Mixture => f.write_str("weighted mixture"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("The {subject} has {found} dimensions, expected {expected}.")]
    DimensionMismatch {
        subject: DimensionSubject,
        expected: usize,
        found: usize,
    },
    #[error("No reference populations were provided.")]
    EmptyCatalog,
    #[error(
        "Solver produced non-finite values at iteration {iteration}. Check the inputs for NaN or extreme coordinates, or lower the learning rate."
    )]
    NumericDivergence { iteration: usize },
}

impl From<VectorError> for SolveError {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::DimensionMismatch { left, right } => Self::DimensionMismatch {
                subject: DimensionSubject::Mixture,
                expected: left,
                found: right,
            },
        }
    }
}

/// The result list of one solve plus how the descent ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome<'a> {
    /// One entry per input population, in input order.
    pub results: Vec<AncestryResult<'a>>,
    /// Gradient steps taken.
    pub iterations: usize,
    /// False when the loop stopped at `max_iterations`.
    pub converged: bool,
    /// Euclidean distance between the target and the final weighted mixture.
    pub distance: f64,
}

/// Projected gradient descent over the probability simplex.
///
/// The solver holds only its configuration and projector. Every solve allocates its own
/// working state, so one solver can be shared freely across samples.
#[derive(Debug, Clone, Default)]
pub struct AncestrySolver<P = ClipAndRenormalize> {
    config: SolverConfig,
    projector: P,
}

impl AncestrySolver<ClipAndRenormalize> {
    pub fn new(config: SolverConfig) -> Self {
        Self::with_projector(config, ClipAndRenormalize)
    }
}

impl<P: SimplexProjector> AncestrySolver<P> {
    pub fn with_projector(config: SolverConfig, projector: P) -> Self {
        Self { config, projector }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves for the simplex-constrained weights that best reconstruct `target`.
    ///
    /// All preconditions are checked before the first iteration; a failure performs no work.
    pub fn solve<'a>(
        &self,
        target: ArrayView1<'_, f64>,
        populations: &'a [ReferencePopulation],
    ) -> Result<SolveOutcome<'a>, SolveError> {
        validate_inputs(target, populations)?;

        let n = populations.len();
        let basis = reference_matrix(populations);
        let SolverConfig {
            max_iterations,
            learning_rate,
            convergence_threshold,
        } = self.config;

        log::debug!(
            "Solving against {n} populations (max_iterations={max_iterations}, learning_rate={learning_rate}, convergence_threshold={convergence_threshold:e})"
        );

        let mut weights = Array1::from_elem(n, 1.0 / n as f64);
        let mut previous_error = f64::INFINITY;
        let mut iterations = 0usize;
        let mut converged = false;

        for iteration in 0..max_iterations {
            let mixture = weighted_mixture(basis.view(), weights.view());
            let current_error = reconstruction_distance(target, mixture.view())?;
            if !current_error.is_finite() {
                return Err(SolveError::NumericDivergence { iteration });
            }

            if (previous_error - current_error).abs() < convergence_threshold {
                converged = true;
                break;
            }
            previous_error = current_error;

            let gradient = squared_error_gradient(basis.view(), mixture.view(), target)?;
            if gradient.iter().any(|g| !g.is_finite()) {
                return Err(SolveError::NumericDivergence { iteration });
            }

            weights.scaled_add(-learning_rate, &gradient);
            self.projector.project(&mut weights);
            if weights.iter().any(|w| !w.is_finite()) {
                return Err(SolveError::NumericDivergence { iteration });
            }
            iterations += 1;
        }

        let final_mixture = weighted_mixture(basis.view(), weights.view());
        let distance = reconstruction_distance(target, final_mixture.view())?;

        if converged {
            log::debug!("Converged after {iterations} iterations (distance {distance:.6})");
        } else {
            log::warn!(
                "Reached the iteration cap of {max_iterations} without converging (distance {distance:.6})"
            );
        }

        let results = populations
            .iter()
            .zip(weights.iter())
            .map(|(population, &proportion)| AncestryResult {
                population,
                proportion,
            })
            .collect();

        Ok(SolveOutcome {
            results,
            iterations,
            converged,
            distance,
        })
    }
}

/// Solves with the default hyperparameters and projector.
pub fn solve<'a>(
    target: ArrayView1<'_, f64>,
    populations: &'a [ReferencePopulation],
) -> Result<Vec<AncestryResult<'a>>, SolveError> {
    AncestrySolver::new(SolverConfig::default())
        .solve(target, populations)
        .map(|outcome| outcome.results)
}

/// Checks the target length, catalog non-emptiness and every population's length, in that
/// order.
pub(crate) fn validate_inputs(
    target: ArrayView1<'_, f64>,
    populations: &[ReferencePopulation],
) -> Result<(), SolveError> {
    if !has_g25_len(target) {
        return Err(SolveError::DimensionMismatch {
            subject: DimensionSubject::Target,
            expected: G25_DIM,
            found: target.len(),
        });
    }

    if populations.is_empty() {
        return Err(SolveError::EmptyCatalog);
    }

    for (index, population) in populations.iter().enumerate() {
        if !has_g25_len(population.coordinates.view()) {
            return Err(SolveError::DimensionMismatch {
                subject: DimensionSubject::Population {
                    index,
                    label: population.label.clone(),
                },
                expected: G25_DIM,
                found: population.coordinates.len(),
            });
        }
    }

    Ok(())
}

/// Stacks validated population coordinates into an `[n, G25_DIM]` matrix.
fn reference_matrix(populations: &[ReferencePopulation]) -> Array2<f64> {
    Array2::from_shape_fn((populations.len(), G25_DIM), |(i, d)| {
        populations[i].coordinates[d]
    })
}

/// Per-dimension weighted sum of the population rows.
pub fn weighted_mixture(basis: ArrayView2<'_, f64>, weights: ArrayView1<'_, f64>) -> Array1<f64> {
    basis.t().dot(&weights)
}

/// Unsquared Euclidean distance between target and mixture; the convergence criterion.
pub fn reconstruction_distance(
    target: ArrayView1<'_, f64>,
    mixture: ArrayView1<'_, f64>,
) -> Result<f64, SolveError> {
    Ok(vector::distance(target, mixture)?)
}

/// Gradient of `||mixture - target||^2` with respect to each weight:
/// `2 * sum_d (mixture_d - target_d) * basis[i, d]`.
pub fn squared_error_gradient(
    basis: ArrayView2<'_, f64>,
    mixture: ArrayView1<'_, f64>,
    target: ArrayView1<'_, f64>,
) -> Result<Array1<f64>, SolveError> {
    let residual = vector::subtract(mixture, target)?;
    Ok(basis.dot(&residual) * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    fn unit(axis: usize) -> Array1<f64> {
        let mut v = Array1::zeros(G25_DIM);
        v[axis] = 1.0;
        v
    }

    fn population(label: &str, coordinates: Array1<f64>) -> ReferencePopulation {
        ReferencePopulation::new(label, coordinates, "Test")
    }

    #[test]
    fn even_split_between_two_axes() {
        let populations = vec![population("A", unit(0)), population("B", unit(1))];
        let mut target = Array1::zeros(G25_DIM);
        target[0] = 0.5;
        target[1] = 0.5;

        let results = solve(target.view(), &populations).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label(), "A");
        assert_eq!(results[1].label(), "B");
        assert_abs_diff_eq!(results[0].proportion, 0.5, epsilon = 1e-2);
        assert_abs_diff_eq!(results[1].proportion, 0.5, epsilon = 1e-2);
    }

    #[test]
    fn recovers_single_population_target() {
        let populations = vec![
            population("A", unit(0)),
            population("B", unit(1)),
            population("C", unit(2)),
        ];
        let target = unit(1);

        let outcome = AncestrySolver::new(SolverConfig::default())
            .solve(target.view(), &populations)
            .unwrap();
        assert!(outcome.converged);
        assert_abs_diff_eq!(outcome.results[0].proportion, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(outcome.results[1].proportion, 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(outcome.results[2].proportion, 0.0, epsilon = 1e-3);
        assert!(outcome.distance < 1e-3);
    }

    #[test]
    fn rejects_short_target_before_iterating() {
        let populations = vec![population("A", unit(0))];
        let target = Array1::zeros(G25_DIM - 1);
        let err = solve(target.view(), &populations).unwrap_err();
        assert_eq!(
            err,
            SolveError::DimensionMismatch {
                subject: DimensionSubject::Target,
                expected: G25_DIM,
                found: G25_DIM - 1,
            }
        );
    }

    #[test]
    fn rejects_population_with_wrong_length_by_index_and_label() {
        let populations = vec![
            population("A", unit(0)),
            population("Broken", Array1::zeros(G25_DIM + 1)),
        ];
        let err = solve(unit(0).view(), &populations).unwrap_err();
        match &err {
            SolveError::DimensionMismatch {
                subject: DimensionSubject::Population { index, label },
                found,
                ..
            } => {
                assert_eq!(*index, 1);
                assert_eq!(label, "Broken");
                assert_eq!(*found, G25_DIM + 1);
            }
            other => panic!("Expected population DimensionMismatch, got {other:?}"),
        }
        assert!(err.to_string().contains("population 1 (Broken)"));
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = solve(unit(0).view(), &[]).unwrap_err();
        assert_eq!(err, SolveError::EmptyCatalog);
    }

    #[test]
    fn target_dimension_is_checked_before_catalog_emptiness() {
        let target = Array1::zeros(3);
        let err = solve(target.view(), &[]).unwrap_err();
        assert!(matches!(
            err,
            SolveError::DimensionMismatch {
                subject: DimensionSubject::Target,
                ..
            }
        ));
    }

    #[test]
    fn nan_target_reports_divergence() {
        let populations = vec![population("A", unit(0)), population("B", unit(1))];
        let mut target = unit(0);
        target[3] = f64::NAN;
        let err = solve(target.view(), &populations).unwrap_err();
        assert_eq!(err, SolveError::NumericDivergence { iteration: 0 });
    }

    #[test]
    fn overflowing_coordinates_report_divergence() {
        let populations = vec![
            population("Huge", unit(0) * 1e300),
            population("B", unit(1)),
        ];
        let target = unit(1) * -1e300;
        let err = solve(target.view(), &populations).unwrap_err();
        assert!(matches!(err, SolveError::NumericDivergence { .. }));
    }

    #[test]
    fn iteration_cap_is_normal_termination() {
        let populations = vec![
            population("A", unit(0)),
            population("B", unit(1)),
            population("C", unit(2)),
        ];
        let config = SolverConfig {
            max_iterations: 3,
            ..SolverConfig::default()
        };
        let outcome = AncestrySolver::new(config)
            .solve(unit(2).view(), &populations)
            .unwrap();
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 3);
        let total: f64 = outcome.results.iter().map(|r| r.proportion).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        assert!(outcome.results[2].proportion > 1.0 / 3.0);
    }

    #[test]
    fn gradient_matches_explicit_sum() {
        let basis = ndarray::array![[1.0, 2.0], [0.5, -1.0], [0.0, 3.0]];
        let mixture = ndarray::array![0.4, 0.9];
        let target = ndarray::array![0.1, 1.0];
        let gradient = squared_error_gradient(basis.view(), mixture.view(), target.view()).unwrap();
        for i in 0..basis.nrows() {
            let expected: f64 = (0..2)
                .map(|d| 2.0 * (mixture[d] - target[d]) * basis[[i, d]])
                .sum();
            assert_abs_diff_eq!(gradient[i], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn mixture_weights_each_row() {
        let basis = ndarray::array![[1.0, 0.0, 2.0], [0.0, 4.0, 2.0]];
        let weights = ndarray::array![0.25, 0.75];
        let mixture = weighted_mixture(basis.view(), weights.view());
        assert_abs_diff_eq!(mixture[0], 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(mixture[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mixture[2], 2.0, epsilon = 1e-12);
    }

    struct CountingProjector {
        calls: Cell<usize>,
    }

    impl SimplexProjector for CountingProjector {
        fn project(&self, weights: &mut Array1<f64>) {
            self.calls.set(self.calls.get() + 1);
            crate::simplex::project_to_simplex(weights);
        }
    }

    #[test]
    fn projector_runs_once_per_step() {
        let populations = vec![population("A", unit(0)), population("B", unit(1))];
        let config = SolverConfig {
            max_iterations: 7,
            ..SolverConfig::default()
        };
        let solver = AncestrySolver::with_projector(
            config,
            CountingProjector {
                calls: Cell::new(0),
            },
        );
        let outcome = solver.solve(unit(0).view(), &populations).unwrap();
        assert_eq!(outcome.iterations, 7);
        assert_eq!(solver.projector.calls.get(), 7);
    }
}
