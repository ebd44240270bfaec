//! Single-population distance ranking: which references sit closest to a target, without
//! mixing.

use crate::solver::{SolveError, validate_inputs};
use crate::types::ReferencePopulation;
use crate::vector;
use ndarray::ArrayView1;

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    pub population: &'a ReferencePopulation,
    pub distance: f64,
}

/// The `top_n` populations closest to `target` by Euclidean distance, nearest first.
/// Equal distances keep catalog order. Inputs are validated exactly as the solver does.
pub fn nearest_populations<'a>(
    target: ArrayView1<'_, f64>,
    populations: &'a [ReferencePopulation],
    top_n: usize,
) -> Result<Vec<Neighbor<'a>>, SolveError> {
    validate_inputs(target, populations)?;

    let mut neighbors = populations
        .iter()
        .map(|population| -> Result<Neighbor<'a>, SolveError> {
            let distance = vector::distance(target, population.coordinates.view())?;
            Ok(Neighbor {
                population,
                distance,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    neighbors.truncate(top_n);
    Ok(neighbors)
}
