// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are used in one file.

use ndarray::{Array1, ArrayView1};

/// Number of coordinates in a G25 vector. This is a domain constant, not a tunable.
pub const G25_DIM: usize = 25;

/// Returns true when `values` has exactly [`G25_DIM`] entries.
///
/// Every boundary where coordinates enter the solver goes through this check.
#[inline]
pub fn has_g25_len(values: ArrayView1<'_, f64>) -> bool {
    values.len() == G25_DIM
}

/// A labeled reference vector for a known group, tagged with the period folder it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePopulation {
    pub label: String,
    pub coordinates: Array1<f64>,
    /// Provenance tag. Informational only; the solver never reads it.
    pub period: String,
}

impl ReferencePopulation {
    pub fn new(
        label: impl Into<String>,
        coordinates: Array1<f64>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            coordinates,
            period: period.into(),
        }
    }
}

/// The sample whose composition is being estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSample {
    pub label: String,
    pub coordinates: Array1<f64>,
}

impl TargetSample {
    pub fn new(label: impl Into<String>, coordinates: Array1<f64>) -> Self {
        Self {
            label: label.into(),
            coordinates,
        }
    }
}

/// The solved weight for one reference population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AncestryResult<'a> {
    pub population: &'a ReferencePopulation,
    /// Share of the mixture in `[0, 1]`.
    pub proportion: f64,
}

impl AncestryResult<'_> {
    #[inline]
    pub fn label(&self) -> &str {
        &self.population.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g25_length_check_accepts_only_exact_dimension() {
        assert!(has_g25_len(Array1::<f64>::zeros(G25_DIM).view()));
        assert!(!has_g25_len(Array1::<f64>::zeros(G25_DIM - 1).view()));
        assert!(!has_g25_len(Array1::<f64>::zeros(G25_DIM + 1).view()));
        assert!(!has_g25_len(Array1::<f64>::zeros(0).view()));
    }

    #[test]
    fn result_label_reads_through_to_population() {
        let population = ReferencePopulation::new("Yamnaya", Array1::zeros(G25_DIM), "Bronze");
        let result = AncestryResult {
            population: &population,
            proportion: 0.25,
        };
        assert_eq!(result.label(), "Yamnaya");
        assert_eq!(result.population.period, "Bronze");
    }
}
