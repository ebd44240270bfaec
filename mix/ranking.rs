use crate::types::AncestryResult;

/// Orders results by descending proportion. Pure reordering: nothing is dropped or rescaled.
/// Ties may come out in either order.
pub fn rank(mut results: Vec<AncestryResult<'_>>) -> Vec<AncestryResult<'_>> {
    results.sort_unstable_by(|a, b| b.proportion.total_cmp(&a.proportion));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{G25_DIM, ReferencePopulation};
    use ndarray::Array1;

    #[test]
    fn sorts_descending_without_dropping_entries() {
        let populations: Vec<ReferencePopulation> = ["A", "B", "C", "D"]
            .iter()
            .map(|label| ReferencePopulation::new(*label, Array1::zeros(G25_DIM), "P"))
            .collect();
        let proportions = [0.1, 0.6, 0.0005, 0.2995];
        let results: Vec<AncestryResult> = populations
            .iter()
            .zip(proportions)
            .map(|(population, proportion)| AncestryResult {
                population,
                proportion,
            })
            .collect();

        let ranked = rank(results);
        let labels: Vec<&str> = ranked.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["B", "D", "A", "C"]);

        let total: f64 = ranked.iter().map(|r| r.proportion).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(rank(Vec::new()).is_empty());
    }
}
