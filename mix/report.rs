//! Presentation of solved weights: console tables and TSV export.
//!
//! The solver's weights already sum to one. Display filtering and renormalization happen
//! only here, after the solve, and never feed back into it.

use crate::nearest::Neighbor;
use crate::ranking::rank;
use crate::solver::SolveOutcome;
use crate::types::AncestryResult;
use std::io::{self, Write};

/// Proportions at or below this are hidden from the console table.
pub const DISPLAY_THRESHOLD: f64 = 0.001;

const RULE_HEAVY: &str = "==================================================";
const RULE_LIGHT: &str = "--------------------------------------------------";

/// One row of the console table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayShare<'a> {
    pub label: &'a str,
    pub period: &'a str,
    /// Percentage of the displayed total; displayed rows sum to exactly 100.
    pub percent: f64,
}

/// Ranks results, drops entries with `proportion <= DISPLAY_THRESHOLD`, and rescales the
/// survivors to percentages summing to 100.
pub fn display_shares<'a>(results: &[AncestryResult<'a>]) -> Vec<DisplayShare<'a>> {
    let visible: Vec<AncestryResult<'a>> = rank(results.to_vec())
        .into_iter()
        .filter(|result| result.proportion > DISPLAY_THRESHOLD)
        .collect();
    let total: f64 = visible.iter().map(|result| result.proportion).sum();

    visible
        .into_iter()
        .map(|result| DisplayShare {
            label: &result.population.label,
            period: &result.population.period,
            percent: result.proportion / total * 100.0,
        })
        .collect()
}

/// Writes the result block for one sample.
pub fn write_table<W: Write>(
    writer: &mut W,
    sample_label: &str,
    outcome: &SolveOutcome<'_>,
) -> io::Result<()> {
    writeln!(writer, "{RULE_HEAVY}")?;
    writeln!(writer, "Results for: {sample_label}")?;
    writeln!(writer, "{RULE_HEAVY}")?;
    writeln!(writer, "Ancestry Proportions:")?;
    writeln!(writer, "{RULE_LIGHT}")?;
    for share in display_shares(&outcome.results) {
        writeln!(writer, "{:<30}: {:6.2}%", share.label, share.percent)?;
    }
    writeln!(writer, "{RULE_LIGHT}")?;

    let termination = if outcome.converged {
        format!("converged after {} iterations", outcome.iterations)
    } else {
        format!("stopped at the cap of {} iterations", outcome.iterations)
    };
    writeln!(writer, "Distance: {:.6} ({termination})", outcome.distance)?;
    Ok(())
}

/// Writes a nearest-population listing, numbered from 1.
pub fn write_neighbors<W: Write>(
    writer: &mut W,
    sample_label: &str,
    neighbors: &[Neighbor<'_>],
) -> io::Result<()> {
    writeln!(writer, "{RULE_HEAVY}")?;
    writeln!(writer, "Closest populations to: {sample_label}")?;
    writeln!(writer, "{RULE_HEAVY}")?;
    for (rank_index, neighbor) in neighbors.iter().enumerate() {
        writeln!(
            writer,
            "{}. {:<30} Distance: {:.6}",
            rank_index + 1,
            neighbor.population.label,
            neighbor.distance
        )?;
    }
    Ok(())
}

pub fn write_tsv_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "sample\tpopulation\tperiod\tproportion")
}

/// Writes every result for one sample, ranked but unfiltered, at full precision.
pub fn write_tsv<W: Write>(
    writer: &mut W,
    sample_label: &str,
    results: &[AncestryResult<'_>],
) -> io::Result<()> {
    let mut ryu_buffer = ryu::Buffer::new();
    for result in rank(results.to_vec()) {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            sample_label,
            result.population.label,
            result.population.period,
            ryu_buffer.format(result.proportion)
        )?;
    }
    Ok(())
}
