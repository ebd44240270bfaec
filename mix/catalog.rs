//! # Reference Catalog and G25 File Loading
//!
//! This module is the only place raw coordinate text enters the application. It reads
//! newline-delimited G25 files, validates every line against the fixed format, and builds
//! the ordered catalog of reference populations the solver consumes.
//!
//! File format, one population per line:
//!
//! ```text
//! # comment
//! Label,c1,c2,...,c25
//! ```
//!
//! Lines are trimmed; blank lines and `#` comments are skipped but still counted, so error
//! line numbers match what an editor shows. A reference directory holds one subdirectory per
//! period, each containing `.txt` files. Directories and files are visited in natural sort
//! order, which makes the flattened catalog order (and therefore every solve) reproducible.

use crate::types::{G25_DIM, ReferencePopulation, TargetSample};
use natord::compare;
use ndarray::Array1;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Period assigned to files that do not sit inside a period folder.
pub const UNKNOWN_PERIOD: &str = "unknown";

/// Extension of reference files inside a period directory.
const REFERENCE_EXTENSION: &str = "txt";

/// A malformed line or file content. Line numbers are 1-based.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: invalid format, expected 'Label,coord1,coord2,...'")]
    MissingCoordinates { line: usize },
    #[error("line {line}: the population label is empty")]
    EmptyLabel { line: usize },
    #[error("line {line}: expected exactly {expected} coordinates, got {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, coordinate {field}: invalid float value '{value}'")]
    InvalidCoordinate {
        line: usize,
        field: usize,
        value: String,
        source: ParseFloatError,
    },
    #[error("error reading line {line}: {source}")]
    Read { line: usize, source: io::Error },
    #[error("no valid populations found in file")]
    NoPopulations,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to parse '{}': {source}", .path.display())]
    Parse { path: PathBuf, source: ParseError },
    #[error("Unknown period '{0}'. Run the catalog command to list the available periods.")]
    UnknownPeriod(String),
}

/// Parses G25 lines from any buffered reader, tagging every population with `period`.
pub fn parse_g25_reader<R: BufRead>(
    reader: R,
    period: &str,
) -> Result<Vec<ReferencePopulation>, ParseError> {
    let mut populations = Vec::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line_number = index + 1;
        let raw = line_result.map_err(|source| ParseError::Read {
            line: line_number,
            source,
        })?;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (label, coordinate_part) = line
            .split_once(',')
            .ok_or(ParseError::MissingCoordinates { line: line_number })?;
        if label.trim().is_empty() {
            return Err(ParseError::EmptyLabel { line: line_number });
        }

        let fields: Vec<&str> = coordinate_part.split(',').collect();
        if fields.len() != G25_DIM {
            return Err(ParseError::FieldCount {
                line: line_number,
                expected: G25_DIM,
                found: fields.len(),
            });
        }

        let mut coordinates = Array1::zeros(G25_DIM);
        for (slot, (field_index, field)) in coordinates.iter_mut().zip(fields.iter().enumerate()) {
            *slot = field
                .trim()
                .parse::<f64>()
                .map_err(|source| ParseError::InvalidCoordinate {
                    line: line_number,
                    field: field_index + 1,
                    value: (*field).to_string(),
                    source,
                })?;
        }

        populations.push(ReferencePopulation::new(label, coordinates, period));
    }

    if populations.is_empty() {
        return Err(ParseError::NoPopulations);
    }
    Ok(populations)
}

/// Parses one G25 file. Errors carry the file path.
pub fn parse_g25_file(path: &Path, period: &str) -> Result<Vec<ReferencePopulation>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_g25_reader(BufReader::new(file), period).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The period of a standalone file: its parent directory's name, or [`UNKNOWN_PERIOD`] when
/// the parent is the base `data` directory, `.`, or missing.
pub fn period_for_path(path: &Path) -> String {
    match path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy())
    {
        Some(name) if name != "data" && name != "." => name.into_owned(),
        _ => UNKNOWN_PERIOD.to_string(),
    }
}

/// Loads target samples from a G25 file, in file order.
pub fn load_target_samples(path: &Path) -> Result<Vec<TargetSample>, CatalogError> {
    let populations = parse_g25_file(path, &period_for_path(path))?;
    Ok(populations
        .into_iter()
        .map(|population| TargetSample::new(population.label, population.coordinates))
        .collect())
}

/// All populations loaded from one period folder.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodGroup {
    pub name: String,
    pub populations: Vec<ReferencePopulation>,
}

/// Reference populations grouped by period, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCatalog {
    periods: Vec<PeriodGroup>,
}

impl ReferenceCatalog {
    pub fn from_periods(periods: Vec<PeriodGroup>) -> Self {
        Self { periods }
    }

    /// Walks `dir`: each subdirectory is a period, each `.txt` file inside it a reference file.
    /// Other entries are ignored. Periods without reference files are left out.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let mut periods = Vec::new();

        for period_dir in sorted_entries(dir, |path| path.is_dir())? {
            let name = period_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| UNKNOWN_PERIOD.to_string());

            let files = sorted_entries(&period_dir, |path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == REFERENCE_EXTENSION)
            })?;

            let mut populations = Vec::new();
            for file in files {
                let parsed = parse_g25_file(&file, &name)?;
                log::debug!(
                    "Loaded {} populations from {}",
                    parsed.len(),
                    file.display()
                );
                populations.extend(parsed);
            }

            if populations.is_empty() {
                continue;
            }
            log::debug!("Period '{}': {} populations", name, populations.len());
            periods.push(PeriodGroup { name, populations });
        }

        let catalog = Self { periods };
        log::info!(
            "Loaded {} reference populations across {} periods from {}",
            catalog.len(),
            catalog.periods.len(),
            dir.display()
        );
        Ok(catalog)
    }

    pub fn periods(&self) -> &[PeriodGroup] {
        &self.periods
    }

    /// Total number of populations across all periods.
    pub fn len(&self) -> usize {
        self.periods.iter().map(|group| group.populations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps only the named periods, preserving catalog order. An empty selection keeps
    /// everything.
    pub fn select_periods(self, names: &[String]) -> Result<Self, CatalogError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(missing) = names
            .iter()
            .find(|name| !self.periods.iter().any(|group| &group.name == *name))
        {
            return Err(CatalogError::UnknownPeriod(missing.clone()));
        }

        let periods = self
            .periods
            .into_iter()
            .filter(|group| names.contains(&group.name))
            .collect();
        Ok(Self { periods })
    }

    /// Flattens the catalog into the ordered list the solver takes.
    pub fn into_populations(self) -> Vec<ReferencePopulation> {
        self.periods
            .into_iter()
            .flat_map(|group| group.populations)
            .collect()
    }
}

/// Entries of `dir` accepted by `keep`, in natural order of their file names.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>, CatalogError> {
    let io_error = |source: io::Error| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| compare(&file_name_of(a), &file_name_of(b)));
    Ok(paths)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
