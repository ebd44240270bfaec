#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

pub mod catalog;
pub mod config;
pub mod nearest;
pub mod ranking;
pub mod report;
pub mod simplex;
pub mod solver;
pub mod types;
pub mod vector;

pub use catalog::{CatalogError, ParseError, ReferenceCatalog, load_target_samples};
pub use config::{ConfigError, SolverConfig};
pub use solver::{AncestrySolver, SolveError, SolveOutcome, solve};
pub use types::{AncestryResult, G25_DIM, ReferencePopulation, TargetSample};
