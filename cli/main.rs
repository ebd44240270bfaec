#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use env_logger::Env;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use g25mix::nearest::{DEFAULT_TOP_N, nearest_populations};
use g25mix::report::{write_neighbors, write_table, write_tsv, write_tsv_header};
use g25mix::{AncestrySolver, ReferenceCatalog, SolverConfig, TargetSample, load_target_samples};

const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Args)]
pub struct CatalogArgs {
    /// Directory holding one subdirectory of reference .txt files per period
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data: PathBuf,

    /// Restrict the reference set to these periods (repeatable; default: all)
    #[arg(long, value_name = "NAME")]
    pub period: Vec<String>,
}

#[derive(Args)]
pub struct SolveArgs {
    /// Path to the target G25 file; prompted for on stdin when omitted
    #[arg(value_name = "TARGET")]
    pub target: Option<PathBuf>,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// TOML file with solver hyperparameters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of gradient steps (overrides --config)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Gradient step size (overrides --config)
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Stop once the fit distance changes by less than this (overrides --config)
    #[arg(long)]
    pub convergence_threshold: Option<f64>,

    /// Also write every solved proportion to this TSV file
    #[arg(long, value_name = "FILE")]
    pub tsv: Option<PathBuf>,
}

#[derive(Args)]
pub struct NearestArgs {
    /// Path to the target G25 file
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Number of closest populations to list per sample
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_N)]
    pub top: usize,
}

#[derive(Parser)]
#[command(
    name = "g25mix",
    about = "Ancestry proportion estimation from G25 coordinates",
    long_about = "Estimates the mixture of reference populations that best reconstructs each \
                 target G25 vector, using projected gradient descent on the probability simplex."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate ancestry proportions for every sample in a target file
    #[command(about = "Estimate ancestry proportions")]
    Solve(SolveArgs),

    /// List the reference populations closest to each sample
    #[command(about = "Rank single reference populations by distance")]
    Nearest(NearestArgs),

    /// Summarize the reference data directory
    #[command(about = "List reference populations per period")]
    Catalog {
        /// Directory holding one subdirectory of reference .txt files per period
        #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
        data: PathBuf,
    },

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let Cli { command } = Cli::parse();

    let result = match command {
        Some(Commands::Solve(args)) => run_solve(args),
        Some(Commands::Nearest(args)) => run_nearest(args),
        Some(Commands::Catalog { data }) => run_catalog(&data),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => print_help(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_help() -> Result<(), Box<dyn std::error::Error>> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

fn run_solve(args: SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;
    let catalog = load_catalog(&args.catalog)?;
    print_catalog_summary(&catalog);

    let target_path = match args.target {
        Some(path) => path,
        None => prompt_for_target()?,
    };
    let samples = load_target_samples(&target_path)?;
    log::info!(
        "Loaded {} target samples from {}",
        samples.len(),
        target_path.display()
    );

    let populations = catalog.into_populations();
    let solver = AncestrySolver::new(config);

    let mut tsv = match &args.tsv {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_tsv_header(&mut writer)?;
            Some(writer)
        }
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;

    for TargetSample { label, coordinates } in &samples {
        match solver.solve(coordinates.view(), &populations) {
            Ok(outcome) => {
                writeln!(out)?;
                write_table(&mut out, label, &outcome)?;
                if let Some(writer) = tsv.as_mut() {
                    write_tsv(writer, label, &outcome.results)?;
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error solving {label}: {e}");
            }
        }
    }
    out.flush()?;

    if let Some(mut writer) = tsv {
        writer.flush()?;
        if let Some(path) = &args.tsv {
            log::info!("Wrote proportions to {}", path.display());
        }
    }
    if failures > 0 {
        log::warn!("{failures} of {} samples could not be solved", samples.len());
    }
    Ok(())
}

fn run_nearest(args: NearestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let populations = load_catalog(&args.catalog)?.into_populations();
    let samples = load_target_samples(&args.target)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for TargetSample { label, coordinates } in &samples {
        match nearest_populations(coordinates.view(), &populations, args.top) {
            Ok(neighbors) => {
                writeln!(out)?;
                write_neighbors(&mut out, label, &neighbors)?;
            }
            Err(e) => eprintln!("Error ranking {label}: {e}"),
        }
    }
    out.flush()?;
    Ok(())
}

fn run_catalog(data: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ReferenceCatalog::load(data)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for group in catalog.periods() {
        writeln!(
            out,
            "{} ({} populations)",
            group.name,
            group.populations.len()
        )?;
        for population in &group.populations {
            writeln!(out, "  {}", population.label)?;
        }
    }
    writeln!(out, "Total: {} populations", catalog.len())?;
    out.flush()?;
    Ok(())
}

/// File values first, then any flag that was given, then validation of the merged result.
fn resolve_config(args: &SolveArgs) -> Result<SolverConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(convergence_threshold) = args.convergence_threshold {
        config.convergence_threshold = convergence_threshold;
    }
    config.validate()?;
    Ok(config)
}

fn load_catalog(args: &CatalogArgs) -> Result<ReferenceCatalog, Box<dyn std::error::Error>> {
    Ok(ReferenceCatalog::load(&args.data)?.select_periods(&args.period)?)
}

fn print_catalog_summary(catalog: &ReferenceCatalog) {
    println!("Loaded reference populations:");
    for group in catalog.periods() {
        println!("  {}: {} populations", group.name, group.populations.len());
    }
    println!("Total: {} populations", catalog.len());
}

fn prompt_for_target() -> Result<PathBuf, Box<dyn std::error::Error>> {
    print!("Please enter the path to your target G25 file: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err("No target file was given.".into());
    }
    Ok(PathBuf::from(trimmed))
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const YEAR: u64 = 365 * DAY;

    if seconds < MINUTE {
        return format!("{seconds} seconds ago");
    }
    let (amount, unit) = if seconds < HOUR {
        (seconds as f64 / MINUTE as f64, "minutes")
    } else if seconds < DAY {
        (seconds as f64 / HOUR as f64, "hours")
    } else if seconds < YEAR {
        (seconds as f64 / DAY as f64, "days")
    } else {
        (seconds as f64 / YEAR as f64, "years")
    };
    format!("{amount:.1} {unit} ago")
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp: u64 = env!("G25MIX_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("g25mix {version}");

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
