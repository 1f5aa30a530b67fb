//! `spkmeans` binary: runs one goal of the spectral clustering pipeline on a point file.
//!
//! ```bash
//! spkmeans 3 spk points.csv
//! spkmeans 0 lnorm points.txt --json
//! RUST_LOG=debug spkmeans 2 spk points.csv --config settings.json
//! ```
//!
//! On failure it prints `Invalid Input!` for problems with the arguments or the input file and
//! `An Error Has Occurred` for anything else, exiting with status 1 in both cases.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use log::error;

use spectral_kmeans::io::read_points;
use spectral_kmeans::{Goal, GoalOutput, Result, RunContext, SpectralConfig, SpectralError};

const INVALID_INPUT_MESSAGE: &str = "Invalid Input!";
const INTERNAL_ERROR_MESSAGE: &str = "An Error Has Occurred";

/// Arguments for the `spkmeans` binary.
#[derive(Parser, Debug)]
#[command(
    name = "spkmeans",
    version,
    about = "Normalized spectral clustering with Jacobi eigendecomposition and k-means",
    long_about = None,
)]
struct Args {
    /// Number of clusters; 0 picks it with the eigengap heuristic.
    k: usize,

    /// One of wam, ddg, lnorm, jacobi, spk.
    goal: String,

    /// Point file (.txt or .csv), one comma-separated point per line.
    input: PathBuf,

    /// JSON file overriding solver, k-means and seeding settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON instead of four-decimal text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn run(args: &Args) -> Result<()> {
    let goal: Goal = args.goal.parse()?;
    let config = match &args.config {
        Some(path) => SpectralConfig::from_json_file(path)?,
        None => SpectralConfig::default(),
    };
    let context = RunContext::new(goal, args.k, config);
    let points = read_points(&args.input)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match context.compute(&points)? {
        GoalOutput::Embedding(embedding) => {
            let clustering = context.cluster(&embedding)?;
            if args.json {
                serde_json::to_writer_pretty(&mut out, &clustering)?;
                writeln!(out)?;
            } else {
                clustering.write_to(&mut out)?;
            }
        }
        output => {
            if args.json {
                serde_json::to_writer_pretty(&mut out, &output)?;
                writeln!(out)?;
            } else {
                output.write_to(&mut out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn fail(message: &str) -> ! {
    println!("{}", message);
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            error!("Could not parse arguments: {}", e);
            fail(INVALID_INPUT_MESSAGE);
        }
    };

    if let Err(e) = run(&args) {
        error!("{}", e);
        let message = match &e {
            // Failing to write JSON to stdout is not the user's fault.
            SpectralError::Config(inner) if inner.is_io() => INTERNAL_ERROR_MESSAGE,
            e if e.kind().is_user_facing() => INVALID_INPUT_MESSAGE,
            _ => INTERNAL_ERROR_MESSAGE,
        };
        fail(message);
    }
}
