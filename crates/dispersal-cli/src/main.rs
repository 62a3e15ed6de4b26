//! Command line driver for the habitat dispersal simulation.

mod run;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use run::{Mode, RunRequest};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "dispersal", version, about = "Simulate population dispersal across a habitat grid")]
struct Cli {
    /// Which map to produce
    #[arg(value_enum, default_value = "variation")]
    mode: Mode,

    /// JSON simulation config; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON vegetation raster
    #[arg(long, requires = "elevation")]
    vegetation: Option<PathBuf>,

    /// JSON elevation raster
    #[arg(long, requires = "vegetation")]
    elevation: Option<PathBuf>,

    /// Number of steps to simulate
    #[arg(short, long, default_value = "1000")]
    steps: u64,

    /// Override the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent worlds (defaults: density 3, variation 1)
    #[arg(short, long)]
    members: Option<usize>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.verbose, cli.json_logs)?;

    info!("Starting dispersal simulation in {:?} mode", cli.mode);

    let mut config = run::load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let vegetation = cli.vegetation.as_deref().map(run::load_raster).transpose()?;
    let elevation = cli.elevation.as_deref().map(run::load_raster).transpose()?;

    let request = RunRequest {
        mode: cli.mode,
        steps: cli.steps,
        members: cli.members.unwrap_or_else(|| cli.mode.default_members()),
        config,
        vegetation,
        elevation,
    };

    let report = run::execute(request)?;
    let json = serde_json::to_string_pretty(&report)?;

    match cli.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing report {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
