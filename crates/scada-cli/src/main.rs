//! SCADA pipeline attack simulator.
//!
//! Replays a cyber-physical attack on an oil pipeline: the adversary spoofs
//! the pressure sensor, closes a valve, and the control room never notices.
//!
//! # Quick Start
//!
//! ```bash
//! # The full attack with default parameters
//! scada-sim run
//!
//! # Same attack without sensor spoofing: the interlock trips
//! scada-sim run --scenario actuate-only
//!
//! # Check invariants across 1000 seeds
//! scada-sim sweep --iterations 1000 --check-determinism
//! ```

#![cfg_attr(test, allow(clippy::float_cmp))] // Test assertions use exact float comparisons

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use scada_sim::ScenarioType;

/// SCADA pipeline attack simulator - deterministic replay of a spoof-and-actuate attack.
#[derive(Parser)]
#[command(name = "scada-sim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding scada.toml and scada.local.toml.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Extra TOML file merged above the project files.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Run one simulation and narrate it.
    Run(RunArgs),

    /// Run a scenario across many seeds and check invariants.
    Sweep(SweepArgs),

    /// List the built-in scenarios.
    Scenarios,

    /// Print the effective configuration.
    Config {
        /// Print as JSON instead of TOML.
        #[arg(long)]
        json: bool,
    },
}

/// Options for `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Scenario preset (baseline, spoof-and-actuate, actuate-only).
    #[arg(short, long)]
    pub scenario: Option<ScenarioType>,

    /// RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulation horizon in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub horizon: Option<f64>,

    /// Attack start time in seconds.
    #[arg(long, value_name = "SECONDS", conflicts_with = "no_attack")]
    pub attack_time: Option<f64>,

    /// Disable the adversary entirely.
    #[arg(long)]
    pub no_attack: bool,

    /// Delay between spoofing the sensor and closing the valve, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub pivot_delay: Option<f64>,

    /// Stop this many seconds after a rupture instead of at the horizon.
    #[arg(long, value_name = "SECONDS")]
    pub rupture_cooldown: Option<f64>,

    /// Cap on process resumptions.
    #[arg(long, value_name = "N")]
    pub max_resumptions: Option<u64>,

    /// Close the valve without spoofing the sensor first.
    #[arg(long)]
    pub no_spoof: bool,

    /// Zero all pressure noise.
    #[arg(long)]
    pub noise_free: bool,

    /// Emit events and the summary as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Write the event trace to this file as JSON lines.
    #[arg(long, value_name = "FILE")]
    pub trace_file: Option<PathBuf>,
}

/// Options for `sweep`.
#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Scenario preset (baseline, spoof-and-actuate, actuate-only).
    #[arg(short, long)]
    pub scenario: Option<ScenarioType>,

    /// First seed.
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Number of consecutive seeds.
    #[arg(short = 'n', long, default_value = "100")]
    pub iterations: u64,

    /// Run each seed twice and compare traces.
    #[arg(long)]
    pub check_determinism: bool,

    /// Emit results as JSON.
    #[arg(long)]
    pub json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so narration and JSON on stdout stay clean
    let level = if cli.global.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if cli.global.no_color {
        style::set_no_color(true);
    }

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Run(args) => commands::run::run(&cli.global, &args),
        Commands::Sweep(args) => commands::sweep::run(&cli.global, &args),
        Commands::Scenarios => {
            commands::scenarios::run();
            Ok(())
        }
        Commands::Config { json } => commands::config::show(&cli.global, json),
    }
}
