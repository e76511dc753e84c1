//! gridsync command line
//!
//! Runs the grid failure/repair scenario and prints the committed trace
//! together with a summary of line outages.
//!
//! ```bash
//! # Default three-component scenario, 300 time units
//! gridsync run
//!
//! # Custom topology, longer horizon, different seed, full trace
//! gridsync run --config grid.json --horizon 5000 --seed 7 --trace
//!
//! # Dump the default scenario as a starting point
//! gridsync default-config > grid.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridsync_core::{GridError, OutageCollector, ScenarioConfig, TracingListener};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Behavioral-programming grid simulator
///
/// Given the same scenario and seed, every run commits the same events at
/// the same virtual times.
#[derive(Parser, Debug)]
#[command(name = "gridsync")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario until the horizon or until nothing is left to do
    Run {
        /// Scenario JSON; the built-in scenario is used when absent
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the virtual-time horizon
        #[arg(long)]
        horizon: Option<f64>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print every committed event
        #[arg(long)]
        trace: bool,
    },
    /// Print the built-in scenario as JSON
    DefaultConfig,
}

fn load(path: Option<&PathBuf>) -> Result<ScenarioConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            ScenarioConfig::from_json(&text).with_context(|| format!("parsing {}", p.display()))
        }
        None => Ok(ScenarioConfig::default()),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |x| format!("{x:.2}"))
}

fn run(config: ScenarioConfig, trace: bool) -> Result<()> {
    info!(
        horizon = config.selection.horizon,
        seed = config.selection.seed,
        components = config.components.len(),
        lines = config.lines.len(),
        "Starting scenario"
    );

    let mut program = config.build().context("building scenario")?;
    program.add_listener(Box::new(TracingListener::new()));

    let outcome = program.run();

    if trace {
        for entry in program.history() {
            println!("{entry}");
        }
    }

    let elapsed = program.elapsed();
    let mut outages = OutageCollector::new()?;
    outages.observe_all(program.history());
    outages.finish(elapsed);
    let summary = outages.summary();

    println!("\n=== Run Complete ===");
    match &outcome {
        Ok(report) => println!("Termination: {:?}", report.termination),
        Err(e) => println!("Termination: {e}"),
    }
    println!("Elapsed:     {elapsed:.2}");
    println!("Committed:   {}", program.history().len());

    println!("\n--- Components ---");
    for (name, status) in &program.context().components {
        println!("{name:<12} {status}");
    }
    println!("\n--- Lines ---");
    for (name, status) in &program.context().lines {
        println!(
            "{name:<12} {status:<8} availability {:.4}",
            outages.availability(name, elapsed)
        );
    }

    println!("\n--- Outages ---");
    println!("Component failures: {}", summary.component_failures);
    println!("Repairs:            {}", summary.repairs);
    println!("Line failures:      {}", summary.line_failures);
    println!(
        "Duration p50/p99/max: {} / {} / {}",
        fmt_opt(summary.p50),
        fmt_opt(summary.p99),
        fmt_opt(summary.max)
    );

    for d in program.diagnostics() {
        warn!(error = %d, "diagnostic");
    }

    if let Err(GridError::DeadlockNoProgress { pending, .. }) = &outcome {
        for p in pending {
            println!("pending: {p}");
        }
    }
    outcome.map(|_| ()).map_err(Into::into)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,gridsync=info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Run { config, horizon, seed, trace } => {
            let mut config = load(config.as_ref())?;
            if let Some(h) = horizon {
                config.selection.horizon = h;
            }
            if let Some(s) = seed {
                config.selection.seed = s;
            }
            run(config, trace)
        }
        Command::DefaultConfig => {
            println!("{}", ScenarioConfig::default().to_json()?);
            Ok(())
        }
    }
}
