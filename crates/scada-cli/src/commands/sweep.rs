//! Seed sweeps across a scenario.

use anyhow::{Context, Result};
use scada_sim::{SweepConfig, SweepOutcome, SweepRunner};

use crate::style::{self, colors::SemanticStyle};
use crate::{GlobalArgs, SweepArgs};

/// Runs a scenario for `iterations` seeds and reports the aggregate.
pub fn run(global: &GlobalArgs, args: &SweepArgs) -> Result<()> {
    let scada_config = super::load_config(global)?;
    let base = match args.scenario {
        Some(scenario) => scenario.apply(scada_config.simulation),
        None => scada_config.simulation,
    };
    base.validate().context("Invalid simulation configuration")?;

    let config = SweepConfig {
        base,
        seed: args.seed,
        iterations: args.iterations,
        check_determinism: args.check_determinism,
    };

    if !args.json {
        println!(
            "Running {} simulations (seed: {})...",
            args.iterations.to_string().header(),
            args.seed.to_string().code()
        );
    }

    let runner = SweepRunner::new(config);
    let results = runner.run();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to render results")?
        );
    } else {
        println!();
        if results.all_passed() {
            style::print_success(&format!(
                "All {} simulations passed",
                results.outcomes.len().to_string().success()
            ));
        } else {
            style::print_failure(&format!(
                "{} of {} simulations failed",
                results.failed_seeds.len().to_string().error(),
                results.outcomes.len()
            ));
        }

        style::print_labeled(
            "Ruptures",
            &format!(
                "{} ({:.1}%)",
                results.ruptures,
                results.rupture_rate() * 100.0
            ),
        );
        style::print_labeled("Runs with alarms", &results.alarms.to_string());
        style::print_labeled("Invariant violations", &results.violations.to_string());
        style::print_labeled(
            "Time",
            &format!(
                "{:.2}s ({:.0} sims/sec)",
                results.elapsed_secs,
                results.rate()
            ),
        );

        if !results.failed_seeds.is_empty() {
            println!();
            println!("{}", "Failed seeds (reproduce with):".warning());
            let scenario = args
                .scenario
                .map(|s| format!(" --scenario {s}"))
                .unwrap_or_default();
            for outcome in results.outcomes.iter().filter(|o| !o.is_ok()) {
                println!(
                    "  {} run{scenario} --seed {}  {}",
                    "scada-sim".code(),
                    outcome.seed(),
                    describe_failure(outcome).muted()
                );
            }
        }
    }

    if results.all_passed() {
        Ok(())
    } else {
        anyhow::bail!("{} simulation(s) failed", results.failed_seeds.len())
    }
}

fn describe_failure(outcome: &SweepOutcome) -> String {
    match outcome {
        SweepOutcome::Completed { .. } => String::new(),
        SweepOutcome::InvariantViolation {
            invariant, message, ..
        } => format!("# {invariant}: {message}"),
        SweepOutcome::Nondeterministic { differences, .. } => {
            format!("# nondeterministic: {}", differences.join(", "))
        }
        SweepOutcome::Error { message, .. } => format!("# error: {message}"),
    }
}
