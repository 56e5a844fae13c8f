//! Single simulation run with narrated output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use scada_config::OutputFormat;
use scada_sim::{
    AttackStage, ControlStatus, EventKind, InvariantResult, InvariantSuite, ResolvedConfig,
    SimConfig, SimEvent, SimSummary, Simulation, StopReason, ns_to_sec,
};
use serde::Serialize;

use crate::style::{self, colors::SemanticStyle};
use crate::{GlobalArgs, RunArgs};

/// Runs one simulation.
pub fn run(global: &GlobalArgs, args: &RunArgs) -> Result<()> {
    let scada_config = super::load_config(global)?;
    let sim_config = apply_overrides(scada_config.simulation, args);

    let format = if args.json {
        OutputFormat::Json
    } else {
        scada_config.output.format
    };
    let trace_file = args
        .trace_file
        .clone()
        .or(scada_config.output.trace_file);

    let simulation = Simulation::new(sim_config).context("Invalid simulation configuration")?;
    let resolved = simulation.resolved().clone();

    if format == OutputFormat::Text {
        print_banner(&resolved);
    }

    let summary = simulation.run().context("Simulation aborted")?;

    let suite = InvariantSuite::standard();
    let results = suite.results(&summary.trace, &summary.run_context(&resolved));

    match format {
        OutputFormat::Text => {
            narrate(&summary, &resolved, global.verbose);
            print_summary(&summary);
            print_invariants(&results);
        }
        OutputFormat::Json => print_json(&summary, &results)?,
    }

    if let Some(path) = trace_file {
        write_trace(&summary, &path)?;
        if format == OutputFormat::Text {
            style::print_labeled("Trace", &path.display().to_string().code());
        }
    }

    let violations = results.iter().filter(|(_, r)| !r.is_ok()).count();
    if violations > 0 {
        anyhow::bail!(
            "{violations} invariant(s) violated (reproduce with --seed {})",
            summary.seed
        );
    }
    Ok(())
}

/// Layers command-line flags over the merged configuration.
fn apply_overrides(mut config: SimConfig, args: &RunArgs) -> SimConfig {
    if let Some(scenario) = args.scenario {
        config = scenario.apply(config);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(horizon) = args.horizon {
        config = config.with_horizon(horizon);
    }
    if let Some(attack_time) = args.attack_time {
        config = config.with_attack_time(Some(attack_time));
    }
    if args.no_attack {
        config = config.with_attack_time(None);
    }
    if let Some(pivot_delay) = args.pivot_delay {
        config = config.with_pivot_delay(pivot_delay);
    }
    if let Some(cooldown) = args.rupture_cooldown {
        config = config.with_rupture_cooldown(Some(cooldown));
    }
    if let Some(max) = args.max_resumptions {
        config = config.with_max_resumptions(max);
    }
    if args.no_spoof {
        config = config.with_spoofing(false);
    }
    if args.noise_free {
        config = config.noise_free();
    }
    config
}

fn print_banner(config: &ResolvedConfig) {
    println!("{}", "--- OIL PIPELINE ATTACK SIMULATION ---".header());
    println!("Burst limit:   {:.0} PSI", config.plant.burst_limit);
    println!("Safety cutoff: {:.0} PSI", config.safety_threshold);
    match config.attack {
        Some(plan) => println!(
            "Attack:        t={}s ({})",
            ns_to_sec(plan.attack_ns),
            if plan.spoof_sensor {
                "spoof, then actuate"
            } else {
                "actuate only"
            }
        ),
        None => println!("Attack:        none"),
    }
    println!("Seed:          {}", config.seed.to_string().code());
    println!("{}", "--------------------------------------".header());
}

/// Prints one line per event. Physics ticks feed the reality check and are
/// only printed in verbose mode.
fn narrate(summary: &SimSummary, config: &ResolvedConfig, verbose: bool) {
    let mut true_pressure = config.plant.operating_pressure;

    for event in summary.trace.events() {
        let stamp = format!("[{:>5.1}s]", ns_to_sec(event.time_ns)).muted();
        match event.kind {
            EventKind::PhysicsTick { pressure, mode } => {
                true_pressure = pressure;
                if verbose {
                    println!(
                        "{stamp} Physics       | Pressure: {pressure:7.2} PSI | Mode: {mode:?}"
                    );
                }
            }
            EventKind::ControlTick {
                reading,
                status,
                spoofed,
            } => {
                let status = match status {
                    ControlStatus::Ok => "OK".success(),
                    ControlStatus::Alarm => "ALARM! EMERGENCY STOP!".error(),
                };
                println!("{stamp} SCADA Monitor | Reading: {reading:7.2} PSI | Status: {status}");
                if spoofed {
                    println!(
                        "          {} Actual pressure is {true_pressure:.2} PSI (invisible to SCADA)",
                        ">>> REALITY CHECK:".warning()
                    );
                }
            }
            EventKind::Alarm { reading } => {
                println!(
                    "{stamp} {} pump stopped at reading {reading:.2} PSI",
                    "[INTERLOCK]".error()
                );
            }
            EventKind::Rupture { pressure } => {
                println!();
                println!(
                    "{} at t={}s: pipeline RUPTURED! Pressure: {pressure:.2} PSI",
                    "[!!!] CRITICAL FAILURE".error(),
                    ns_to_sec(event.time_ns)
                );
                println!("      -> Oil spill initiated. Environmental damage impending.");
            }
            EventKind::AttackStage { stage } => narrate_attack(event, stage, config),
        }
    }
}

fn narrate_attack(event: &SimEvent, stage: AttackStage, config: &ResolvedConfig) {
    let tag = "[---]".warning();
    match stage {
        AttackStage::Spoofing => {
            let value = config.attack.map_or(0.0, |plan| plan.spoofed_value);
            println!();
            println!("{tag} ATTACK STARTED at t={}s", ns_to_sec(event.time_ns));
            println!("{tag} Injecting false sensor data (spoofing {value:.0} PSI)...");
        }
        AttackStage::Actuating => {
            println!("{tag} Sending valve command: CLOSE_VALVE_01...");
        }
        AttackStage::Done => {
            println!("{tag} Attack execution complete. Waiting for physics to react...");
            println!();
        }
    }
}

fn print_summary(summary: &SimSummary) {
    println!();
    println!("{}", "Summary".header());

    let outcome = match summary.rupture_time_ns {
        Some(at_ns) => format!("RUPTURED at {}s", ns_to_sec(at_ns)).error(),
        None => "no rupture".success(),
    };
    let stop = match summary.stop_reason {
        StopReason::Horizon => "horizon reached",
        StopReason::QueueExhausted => "all processes finished",
        StopReason::ResumptionLimit => "resumption limit hit",
        StopReason::RuptureCooldown => "rupture cooldown elapsed",
    };

    style::print_info_table(&[
        ("Outcome", outcome),
        ("Alarms raised", summary.alarm_count.to_string()),
        (
            "Final pressure",
            format!("{:.2} PSI", summary.final_plant.pressure()),
        ),
        ("Pump", on_off(summary.final_plant.pump_on())),
        ("Valve", open_closed(summary.final_plant.valve_open())),
        (
            "Stopped",
            format!("{stop} at {}s", ns_to_sec(summary.final_time_ns)),
        ),
        ("Resumptions", summary.resumptions.len().to_string()),
    ]);

    if summary.ruptured() && summary.alarm_count == 0 {
        style::print_warn("The control room never raised an alarm.");
    }
}

fn on_off(on: bool) -> String {
    String::from(if on { "on" } else { "off" })
}

fn open_closed(open: bool) -> String {
    String::from(if open { "open" } else { "closed" })
}

/// Prints every result, passed or failed, in suite order on stdout so
/// violations stay in line with the narration.
fn print_invariants(results: &[(&'static str, InvariantResult)]) {
    println!();
    println!("{}", "Invariants".header());
    for (name, result) in results {
        println!("{}", invariant_line(name, result));
    }
}

fn invariant_line(name: &str, result: &InvariantResult) -> String {
    match result {
        InvariantResult::Ok => format!("{} {name}", "✓".success()),
        InvariantResult::Violated {
            invariant, message, ..
        } => format!("{} {name}: {invariant}: {message}", "✗".error()),
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    seed: u64,
    stop_reason: StopReason,
    final_time_ns: u64,
    rupture_time_ns: Option<u64>,
    alarm_count: usize,
    resumptions: usize,
    final_pressure: f64,
    pump_on: bool,
    valve_open: bool,
    violations: Vec<&'a str>,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: RunReport<'a>,
}

fn print_json(summary: &SimSummary, results: &[(&'static str, InvariantResult)]) -> Result<()> {
    for event in summary.trace.events() {
        println!("{}", serde_json::to_string(event)?);
    }

    let violations = results
        .iter()
        .filter(|(_, r)| !r.is_ok())
        .map(|(name, _)| *name)
        .collect();
    let line = SummaryLine {
        summary: RunReport {
            seed: summary.seed,
            stop_reason: summary.stop_reason,
            final_time_ns: summary.final_time_ns,
            rupture_time_ns: summary.rupture_time_ns,
            alarm_count: summary.alarm_count,
            resumptions: summary.resumptions.len(),
            final_pressure: summary.final_plant.pressure(),
            pump_on: summary.final_plant.pump_on(),
            valve_open: summary.final_plant.valve_open(),
            violations,
        },
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

fn write_trace(summary: &SimSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    summary
        .trace
        .write_jsonl(BufWriter::new(file))
        .with_context(|| format!("Failed to write trace to {}", path.display()))
}
