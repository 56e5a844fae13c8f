//! Seed sweeps: run one configuration across many seeds.
//!
//! Every run is checked against the standard [`InvariantSuite`]. With
//! determinism checking enabled, each seed runs twice and the two traces
//! must match event for event.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, warn};

use crate::invariant::{InvariantResult, InvariantSuite};
use crate::scenarios::ScenarioType;
use crate::scheduler::StopReason;
use crate::{SimConfig, SimSummary, Simulation};

// ============================================================================
// Sweep Configuration
// ============================================================================

/// Configuration for a seed sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Parameters shared by every run. Its `rng_seed` is replaced per run.
    pub base: SimConfig,
    /// Starting seed.
    pub seed: u64,
    /// Number of consecutive seeds to run.
    pub iterations: u64,
    /// Run each seed twice and compare traces.
    pub check_determinism: bool,
}

impl SweepConfig {
    /// Sweeps a preset scenario.
    pub fn for_scenario(scenario: ScenarioType, seed: u64, iterations: u64) -> Self {
        Self {
            base: scenario.config(seed),
            seed,
            iterations,
            check_determinism: false,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base: SimConfig::default(),
            seed: 0,
            iterations: 100,
            check_determinism: false,
        }
    }
}

// ============================================================================
// Sweep Results
// ============================================================================

/// Result of a single seed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// The run completed and every invariant held.
    Completed {
        seed: u64,
        stop_reason: StopReason,
        final_time_ns: u64,
        rupture_time_ns: Option<u64>,
        alarm_count: usize,
    },
    /// An invariant was violated.
    InvariantViolation {
        seed: u64,
        invariant: String,
        message: String,
    },
    /// Two runs of the same seed diverged.
    Nondeterministic { seed: u64, differences: Vec<String> },
    /// The run aborted with a fatal error.
    Error { seed: u64, message: String },
}

impl SweepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, SweepOutcome::Completed { .. })
    }

    pub fn seed(&self) -> u64 {
        match self {
            SweepOutcome::Completed { seed, .. }
            | SweepOutcome::InvariantViolation { seed, .. }
            | SweepOutcome::Nondeterministic { seed, .. }
            | SweepOutcome::Error { seed, .. } => *seed,
        }
    }

    pub fn ruptured(&self) -> bool {
        matches!(
            self,
            SweepOutcome::Completed {
                rupture_time_ns: Some(_),
                ..
            }
        )
    }

    pub fn alarmed(&self) -> bool {
        matches!(self, SweepOutcome::Completed { alarm_count, .. } if *alarm_count > 0)
    }
}

/// Aggregate results of a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResults {
    /// All individual outcomes, in seed order.
    pub outcomes: Vec<SweepOutcome>,
    /// Completed runs that ruptured.
    pub ruptures: u64,
    /// Completed runs that raised at least one alarm.
    pub alarms: u64,
    /// Seeds that did not complete cleanly, for reproduction.
    pub failed_seeds: Vec<u64>,
    /// Number of invariant violations found.
    pub violations: u64,
    /// Total elapsed wall time (seconds).
    pub elapsed_secs: f64,
}

impl SweepResults {
    /// Returns true if every seed completed with all invariants holding.
    pub fn all_passed(&self) -> bool {
        self.failed_seeds.is_empty()
    }

    /// Fraction of runs that ruptured (0.0 to 1.0).
    pub fn rupture_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.ruptures as f64 / self.outcomes.len() as f64
        }
    }

    /// Simulations per second.
    pub fn rate(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.outcomes.len() as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

// ============================================================================
// Sweep Runner
// ============================================================================

/// Runs sweeps.
pub struct SweepRunner {
    config: SweepConfig,
    suite: InvariantSuite,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            suite: InvariantSuite::standard(),
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs a single seed.
    pub fn run_single(&self, seed: u64) -> SweepOutcome {
        let config = self.config.base.clone().with_seed(seed);

        let first = match execute(&config) {
            Ok(run) => run,
            Err(message) => return SweepOutcome::Error { seed, message },
        };

        let (resolved, summary) = &first;
        let ctx = summary.run_context(resolved);
        if let Some(InvariantResult::Violated {
            invariant, message, ..
        }) = self.suite.check_all(&summary.trace, &ctx).into_iter().next()
        {
            warn!(seed, %invariant, %message, "invariant violated");
            return SweepOutcome::InvariantViolation {
                seed,
                invariant,
                message,
            };
        }

        if self.config.check_determinism {
            let second = match execute(&config) {
                Ok((_, summary)) => summary,
                Err(message) => return SweepOutcome::Error { seed, message },
            };
            let differences = compare(summary, &second);
            if !differences.is_empty() {
                warn!(seed, ?differences, "nondeterministic run");
                return SweepOutcome::Nondeterministic { seed, differences };
            }
        }

        SweepOutcome::Completed {
            seed,
            stop_reason: summary.stop_reason,
            final_time_ns: summary.final_time_ns,
            rupture_time_ns: summary.rupture_time_ns,
            alarm_count: summary.alarm_count,
        }
    }

    /// Runs every seed in `seed..seed + iterations`.
    pub fn run(&self) -> SweepResults {
        self.run_with_progress(|_, _| {})
    }

    /// Runs the sweep, calling `progress(done, outcome)` after each seed.
    pub fn run_with_progress(
        &self,
        mut progress: impl FnMut(u64, &SweepOutcome),
    ) -> SweepResults {
        let start = Instant::now();
        let mut outcomes = Vec::new();
        let mut ruptures = 0;
        let mut alarms = 0;
        let mut violations = 0;
        let mut failed_seeds = Vec::new();

        for i in 0..self.config.iterations {
            let seed = self.config.seed.wrapping_add(i);
            let outcome = self.run_single(seed);
            debug!(seed, ok = outcome.is_ok(), "sweep iteration finished");

            if outcome.ruptured() {
                ruptures += 1;
            }
            if outcome.alarmed() {
                alarms += 1;
            }
            if matches!(outcome, SweepOutcome::InvariantViolation { .. }) {
                violations += 1;
            }
            if !outcome.is_ok() {
                failed_seeds.push(seed);
            }

            progress(i + 1, &outcome);
            outcomes.push(outcome);
        }

        SweepResults {
            outcomes,
            ruptures,
            alarms,
            failed_seeds,
            violations,
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }
}

fn execute(config: &SimConfig) -> Result<(crate::ResolvedConfig, SimSummary), String> {
    let simulation = Simulation::new(config.clone()).map_err(|e| e.to_string())?;
    let resolved = simulation.resolved().clone();
    let summary = simulation.run().map_err(|e| e.to_string())?;
    Ok((resolved, summary))
}

/// Lists every observable difference between two runs of the same seed.
fn compare(first: &SimSummary, second: &SimSummary) -> Vec<String> {
    let mut differences = Vec::new();

    if first.stop_reason != second.stop_reason {
        differences.push(format!(
            "stop_reason: {:?} != {:?}",
            first.stop_reason, second.stop_reason
        ));
    }
    if first.final_time_ns != second.final_time_ns {
        differences.push(format!(
            "final_time_ns: {} != {}",
            first.final_time_ns, second.final_time_ns
        ));
    }
    if first.resumptions != second.resumptions {
        differences.push(format!(
            "resumptions: {} != {}",
            first.resumptions.len(),
            second.resumptions.len()
        ));
    }
    if first.trace != second.trace {
        let diverged_at = first
            .trace
            .events()
            .iter()
            .zip(second.trace.events())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| first.trace.len().min(second.trace.len()));
        differences.push(format!("trace diverges at event {diverged_at}"));
    }

    differences
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_of_full_attack_always_ruptures() {
        let mut config = SweepConfig::for_scenario(ScenarioType::SpoofAndActuate, 100, 20);
        config.check_determinism = true;
        let results = SweepRunner::new(config).run();

        assert!(results.all_passed(), "failed: {:?}", results.failed_seeds);
        assert_eq!(results.outcomes.len(), 20);
        assert_eq!(results.ruptures, 20);
        assert_eq!(results.alarms, 0);
        assert_eq!(results.violations, 0);
        assert_eq!(results.rupture_rate(), 1.0);
    }

    #[test]
    fn sweep_of_actuate_only_always_alarms() {
        let config = SweepConfig::for_scenario(ScenarioType::ActuateOnly, 0, 20);
        let results = SweepRunner::new(config).run();

        assert!(results.all_passed());
        assert_eq!(results.ruptures, 0);
        assert_eq!(results.alarms, 20);
    }

    #[test]
    fn seeds_are_consecutive() {
        let config = SweepConfig::for_scenario(ScenarioType::Baseline, 40, 3);
        let seeds: Vec<u64> = SweepRunner::new(config)
            .run()
            .outcomes
            .iter()
            .map(SweepOutcome::seed)
            .collect();
        assert_eq!(seeds, vec![40, 41, 42]);
    }

    #[test]
    fn invalid_base_config_fails_every_seed() {
        let config = SweepConfig {
            base: SimConfig::default().with_tick_interval(-1.0),
            seed: 0,
            iterations: 3,
            check_determinism: false,
        };
        let results = SweepRunner::new(config).run();

        assert!(!results.all_passed());
        assert_eq!(results.failed_seeds, vec![0, 1, 2]);
        assert!(matches!(results.outcomes[0], SweepOutcome::Error { .. }));
    }

    #[test]
    fn empty_sweep_has_zero_rates() {
        let config = SweepConfig {
            iterations: 0,
            ..SweepConfig::default()
        };
        let results = SweepRunner::new(config).run();
        assert!(results.all_passed());
        assert_eq!(results.rupture_rate(), 0.0);
    }

    #[test]
    fn progress_reports_every_seed() {
        let config = SweepConfig::for_scenario(ScenarioType::Baseline, 0, 5);
        let mut seen = Vec::new();
        SweepRunner::new(config).run_with_progress(|done, _| seen.push(done));
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }
}
