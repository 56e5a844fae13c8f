//! # scada-sim: Deterministic simulation of a pipeline control loop under attack
//!
//! Three cooperative processes share one plant record:
//!
//! - **Physics** updates the true pipeline pressure every tick and ruptures
//!   the pipe once it reaches the burst limit.
//! - **Control** reads the pressure sensor and stops the pump when the
//!   reading exceeds the safety threshold.
//! - **Adversary** first spoofs the sensor with a plausible nominal value,
//!   then closes the valve.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Simulation                        │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────────┐   │
//! │  │ SimClock    │   │ EventQueue   │   │ SimRng        │   │
//! │  │ (discrete)  │   │ (wake-ups)   │   │ (seeded)      │   │
//! │  └─────────────┘   └──────────────┘   └───────────────┘   │
//! │                                                           │
//! │  Scheduler ──resume──> Physics | Control | Adversary      │
//! │      ▲                        │                           │
//! │      └──── PlantWrite effects ┘  (ownership-checked)      │
//! │                                                           │
//! │  Trace (structured events) ──> InvariantSuite             │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use scada_sim::{SimConfig, Simulation};
//!
//! let config = SimConfig::default().with_seed(12345);
//! let summary = Simulation::new(config)?.run()?;
//! println!("ruptured at {:?}", summary.rupture_time_ns);
//! ```
//!
//! ## Key Properties
//!
//! - **Reproducibility**: same seed and configuration, same event trace.
//! - **Turn-taking**: one process runs at a time; same-instant wake-ups run
//!   in registration order (physics, control, adversary).
//! - **Single writer per field**: processes emit writes, the scheduler
//!   applies them after the step and rejects writes to foreign fields.

#![cfg_attr(test, allow(clippy::float_cmp))] // Test assertions use exact float comparisons

pub mod adversary;
mod clock;
mod config;
pub mod control;
mod error;
mod event;
pub mod invariant;
pub mod physics;
pub mod plant;
mod process;
mod rng;
pub mod scenarios;
mod scheduler;
pub mod sweep;
pub mod trace;

pub use adversary::{AdversaryProcess, AdversaryState};
pub use clock::{SimClock, ns_to_sec, sec_to_ns};
pub use config::{AttackPlan, PlantParams, ResolvedConfig, RunLimits, SimConfig};
pub use control::ControlProcess;
pub use error::SimError;
pub use event::{EventQueue, ProcessId, WakeEvent};
pub use invariant::{InvariantChecker, InvariantResult, InvariantSuite, RunContext};
pub use physics::PhysicsProcess;
pub use plant::{PlantField, PlantState, PlantWrite, Role, WriteOutcome};
pub use process::{Process, ProcessContext, Resume};
pub use rng::SimRng;
pub use scenarios::{ScenarioType, UnknownScenario};
pub use scheduler::{Resumption, Scheduler, StopReason, World};
pub use sweep::{SweepConfig, SweepOutcome, SweepResults, SweepRunner};
pub use trace::{AttackStage, ControlStatus, EventKind, PhysicsMode, SimEvent, Trace};

use tracing::info;

// ============================================================================
// Simulation
// ============================================================================

/// A configured run of the fixed three-process topology.
pub struct Simulation {
    config: SimConfig,
    resolved: ResolvedConfig,
    scheduler: Scheduler,
    world: World,
}

impl Simulation {
    /// Validates `config` and registers physics, control, and (if an attack
    /// is scheduled) the adversary, in that order.
    ///
    /// # Errors
    ///
    /// [`SimError::Configuration`] for invalid parameters. Nothing runs.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let resolved = config.resolve()?;

        let mut scheduler = Scheduler::new();
        scheduler.register(
            Box::new(PhysicsProcess::new(resolved.plant, resolved.tick_ns)),
            resolved.tick_ns,
        );
        scheduler.register(
            Box::new(ControlProcess::new(
                resolved.safety_threshold,
                resolved.tick_ns,
            )),
            resolved.tick_ns,
        );
        if let Some(plan) = resolved.attack {
            scheduler.register(Box::new(AdversaryProcess::new(plan)), plan.first_wake_ns());
        }

        let world = World::new(
            PlantState::new(resolved.plant.operating_pressure),
            SimRng::new(resolved.seed),
        );

        Ok(Self {
            config,
            resolved,
            scheduler,
            world,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Validated parameters in clock units.
    pub fn resolved(&self) -> &ResolvedConfig {
        &self.resolved
    }

    pub fn plant(&self) -> &PlantState {
        &self.world.plant
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs to completion and returns the summary.
    ///
    /// # Errors
    ///
    /// Fatal scheduler errors ([`SimError::TimeTravel`],
    /// [`SimError::OwnershipViolation`]).
    pub fn run(mut self) -> Result<SimSummary, SimError> {
        info!(
            seed = self.resolved.seed,
            horizon_ns = self.resolved.limits.horizon_ns,
            burst_limit = self.resolved.plant.burst_limit,
            safety_threshold = self.resolved.safety_threshold,
            "simulation starting"
        );

        let stop_reason = self.scheduler.run(&mut self.world, self.resolved.limits)?;

        let summary = SimSummary {
            seed: self.resolved.seed,
            stop_reason,
            final_time_ns: self.scheduler.now(),
            resumptions: self.scheduler.resumptions().to_vec(),
            rupture_time_ns: self.world.plant.rupture_time_ns(),
            alarm_count: self.world.trace.alarms().count(),
            final_plant: self.world.plant,
            trace: self.world.trace,
        };

        info!(
            final_time_ns = summary.final_time_ns,
            ?stop_reason,
            ruptured = summary.rupture_time_ns.is_some(),
            alarms = summary.alarm_count,
            "simulation finished"
        );
        Ok(summary)
    }
}

/// Shorthand for `Simulation::new(config)?.run()`.
pub fn run(config: SimConfig) -> Result<SimSummary, SimError> {
    Simulation::new(config)?.run()
}

// ============================================================================
// Simulation Summary
// ============================================================================

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SimSummary {
    pub seed: u64,
    pub stop_reason: StopReason,
    /// Clock value when the run ended (nanoseconds).
    pub final_time_ns: u64,
    /// Every resumption in execution order.
    pub resumptions: Vec<Resumption>,
    pub rupture_time_ns: Option<u64>,
    pub alarm_count: usize,
    pub final_plant: PlantState,
    pub trace: Trace,
}

impl SimSummary {
    pub fn ruptured(&self) -> bool {
        self.rupture_time_ns.is_some()
    }

    /// Context needed by the invariant checkers.
    pub fn run_context<'a>(&'a self, config: &'a ResolvedConfig) -> RunContext<'a> {
        RunContext {
            config,
            resumptions: &self.resumptions,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
