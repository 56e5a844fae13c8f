//! Cooperative discrete-event scheduler.
//!
//! The scheduler owns the clock and the wake-up queue. `run` repeatedly pops
//! the earliest wake-up, advances the clock to it, resumes the process, and
//! applies the process's buffered plant writes before anything else runs.
//! Exactly one process executes at any instant; same-instant wake-ups resume
//! in registration order.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::SimError;
use crate::clock::SimClock;
use crate::config::RunLimits;
use crate::event::{EventQueue, ProcessId, WakeEvent};
use crate::plant::PlantState;
use crate::process::{Process, ProcessContext, Resume};
use crate::rng::SimRng;
use crate::trace::Trace;

/// Mutable state shared by all processes.
#[derive(Debug, Clone)]
pub struct World {
    pub plant: PlantState,
    pub rng: SimRng,
    pub trace: Trace,
}

impl World {
    pub fn new(plant: PlantState, rng: SimRng) -> Self {
        Self {
            plant,
            rng,
            trace: Trace::new(),
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The clock reached the horizon.
    Horizon,
    /// Every process terminated.
    QueueExhausted,
    /// The resumption cap was hit.
    ResumptionLimit,
    /// The configured cooldown after a rupture elapsed.
    RuptureCooldown,
}

/// One observed resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resumption {
    pub process: ProcessId,
    /// Wake time the process asked for.
    pub requested_ns: u64,
    /// Clock value when it actually ran.
    pub resumed_ns: u64,
}

struct Slot {
    process: Box<dyn Process>,
    terminated: bool,
}

/// Drives registered processes over virtual time.
#[derive(Default)]
pub struct Scheduler {
    clock: SimClock,
    queue: EventQueue,
    slots: Vec<Slot>,
    resumptions: Vec<Resumption>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a process whose first resumption is `initial_delay_ns` from now.
    ///
    /// Registration order is the tie-break order for same-instant wake-ups.
    pub fn register(&mut self, process: Box<dyn Process>, initial_delay_ns: u64) -> ProcessId {
        let id = ProcessId::new(self.slots.len());
        let wake_ns = self.clock.now().saturating_add(initial_delay_ns);
        debug!(process = process.name(), %id, wake_ns, "registered process");
        self.slots.push(Slot {
            process,
            terminated: false,
        });
        self.queue.schedule(wake_ns, id);
        id
    }

    /// Current simulated time.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Every resumption performed so far, in order.
    pub fn resumptions(&self) -> &[Resumption] {
        &self.resumptions
    }

    pub fn process_count(&self) -> usize {
        self.slots.len()
    }

    /// Processes that have not terminated.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.terminated).count()
    }

    pub fn is_terminated(&self, id: ProcessId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.terminated)
    }

    /// Name of a registered process.
    pub fn process_name(&self, id: ProcessId) -> Option<&'static str> {
        self.slots.get(id.index()).map(|slot| slot.process.name())
    }

    /// Runs until a stop condition in `limits` holds.
    ///
    /// When stopping at the horizon (or the rupture cooldown), the clock is
    /// advanced to that instant and wake-ups at or after it stay queued.
    ///
    /// # Errors
    ///
    /// Fatal scheduler or ownership errors abort the run immediately.
    pub fn run(&mut self, world: &mut World, limits: RunLimits) -> Result<StopReason, SimError> {
        loop {
            if self.resumptions.len() as u64 >= limits.max_resumptions {
                debug!(now_ns = self.clock.now(), "resumption limit reached");
                return Ok(StopReason::ResumptionLimit);
            }

            let Some(next) = self.queue.peek().copied() else {
                debug!(now_ns = self.clock.now(), "all processes terminated");
                return Ok(StopReason::QueueExhausted);
            };

            let (stop_ns, reason) = stop_point(&limits, &world.plant);
            if next.wake_ns >= stop_ns {
                self.clock.advance_to(stop_ns)?;
                debug!(now_ns = stop_ns, ?reason, "run stopped");
                return Ok(reason);
            }

            let wake = self.queue.pop().unwrap_or(next);
            self.step(wake, world)?;
        }
    }

    fn step(&mut self, wake: WakeEvent, world: &mut World) -> Result<(), SimError> {
        self.clock.advance_to(wake.wake_ns)?;
        let now_ns = self.clock.now();

        let slot = &mut self.slots[wake.process.index()];
        debug_assert!(!slot.terminated, "terminated process was scheduled");
        let role = slot.process.role();

        let mut ctx = ProcessContext::new(now_ns, &world.plant, &mut world.rng, &mut world.trace);
        let resume = slot.process.resume(&mut ctx);
        for write in ctx.into_writes() {
            world.plant.apply(role, write)?;
        }

        trace!(process = slot.process.name(), now_ns, ?resume, "resumed");
        self.resumptions.push(Resumption {
            process: wake.process,
            requested_ns: wake.wake_ns,
            resumed_ns: now_ns,
        });

        match resume {
            Resume::After(delay_ns) => {
                self.queue
                    .schedule(now_ns.saturating_add(delay_ns), wake.process);
            }
            Resume::Terminate => {
                debug!(process = slot.process.name(), now_ns, "process terminated");
                slot.terminated = true;
            }
        }
        Ok(())
    }
}

/// Earliest instant at which the run must stop, and why.
fn stop_point(limits: &RunLimits, plant: &PlantState) -> (u64, StopReason) {
    let cooldown_end = limits
        .rupture_cooldown_ns
        .zip(plant.rupture_time_ns())
        .map(|(cooldown, ruptured_at)| ruptured_at.saturating_add(cooldown));

    match cooldown_end {
        Some(end) if end < limits.horizon_ns => (end, StopReason::RuptureCooldown),
        _ => (limits.horizon_ns, StopReason::Horizon),
    }
}
