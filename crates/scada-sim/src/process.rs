//! Cooperative process abstraction.
//!
//! A process is an explicit state machine. Each resumption runs one step of
//! work to completion and then either asks to be woken again after a delay
//! or terminates. There is no suspension mid-step.

use crate::plant::{PlantState, PlantWrite, Role};
use crate::rng::SimRng;
use crate::trace::{EventKind, Trace};

/// What a process wants after finishing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Wake again `delay_ns` after the current time.
    After(u64),
    /// Remove the process from the schedule permanently.
    Terminate,
}

/// A schedulable unit of simulation logic.
pub trait Process {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Role that decides which plant fields this process may write.
    fn role(&self) -> Role;

    /// Runs one step at `ctx.now_ns()`.
    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Resume;
}

/// Everything a process can see and do during one step.
///
/// Plant writes are buffered and applied by the scheduler after the step
/// returns, so the plant a process reads is the state left by the previous
/// step, never a half-applied one.
pub struct ProcessContext<'a> {
    now_ns: u64,
    plant: &'a PlantState,
    rng: &'a mut SimRng,
    trace: &'a mut Trace,
    writes: Vec<PlantWrite>,
}

impl<'a> ProcessContext<'a> {
    pub(crate) fn new(
        now_ns: u64,
        plant: &'a PlantState,
        rng: &'a mut SimRng,
        trace: &'a mut Trace,
    ) -> Self {
        Self {
            now_ns,
            plant,
            rng,
            trace,
            writes: Vec::new(),
        }
    }

    /// Current simulated time (nanoseconds).
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Read-only view of the plant.
    pub fn plant(&self) -> &PlantState {
        self.plant
    }

    /// Shared seeded generator.
    pub fn rng(&mut self) -> &mut SimRng {
        self.rng
    }

    /// Queues a plant write.
    pub fn write(&mut self, write: PlantWrite) {
        self.writes.push(write);
    }

    /// Records an observability event at the current time.
    pub fn emit(&mut self, kind: EventKind) {
        self.trace.record(self.now_ns, kind);
    }

    pub(crate) fn into_writes(self) -> Vec<PlantWrite> {
        self.writes
    }
}
