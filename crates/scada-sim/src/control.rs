//! SCADA monitoring loop.
//!
//! The loop only ever sees [`PlantState::sensor_reading`]: the spoofed value
//! while the adversary is spoofing, the true pressure otherwise. Its decision
//! never looks at the true pressure directly, which is exactly the blind spot
//! the attack exploits.
//!
//! [`PlantState::sensor_reading`]: crate::plant::PlantState::sensor_reading

use tracing::warn;

use crate::plant::{PlantWrite, Role};
use crate::process::{Process, ProcessContext, Resume};
use crate::trace::{ControlStatus, EventKind};

/// Monitor with a single safety interlock: cut the pump above the threshold.
#[derive(Debug, Clone)]
pub struct ControlProcess {
    safety_threshold: f64,
    tick_ns: u64,
}

impl ControlProcess {
    pub fn new(safety_threshold: f64, tick_ns: u64) -> Self {
        debug_assert!(tick_ns > 0, "tick interval must be positive");
        Self {
            safety_threshold,
            tick_ns,
        }
    }

    /// The control decision as a pure function of the reading.
    pub fn evaluate(&self, reading: f64) -> ControlStatus {
        if reading > self.safety_threshold {
            ControlStatus::Alarm
        } else {
            ControlStatus::Ok
        }
    }
}

impl Process for ControlProcess {
    fn name(&self) -> &'static str {
        "control"
    }

    fn role(&self) -> Role {
        Role::Control
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Resume {
        if ctx.plant().ruptured() {
            return Resume::Terminate;
        }

        let reading = ctx.plant().sensor_reading();
        let spoofed = ctx.plant().sensor_spoofed();
        let status = self.evaluate(reading);

        ctx.emit(EventKind::ControlTick {
            reading,
            status,
            spoofed,
        });

        if status == ControlStatus::Alarm {
            warn!(reading, at_ns = ctx.now_ns(), "safety threshold exceeded, stopping pump");
            ctx.write(PlantWrite::SetPump(false));
            ctx.emit(EventKind::Alarm { reading });
        }

        Resume::After(self.tick_ns)
    }
}
