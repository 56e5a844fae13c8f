//! Physical plant model.
//!
//! Each tick derives the regime from the pump and valve positions and
//! updates pressure:
//!
//! ```text
//! ruptured            -> no change (terminal)
//! pump on, valve shut -> pressure += buildup_rate + noise(buildup_noise)
//! pump off            -> pressure  = max(0, pressure - vent_rate)
//! otherwise           -> pressure  = operating_pressure + noise(nominal_noise)
//! ```
//!
//! Reaching `burst_limit` ruptures the pipe. That is the only way into the
//! ruptured state and there is no way out.

use tracing::warn;

use crate::config::PlantParams;
use crate::plant::{PlantState, PlantWrite, Role};
use crate::process::{Process, ProcessContext, Resume};
use crate::trace::{EventKind, PhysicsMode};

/// Derives the physics regime from the plant.
pub fn physics_mode(plant: &PlantState) -> PhysicsMode {
    if plant.ruptured() {
        PhysicsMode::Ruptured
    } else if !plant.pump_on() {
        PhysicsMode::Venting
    } else if !plant.valve_open() {
        PhysicsMode::Building
    } else {
        PhysicsMode::Nominal
    }
}

/// Pressure model process.
///
/// Keeps ticking after a rupture so the trace shows the frozen pressure all
/// the way to the horizon.
#[derive(Debug, Clone)]
pub struct PhysicsProcess {
    params: PlantParams,
    tick_ns: u64,
}

impl PhysicsProcess {
    pub fn new(params: PlantParams, tick_ns: u64) -> Self {
        debug_assert!(tick_ns > 0, "tick interval must be positive");
        Self { params, tick_ns }
    }
}

impl Process for PhysicsProcess {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn role(&self) -> Role {
        Role::Physics
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Resume {
        let mode = physics_mode(ctx.plant());
        let current = ctx.plant().pressure();

        let pressure = match mode {
            PhysicsMode::Ruptured => {
                ctx.emit(EventKind::PhysicsTick {
                    pressure: current,
                    mode,
                });
                return Resume::After(self.tick_ns);
            }
            PhysicsMode::Building => {
                current + self.params.buildup_rate + ctx.rng().symmetric(self.params.buildup_noise)
            }
            PhysicsMode::Venting => (current - self.params.vent_rate).max(0.0),
            PhysicsMode::Nominal => {
                self.params.operating_pressure + ctx.rng().symmetric(self.params.nominal_noise)
            }
        };
        let pressure = pressure.max(0.0);

        ctx.write(PlantWrite::SetPressure(pressure));
        ctx.emit(EventKind::PhysicsTick { pressure, mode });

        if pressure >= self.params.burst_limit {
            let at_ns = ctx.now_ns();
            warn!(pressure, at_ns, "pipeline ruptured");
            ctx.write(PlantWrite::Rupture { at_ns });
            ctx.emit(EventKind::Rupture { pressure });
        }

        Resume::After(self.tick_ns)
    }
}
