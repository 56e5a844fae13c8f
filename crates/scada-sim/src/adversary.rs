//! Attacker kill chain.
//!
//! A linear, open-loop state machine driven only by elapsed time. The
//! attacker never observes the plant's response.
//!
//! ```text
//! Dormant --attack_time--> Spoofing --pivot_delay--> Actuating --> Done
//!           spoof sensor               close valve
//! ```
//!
//! Blinding the monitor strictly precedes touching the actuator, by exactly
//! `pivot_delay`. An actuate-only plan first wakes at
//! `attack_time + pivot_delay` and goes straight from Dormant to Actuating.

use tracing::info;

use crate::config::AttackPlan;
use crate::plant::{PlantWrite, Role};
use crate::process::{Process, ProcessContext, Resume};
use crate::trace::{AttackStage, EventKind};

/// Kill-chain position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdversaryState {
    /// Waiting for the first wake-up.
    Dormant,
    /// Sensor feed falsified, pivoting to the actuator.
    Spoofing,
    /// Valve command sent; completes on the next resumption.
    Actuating,
    /// Finished.
    Done,
}

/// The attacker process. Register it with [`AttackPlan::first_wake_ns`] as
/// the initial delay.
#[derive(Debug, Clone)]
pub struct AdversaryProcess {
    plan: AttackPlan,
    state: AdversaryState,
}

impl AdversaryProcess {
    pub fn new(plan: AttackPlan) -> Self {
        Self {
            plan,
            state: AdversaryState::Dormant,
        }
    }

    pub fn state(&self) -> AdversaryState {
        self.state
    }

    pub fn plan(&self) -> &AttackPlan {
        &self.plan
    }

    fn actuate(&mut self, ctx: &mut ProcessContext<'_>) -> Resume {
        info!(at_ns = ctx.now_ns(), "sending valve close command");
        ctx.write(PlantWrite::SetValve(false));
        ctx.emit(EventKind::AttackStage {
            stage: AttackStage::Actuating,
        });
        self.state = AdversaryState::Actuating;
        // Same instant: Done is recorded right after the valve closes.
        Resume::After(0)
    }
}

impl Process for AdversaryProcess {
    fn name(&self) -> &'static str {
        "adversary"
    }

    fn role(&self) -> Role {
        Role::Adversary
    }

    fn resume(&mut self, ctx: &mut ProcessContext<'_>) -> Resume {
        match self.state {
            AdversaryState::Dormant if self.plan.spoof_sensor => {
                info!(
                    at_ns = ctx.now_ns(),
                    value = self.plan.spoofed_value,
                    "attack started: injecting false sensor data"
                );
                ctx.write(PlantWrite::SpoofSensor {
                    value: self.plan.spoofed_value,
                });
                ctx.emit(EventKind::AttackStage {
                    stage: AttackStage::Spoofing,
                });
                self.state = AdversaryState::Spoofing;
                Resume::After(self.plan.pivot_ns)
            }
            AdversaryState::Dormant => {
                info!(at_ns = ctx.now_ns(), "attack started without sensor spoofing");
                self.actuate(ctx)
            }
            AdversaryState::Spoofing => self.actuate(ctx),
            AdversaryState::Actuating => {
                info!(at_ns = ctx.now_ns(), "attack execution complete");
                ctx.emit(EventKind::AttackStage {
                    stage: AttackStage::Done,
                });
                self.state = AdversaryState::Done;
                Resume::Terminate
            }
            AdversaryState::Done => Resume::Terminate,
        }
    }
}
