//! Shared plant state and the single-writer-per-field protocol.
//!
//! Processes never hold `&mut PlantState`. They read an immutable snapshot
//! and emit [`PlantWrite`] effects; the scheduler applies those effects after
//! the process yields, through [`PlantState::apply`], which enforces the
//! ownership table:
//!
//! | field                                          | writer    |
//! |------------------------------------------------|-----------|
//! | `pressure`, `ruptured`                         | Physics   |
//! | `pump_on`                                      | Control   |
//! | `valve_open`, `sensor_spoofed`, `spoofed_value`| Adversary |
//!
//! Every role may read every field.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SimError;

// ============================================================================
// Roles and Fields
// ============================================================================

/// The three process roles of the fixed topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Physical plant model.
    Physics,
    /// Monitoring and safety-shutoff loop.
    Control,
    /// Attacker.
    Adversary,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Physics => "physics",
            Role::Control => "control",
            Role::Adversary => "adversary",
        })
    }
}

/// Individually owned plant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantField {
    Pressure,
    Ruptured,
    PumpOn,
    ValveOpen,
    SensorSpoofed,
    SpoofedValue,
}

impl PlantField {
    /// Returns the only role allowed to write this field.
    pub fn owner(self) -> Role {
        match self {
            PlantField::Pressure | PlantField::Ruptured => Role::Physics,
            PlantField::PumpOn => Role::Control,
            PlantField::ValveOpen | PlantField::SensorSpoofed | PlantField::SpoofedValue => {
                Role::Adversary
            }
        }
    }
}

impl fmt::Display for PlantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlantField::Pressure => "pressure",
            PlantField::Ruptured => "ruptured",
            PlantField::PumpOn => "pump_on",
            PlantField::ValveOpen => "valve_open",
            PlantField::SensorSpoofed => "sensor_spoofed",
            PlantField::SpoofedValue => "spoofed_value",
        })
    }
}

// ============================================================================
// Writes
// ============================================================================

/// A single field update emitted by a process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlantWrite {
    /// Sets the true pressure. Clamped at zero.
    SetPressure(f64),
    /// Marks the pipe ruptured at the given time.
    Rupture { at_ns: u64 },
    /// Turns the pump on or off.
    SetPump(bool),
    /// Opens or closes the valve.
    SetValve(bool),
    /// Replaces the sensor reading with `value` for the rest of the run.
    SpoofSensor { value: f64 },
}

impl PlantWrite {
    /// Fields touched by this write.
    pub fn fields(&self) -> &'static [PlantField] {
        match self {
            PlantWrite::SetPressure(_) => &[PlantField::Pressure],
            PlantWrite::Rupture { .. } => &[PlantField::Ruptured],
            PlantWrite::SetPump(_) => &[PlantField::PumpOn],
            PlantWrite::SetValve(_) => &[PlantField::ValveOpen],
            PlantWrite::SpoofSensor { .. } => {
                &[PlantField::SensorSpoofed, PlantField::SpoofedValue]
            }
        }
    }
}

/// What happened to an applied write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The field changed (or was rewritten with the same value).
    Applied,
    /// Pressure write dropped because the pipe has ruptured.
    Frozen,
    /// Repeated rupture; the first rupture time is kept.
    AlreadyRuptured,
}

// ============================================================================
// Plant State
// ============================================================================

/// The shared plant record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantState {
    pressure: f64,
    valve_open: bool,
    pump_on: bool,
    ruptured: bool,
    rupture_time_ns: Option<u64>,
    sensor_spoofed: bool,
    spoofed_value: f64,
}

impl PlantState {
    /// Creates the start-of-run state: nominal pressure, valve open, pump on.
    pub fn new(operating_pressure: f64) -> Self {
        Self {
            pressure: operating_pressure.max(0.0),
            valve_open: true,
            pump_on: true,
            ruptured: false,
            rupture_time_ns: None,
            sensor_spoofed: false,
            spoofed_value: 0.0,
        }
    }

    /// True physical pressure.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    pub fn valve_open(&self) -> bool {
        self.valve_open
    }

    pub fn pump_on(&self) -> bool {
        self.pump_on
    }

    /// Once true, stays true for the rest of the run.
    pub fn ruptured(&self) -> bool {
        self.ruptured
    }

    /// Simulated time at which the pipe ruptured, if it has.
    pub fn rupture_time_ns(&self) -> Option<u64> {
        self.rupture_time_ns
    }

    pub fn sensor_spoofed(&self) -> bool {
        self.sensor_spoofed
    }

    /// Injected value. Only meaningful while [`Self::sensor_spoofed`].
    pub fn spoofed_value(&self) -> f64 {
        self.spoofed_value
    }

    /// What the control room sees: the spoofed value while spoofed,
    /// otherwise the true pressure.
    pub fn sensor_reading(&self) -> f64 {
        if self.sensor_spoofed {
            self.spoofed_value
        } else {
            self.pressure
        }
    }

    /// Applies a write on behalf of `role`.
    ///
    /// # Errors
    ///
    /// [`SimError::OwnershipViolation`] if `role` does not own every field
    /// the write touches. The state is unchanged in that case.
    pub fn apply(&mut self, role: Role, write: PlantWrite) -> Result<WriteOutcome, SimError> {
        if let Some(field) = write.fields().iter().find(|f| f.owner() != role) {
            return Err(SimError::OwnershipViolation {
                role,
                field: *field,
            });
        }

        let outcome = match write {
            PlantWrite::SetPressure(pressure) => {
                if self.ruptured {
                    debug!(pressure, "pressure write dropped after rupture");
                    WriteOutcome::Frozen
                } else {
                    self.pressure = pressure.max(0.0);
                    WriteOutcome::Applied
                }
            }
            PlantWrite::Rupture { at_ns } => {
                if self.ruptured {
                    WriteOutcome::AlreadyRuptured
                } else {
                    self.ruptured = true;
                    self.rupture_time_ns = Some(at_ns);
                    WriteOutcome::Applied
                }
            }
            PlantWrite::SetPump(on) => {
                self.pump_on = on;
                WriteOutcome::Applied
            }
            PlantWrite::SetValve(open) => {
                self.valve_open = open;
                WriteOutcome::Applied
            }
            PlantWrite::SpoofSensor { value } => {
                self.sensor_spoofed = true;
                self.spoofed_value = value;
                WriteOutcome::Applied
            }
        };

        // Postcondition: rupture is monotonic and always carries a time.
        debug_assert_eq!(self.ruptured, self.rupture_time_ns.is_some());

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn initial_state_is_nominal() {
        let plant = PlantState::new(300.0);
        assert_eq!(plant.pressure(), 300.0);
        assert!(plant.valve_open());
        assert!(plant.pump_on());
        assert!(!plant.ruptured());
        assert!(!plant.sensor_spoofed());
        assert_eq!(plant.rupture_time_ns(), None);
        assert_eq!(plant.sensor_reading(), 300.0);
    }

    #[test_case(Role::Physics, PlantWrite::SetPressure(10.0) ; "physics owns pressure")]
    #[test_case(Role::Physics, PlantWrite::Rupture { at_ns: 1 } ; "physics owns rupture")]
    #[test_case(Role::Control, PlantWrite::SetPump(false) ; "control owns pump")]
    #[test_case(Role::Adversary, PlantWrite::SetValve(false) ; "adversary owns valve")]
    #[test_case(Role::Adversary, PlantWrite::SpoofSensor { value: 1.0 } ; "adversary owns spoof")]
    fn owner_writes_are_applied(role: Role, write: PlantWrite) {
        let mut plant = PlantState::new(300.0);
        assert_eq!(plant.apply(role, write), Ok(WriteOutcome::Applied));
    }

    #[test_case(Role::Control, PlantWrite::SetPressure(10.0), PlantField::Pressure)]
    #[test_case(Role::Adversary, PlantWrite::Rupture { at_ns: 1 }, PlantField::Ruptured)]
    #[test_case(Role::Physics, PlantWrite::SetPump(false), PlantField::PumpOn)]
    #[test_case(Role::Control, PlantWrite::SetValve(false), PlantField::ValveOpen)]
    #[test_case(Role::Physics, PlantWrite::SpoofSensor { value: 1.0 }, PlantField::SensorSpoofed)]
    fn foreign_writes_are_rejected(role: Role, write: PlantWrite, field: PlantField) {
        let mut plant = PlantState::new(300.0);
        let before = plant.clone();

        let err = plant.apply(role, write).unwrap_err();
        assert_eq!(err, SimError::OwnershipViolation { role, field });
        assert_eq!(plant, before);
    }

    #[test]
    fn pressure_is_frozen_after_rupture() {
        let mut plant = PlantState::new(300.0);
        plant.apply(Role::Physics, PlantWrite::SetPressure(1600.0)).unwrap();
        plant.apply(Role::Physics, PlantWrite::Rupture { at_ns: 20 }).unwrap();

        let outcome = plant.apply(Role::Physics, PlantWrite::SetPressure(0.0)).unwrap();
        assert_eq!(outcome, WriteOutcome::Frozen);
        assert_eq!(plant.pressure(), 1600.0);
        assert!(plant.ruptured());
    }

    #[test]
    fn rupture_time_is_recorded_once() {
        let mut plant = PlantState::new(300.0);
        plant.apply(Role::Physics, PlantWrite::Rupture { at_ns: 20 }).unwrap();
        let outcome = plant.apply(Role::Physics, PlantWrite::Rupture { at_ns: 30 }).unwrap();

        assert_eq!(outcome, WriteOutcome::AlreadyRuptured);
        assert_eq!(plant.rupture_time_ns(), Some(20));
    }

    #[test]
    fn non_pressure_fields_stay_writable_after_rupture() {
        let mut plant = PlantState::new(300.0);
        plant.apply(Role::Physics, PlantWrite::Rupture { at_ns: 5 }).unwrap();

        plant.apply(Role::Control, PlantWrite::SetPump(false)).unwrap();
        plant.apply(Role::Adversary, PlantWrite::SetValve(false)).unwrap();
        assert!(!plant.pump_on());
        assert!(!plant.valve_open());
    }

    #[test]
    fn spoofing_masks_sensor_reading() {
        let mut plant = PlantState::new(300.0);
        plant.apply(Role::Physics, PlantWrite::SetPressure(1200.0)).unwrap();
        plant
            .apply(Role::Adversary, PlantWrite::SpoofSensor { value: 300.0 })
            .unwrap();

        assert_eq!(plant.sensor_reading(), 300.0);
        assert_eq!(plant.pressure(), 1200.0);

        // Spoofing is not tied to a pressure snapshot.
        plant.apply(Role::Physics, PlantWrite::SetPressure(1350.0)).unwrap();
        assert_eq!(plant.sensor_reading(), 300.0);
    }

    #[test]
    fn pressure_is_clamped_at_zero() {
        let mut plant = PlantState::new(300.0);
        plant.apply(Role::Physics, PlantWrite::SetPressure(-5.0)).unwrap();
        assert_eq!(plant.pressure(), 0.0);
    }
}
