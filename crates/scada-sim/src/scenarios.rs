//! Pre-configured attack scenarios.
//!
//! Each scenario is a [`SimConfig`] preset:
//!
//! | Scenario | Attack | Spoofing | Expected outcome |
//! |---|---|---|---|
//! | `baseline` | none | - | pressure near nominal, no alarm, no rupture |
//! | `spoof-and-actuate` | at 10s | yes | rupture with zero alarms |
//! | `actuate-only` | at 10s | no | alarm and pump stop, no rupture |

use std::fmt;
use std::str::FromStr;

use crate::SimConfig;

// ============================================================================
// Scenario Types
// ============================================================================

/// Predefined scenarios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScenarioType {
    /// No attacker: the control loop runs against nominal physics.
    Baseline,
    /// The full kill chain: spoof the sensor, then close the valve.
    #[default]
    SpoofAndActuate,
    /// Close the valve without blinding the monitor first.
    ActuateOnly,
}

impl ScenarioType {
    /// Returns the identifier used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::SpoofAndActuate => "spoof-and-actuate",
            Self::ActuateOnly => "actuate-only",
        }
    }

    /// Returns a description of what this scenario demonstrates.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Baseline => "No attack; pressure stays near the operating point",
            Self::SpoofAndActuate => {
                "Sensor spoofed at 10s, valve closed at 12s; pipe ruptures with no alarm"
            }
            Self::ActuateOnly => {
                "Valve closed without spoofing; the safety interlock trips and stops the pump"
            }
        }
    }

    /// Returns all scenario types.
    pub fn all() -> &'static [ScenarioType] {
        &[Self::Baseline, Self::SpoofAndActuate, Self::ActuateOnly]
    }

    /// Builds the configuration for this scenario with the given seed.
    pub fn config(&self, seed: u64) -> SimConfig {
        self.apply(SimConfig::default().with_seed(seed))
    }

    /// Overlays this scenario's attack settings on `config`. Plant and
    /// timing parameters are left alone.
    pub fn apply(&self, config: SimConfig) -> SimConfig {
        match self {
            Self::Baseline => config.with_attack_time(None),
            Self::SpoofAndActuate => {
                let attack_time = config.attack_time.or(SimConfig::default().attack_time);
                config.with_attack_time(attack_time).with_spoofing(true)
            }
            Self::ActuateOnly => {
                let attack_time = config.attack_time.or(SimConfig::default().attack_time);
                config.with_attack_time(attack_time).with_spoofing(false)
            }
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a scenario name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scenario `{0}` (expected one of: baseline, spoof-and-actuate, actuate-only)")]
pub struct UnknownScenario(pub String);

impl FromStr for ScenarioType {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "baseline" | "a" => Ok(Self::Baseline),
            "spoof-and-actuate" | "attack" | "b" => Ok(Self::SpoofAndActuate),
            "actuate-only" | "no-spoof" | "c" => Ok(Self::ActuateOnly),
            _ => Err(UnknownScenario(s.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
