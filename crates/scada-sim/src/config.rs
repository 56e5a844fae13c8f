//! Simulation configuration.
//!
//! [`SimConfig`] is the user-facing form: durations in seconds, every field
//! defaulted and overridable. [`SimConfig::resolve`] validates it and
//! converts durations to the clock's nanoseconds, producing the parameter
//! blocks the processes are built from.

use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::clock::sec_to_ns;

// ============================================================================
// Simulation Configuration
// ============================================================================

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Run length (seconds).
    pub simulation_horizon: f64,
    /// Physics and control tick (seconds).
    pub tick_interval: f64,
    /// Pressure at which the pipe bursts.
    pub burst_limit: f64,
    /// Reading above which the control loop stops the pump.
    pub safety_threshold: f64,
    /// Nominal pressure, also the initial pressure.
    pub operating_pressure: f64,
    /// Pressure gain per tick while the valve is closed.
    pub buildup_rate: f64,
    /// Pressure loss per tick while the pump is off.
    pub vent_rate: f64,
    /// Noise amplitude while building.
    pub buildup_noise: f64,
    /// Noise amplitude around the operating pressure.
    pub nominal_noise: f64,
    /// When the attack starts (seconds). `None` disables the attacker.
    pub attack_time: Option<f64>,
    /// Delay between spoofing the sensor and closing the valve (seconds).
    pub pivot_delay: f64,
    /// Whether the attacker falsifies the sensor before actuating.
    pub spoof_sensor: bool,
    /// Injected reading. `None` uses the operating pressure.
    pub spoofed_value: Option<f64>,
    /// Seed for all process noise.
    pub rng_seed: u64,
    /// Upper bound on process resumptions per run.
    pub max_resumptions: u64,
    /// Stop this long after a rupture instead of running to the horizon.
    pub rupture_cooldown: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation_horizon: 60.0,
            tick_interval: 1.0,
            burst_limit: 1500.0,
            safety_threshold: 1000.0,
            operating_pressure: 300.0,
            buildup_rate: 150.0,
            vent_rate: 50.0,
            buildup_noise: 10.0,
            nominal_noise: 5.0,
            attack_time: Some(10.0),
            pivot_delay: 2.0,
            spoof_sensor: true,
            spoofed_value: None,
            rng_seed: 0,
            max_resumptions: 1_000_000,
            rupture_cooldown: None,
        }
    }
}

impl SimConfig {
    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Sets the run length in seconds.
    pub fn with_horizon(mut self, secs: f64) -> Self {
        self.simulation_horizon = secs;
        self
    }

    pub fn with_tick_interval(mut self, secs: f64) -> Self {
        self.tick_interval = secs;
        self
    }

    /// Schedules the attack, or disables it with `None`.
    pub fn with_attack_time(mut self, secs: Option<f64>) -> Self {
        self.attack_time = secs;
        self
    }

    pub fn with_pivot_delay(mut self, secs: f64) -> Self {
        self.pivot_delay = secs;
        self
    }

    /// Enables or disables the spoofing stage of the attack.
    pub fn with_spoofing(mut self, spoof_sensor: bool) -> Self {
        self.spoof_sensor = spoof_sensor;
        self
    }

    /// Zeroes both noise amplitudes.
    pub fn noise_free(mut self) -> Self {
        self.buildup_noise = 0.0;
        self.nominal_noise = 0.0;
        self
    }

    pub fn with_max_resumptions(mut self, max: u64) -> Self {
        self.max_resumptions = max;
        self
    }

    pub fn with_rupture_cooldown(mut self, secs: Option<f64>) -> Self {
        self.rupture_cooldown = secs;
        self
    }

    /// Checks every field without converting.
    pub fn validate(&self) -> Result<(), SimError> {
        self.resolve().map(|_| ())
    }

    /// Validates and converts to nanosecond parameters.
    ///
    /// Reports the first offending field.
    pub fn resolve(&self) -> Result<ResolvedConfig, SimError> {
        let horizon_ns = duration("simulation_horizon", self.simulation_horizon)?;
        if horizon_ns == 0 {
            return Err(SimError::config("simulation_horizon", "must be positive"));
        }
        let tick_ns = duration("tick_interval", self.tick_interval)?;
        if tick_ns == 0 {
            return Err(SimError::config("tick_interval", "must be positive"));
        }

        non_negative("operating_pressure", self.operating_pressure)?;
        finite("burst_limit", self.burst_limit)?;
        if self.burst_limit <= self.operating_pressure {
            return Err(SimError::config(
                "burst_limit",
                format!(
                    "must exceed operating_pressure ({})",
                    self.operating_pressure
                ),
            ));
        }
        finite("safety_threshold", self.safety_threshold)?;
        if self.safety_threshold <= 0.0 {
            return Err(SimError::config("safety_threshold", "must be positive"));
        }
        finite("buildup_rate", self.buildup_rate)?;
        non_negative("vent_rate", self.vent_rate)?;
        non_negative("buildup_noise", self.buildup_noise)?;
        non_negative("nominal_noise", self.nominal_noise)?;

        let pivot_ns = duration("pivot_delay", self.pivot_delay)?;
        let attack = match self.attack_time {
            None => None,
            Some(secs) => {
                let attack_ns = duration("attack_time", secs)?;
                // A valve-closing attack can only threaten the pipe if
                // pressure actually builds.
                if self.buildup_rate <= 0.0 {
                    return Err(SimError::config(
                        "buildup_rate",
                        "must be positive when an attack is scheduled",
                    ));
                }
                let spoofed_value = match self.spoofed_value {
                    Some(value) => {
                        finite("spoofed_value", value)?;
                        value
                    }
                    None => self.operating_pressure,
                };
                Some(AttackPlan {
                    attack_ns,
                    pivot_ns,
                    spoof_sensor: self.spoof_sensor,
                    spoofed_value,
                })
            }
        };

        if self.max_resumptions == 0 {
            return Err(SimError::config("max_resumptions", "must be positive"));
        }
        let rupture_cooldown_ns = self
            .rupture_cooldown
            .map(|secs| duration("rupture_cooldown", secs))
            .transpose()?;

        Ok(ResolvedConfig {
            limits: RunLimits {
                horizon_ns,
                max_resumptions: self.max_resumptions,
                rupture_cooldown_ns,
            },
            tick_ns,
            plant: PlantParams {
                burst_limit: self.burst_limit,
                operating_pressure: self.operating_pressure,
                buildup_rate: self.buildup_rate,
                vent_rate: self.vent_rate,
                buildup_noise: self.buildup_noise,
                nominal_noise: self.nominal_noise,
            },
            safety_threshold: self.safety_threshold,
            attack,
            seed: self.rng_seed,
        })
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::config(field, format!("must be finite, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SimError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(SimError::config(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn duration(field: &'static str, secs: f64) -> Result<u64, SimError> {
    sec_to_ns(secs).ok_or_else(|| {
        SimError::config(
            field,
            format!("must be a finite, non-negative number of seconds, got {secs}"),
        )
    })
}

// ============================================================================
// Resolved Parameters
// ============================================================================

/// Validated configuration in clock units.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub limits: RunLimits,
    pub tick_ns: u64,
    pub plant: PlantParams,
    pub safety_threshold: f64,
    /// `None` when the attacker is disabled.
    pub attack: Option<AttackPlan>,
    pub seed: u64,
}

/// Stop conditions for [`crate::Scheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    pub horizon_ns: u64,
    pub max_resumptions: u64,
    pub rupture_cooldown_ns: Option<u64>,
}

impl RunLimits {
    /// Limits with only a horizon.
    pub fn horizon(horizon_ns: u64) -> Self {
        Self {
            horizon_ns,
            max_resumptions: u64::MAX,
            rupture_cooldown_ns: None,
        }
    }
}

/// Physics parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    pub burst_limit: f64,
    pub operating_pressure: f64,
    pub buildup_rate: f64,
    pub vent_rate: f64,
    pub buildup_noise: f64,
    pub nominal_noise: f64,
}

/// Adversary timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackPlan {
    /// When spoofing starts.
    pub attack_ns: u64,
    /// Spoofing-to-actuation delay.
    pub pivot_ns: u64,
    pub spoof_sensor: bool,
    pub spoofed_value: f64,
}

impl AttackPlan {
    /// When the valve closes.
    pub fn actuation_ns(&self) -> u64 {
        self.attack_ns.saturating_add(self.pivot_ns)
    }

    /// First adversary wake-up. Without spoofing there is nothing to do
    /// before actuation.
    pub fn first_wake_ns(&self) -> u64 {
        if self.spoof_sensor {
            self.attack_ns
        } else {
            self.actuation_ns()
        }
    }
}
