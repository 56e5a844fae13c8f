//! Virtual time for the simulation.
//!
//! The clock holds nanosecond-precision simulated time that advances only
//! when the scheduler moves it. Integer nanoseconds keep every delay sum
//! exact, so `attack_time + pivot_delay` lands on the same instant no matter
//! how it is reached.

use crate::SimError;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Converts seconds to nanoseconds.
///
/// Returns `None` for negative, non-finite, or out-of-range values.
pub fn sec_to_ns(secs: f64) -> Option<u64> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let ns = (secs * NANOS_PER_SEC).round();
    // u64::MAX as f64 rounds up to 2^64, so `>=` rejects it too.
    if ns >= u64::MAX as f64 {
        return None;
    }
    Some(ns as u64)
}

/// Converts nanoseconds to seconds.
pub fn ns_to_sec(ns: u64) -> f64 {
    ns as f64 / NANOS_PER_SEC
}

/// Monotonic simulated clock.
///
/// Starts at zero. Only the scheduler holds a mutable handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimClock {
    now_ns: u64,
}

impl SimClock {
    /// Creates a new clock starting at time zero.
    pub fn new() -> Self {
        Self { now_ns: 0 }
    }

    /// Returns the current simulated time in nanoseconds.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now_ns
    }

    /// Advances time to `time_ns`.
    ///
    /// Moving backwards is a scheduler bug, never a domain condition, and is
    /// reported as [`SimError::TimeTravel`]. Advancing to the current time is
    /// allowed (same-instant wake-ups).
    pub fn advance_to(&mut self, time_ns: u64) -> Result<(), SimError> {
        if time_ns < self.now_ns {
            return Err(SimError::TimeTravel {
                now_ns: self.now_ns,
                wake_ns: time_ns,
            });
        }
        self.now_ns = time_ns;
        Ok(())
    }
}
