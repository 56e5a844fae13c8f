//! Error types for the simulation core.
//!
//! Only fatal conditions live here. Domain outcomes such as an alarm or a
//! rupture are reported through the event trace, never as errors.

use thiserror::Error;

use crate::plant::{PlantField, Role};

/// Fatal simulation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Invalid parameter or parameter combination. Raised before any
    /// process runs.
    #[error("invalid configuration for `{field}`: {reason}")]
    Configuration {
        /// Offending configuration field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A wake-up was scheduled earlier than the current clock.
    #[error("time travel: wake time {wake_ns}ns is before current time {now_ns}ns")]
    TimeTravel {
        /// Clock value when the wake-up was popped.
        now_ns: u64,
        /// The offending wake time.
        wake_ns: u64,
    },

    /// A process wrote a plant field it does not own.
    #[error("{role} process may not write plant field `{field}`")]
    OwnershipViolation {
        /// Role of the writing process.
        role: Role,
        /// Field it attempted to write.
        field: PlantField,
    },
}

impl SimError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}
