//! Structured event stream emitted by the simulation.
//!
//! The core only records events; rendering them for a console or a log
//! pipeline is the caller's business. Events serialize to JSON Lines so
//! external tooling can diff true pressure ([`EventKind::PhysicsTick`])
//! against what the control room saw ([`EventKind::ControlTick`]).

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

// ============================================================================
// Event Kinds
// ============================================================================

/// Physics regime derived from pump and valve positions each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsMode {
    /// Pump on, valve open: pressure fluctuates around the operating point.
    Nominal,
    /// Pump on, valve closed: pressure climbs.
    Building,
    /// Pump off: pressure bleeds off.
    Venting,
    /// Terminal. Pressure is frozen.
    Ruptured,
}

/// Control room verdict for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Ok,
    Alarm,
}

/// Kill-chain stage reached by the adversary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackStage {
    /// Sensor feed replaced with a plausible nominal value.
    Spoofing,
    /// Valve-close command sent.
    Actuating,
    /// Attack finished; the adversary makes no further writes.
    Done,
}

/// Payload of a [`SimEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// True pressure after a physics tick, emitted even while spoofed.
    PhysicsTick { pressure: f64, mode: PhysicsMode },
    /// The pipe burst. Emitted once.
    Rupture { pressure: f64 },
    /// What the control loop read and decided.
    ControlTick {
        reading: f64,
        status: ControlStatus,
        spoofed: bool,
    },
    /// Safety shutoff engaged.
    Alarm { reading: f64 },
    /// Adversary advanced its kill chain.
    AttackStage { stage: AttackStage },
}

/// A timestamped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Simulated time of emission (nanoseconds).
    pub time_ns: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

// ============================================================================
// Trace
// ============================================================================

/// Ordered event log for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    events: Vec<SimEvent>,
}

impl Trace {
    /// Creates an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&mut self, time_ns: u64, kind: EventKind) {
        self.events.push(SimEvent { time_ns, kind });
    }

    /// All events in emission order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Alarm events.
    pub fn alarms(&self) -> impl Iterator<Item = &SimEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Alarm { .. }))
    }

    /// The rupture event, if the pipe burst.
    pub fn rupture(&self) -> Option<&SimEvent> {
        self.events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Rupture { .. }))
    }

    /// Time at which the adversary reached `stage`, if it did.
    pub fn attack_stage_time(&self, stage: AttackStage) -> Option<u64> {
        self.events.iter().find_map(|e| match e.kind {
            EventKind::AttackStage { stage: s } if s == stage => Some(e.time_ns),
            _ => None,
        })
    }

    /// True pressure from every physics tick, with its timestamp.
    pub fn pressures(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.events.iter().filter_map(|e| match e.kind {
            EventKind::PhysicsTick { pressure, .. } => Some((e.time_ns, pressure)),
            _ => None,
        })
    }

    /// Writes the trace as JSON Lines, one event per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for event in &self.events {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Parses a trace previously written by [`Self::write_jsonl`].
    pub fn read_jsonl(input: &str) -> serde_json::Result<Self> {
        let events = input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect::<serde_json::Result<Vec<SimEvent>>>()?;
        Ok(Self { events })
    }
}
