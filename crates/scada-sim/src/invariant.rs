//! Invariant checkers for simulation runs.
//!
//! Checkers inspect a finished run (its event trace plus the scheduler's
//! resumption log) and report every property that failed to hold.
//!
//! # Available Checkers
//!
//! - [`ClockMonotonicityChecker`]: time never runs backwards
//! - [`RuptureIrreversibilityChecker`]: a ruptured pipe stays ruptured
//! - [`SpoofMaskingChecker`]: a plausible spoofed reading never alarms
//! - [`AttackOrderingChecker`]: blinding precedes actuation by the pivot delay

#![allow(clippy::float_cmp)] // Frozen and reported readings compare exactly

use crate::config::ResolvedConfig;
use crate::scheduler::Resumption;
use crate::trace::{AttackStage, ControlStatus, EventKind, PhysicsMode, Trace};

// ============================================================================
// Invariant Result
// ============================================================================

/// Result of an invariant check.
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantResult {
    /// The invariant holds.
    Ok,
    /// The invariant is violated.
    Violated {
        /// Name of the violated invariant.
        invariant: String,
        /// Description of the violation.
        message: String,
        /// Additional context.
        context: Vec<(String, String)>,
    },
}

impl InvariantResult {
    /// Returns true if the invariant holds.
    pub fn is_ok(&self) -> bool {
        matches!(self, InvariantResult::Ok)
    }

    fn violated(invariant: &str, message: String, context: Vec<(&str, String)>) -> Self {
        InvariantResult::Violated {
            invariant: invariant.to_string(),
            message,
            context: context
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }
}

/// What a checker may look at besides the trace.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub config: &'a ResolvedConfig,
    pub resumptions: &'a [Resumption],
}

// ============================================================================
// Invariant Checker Trait
// ============================================================================

/// Trait for invariant checkers.
pub trait InvariantChecker {
    /// Returns the name of this checker.
    fn name(&self) -> &'static str;

    /// Checks a completed run.
    fn check(&self, trace: &Trace, ctx: &RunContext<'_>) -> InvariantResult;
}

// ============================================================================
// Clock Monotonicity Checker
// ============================================================================

/// Event timestamps and resumption times never decrease, and no process
/// resumes at any time other than the one it asked for.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockMonotonicityChecker;

impl InvariantChecker for ClockMonotonicityChecker {
    fn name(&self) -> &'static str {
        "clock_monotonicity"
    }

    fn check(&self, trace: &Trace, ctx: &RunContext<'_>) -> InvariantResult {
        for pair in trace.events().windows(2) {
            if pair[1].time_ns < pair[0].time_ns {
                return InvariantResult::violated(
                    "event_time_monotonic",
                    format!(
                        "event at {}ns recorded after event at {}ns",
                        pair[1].time_ns, pair[0].time_ns
                    ),
                    vec![
                        ("previous_ns", pair[0].time_ns.to_string()),
                        ("current_ns", pair[1].time_ns.to_string()),
                    ],
                );
            }
        }

        let mut last = 0;
        for resumption in ctx.resumptions {
            if resumption.resumed_ns != resumption.requested_ns {
                return InvariantResult::violated(
                    "resumption_on_time",
                    format!(
                        "{} resumed at {}ns but requested {}ns",
                        resumption.process, resumption.resumed_ns, resumption.requested_ns
                    ),
                    vec![
                        ("process", resumption.process.to_string()),
                        ("requested_ns", resumption.requested_ns.to_string()),
                        ("resumed_ns", resumption.resumed_ns.to_string()),
                    ],
                );
            }
            if resumption.resumed_ns < last {
                return InvariantResult::violated(
                    "resumption_time_monotonic",
                    format!(
                        "{} resumed at {}ns after a resumption at {last}ns",
                        resumption.process, resumption.resumed_ns
                    ),
                    vec![
                        ("previous_ns", last.to_string()),
                        ("resumed_ns", resumption.resumed_ns.to_string()),
                    ],
                );
            }
            last = resumption.resumed_ns;
        }

        InvariantResult::Ok
    }
}

// ============================================================================
// Rupture Irreversibility Checker
// ============================================================================

/// After a rupture the pressure is frozen, the mode stays `Ruptured`, no
/// second rupture is reported, and control makes no further decisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuptureIrreversibilityChecker;

impl InvariantChecker for RuptureIrreversibilityChecker {
    fn name(&self) -> &'static str {
        "rupture_irreversibility"
    }

    fn check(&self, trace: &Trace, _ctx: &RunContext<'_>) -> InvariantResult {
        let mut frozen: Option<(u64, f64)> = None;

        for event in trace.events() {
            match (&event.kind, frozen) {
                (EventKind::Rupture { pressure }, None) => {
                    frozen = Some((event.time_ns, *pressure));
                }
                (EventKind::Rupture { .. }, Some((at_ns, _))) => {
                    return InvariantResult::violated(
                        "single_rupture",
                        format!("second rupture at {}ns (first at {at_ns}ns)", event.time_ns),
                        vec![("rupture_ns", at_ns.to_string())],
                    );
                }
                (EventKind::PhysicsTick { pressure, mode }, Some((at_ns, frozen_pressure))) => {
                    if event.time_ns > at_ns
                        && (*mode != PhysicsMode::Ruptured || *pressure != frozen_pressure)
                    {
                        return InvariantResult::violated(
                            "pressure_frozen_after_rupture",
                            format!(
                                "physics reported {pressure} ({mode:?}) at {}ns after rupture at {frozen_pressure}",
                                event.time_ns
                            ),
                            vec![
                                ("rupture_ns", at_ns.to_string()),
                                ("frozen_pressure", frozen_pressure.to_string()),
                                ("reported_pressure", pressure.to_string()),
                            ],
                        );
                    }
                }
                (EventKind::ControlTick { .. } | EventKind::Alarm { .. }, Some((at_ns, _))) => {
                    return InvariantResult::violated(
                        "control_halted_after_rupture",
                        format!(
                            "control acted at {}ns after rupture at {at_ns}ns",
                            event.time_ns
                        ),
                        vec![("rupture_ns", at_ns.to_string())],
                    );
                }
                _ => {}
            }
        }

        InvariantResult::Ok
    }
}

// ============================================================================
// Spoof Masking Checker
// ============================================================================

/// While the sensor is spoofed with a value at or below the threshold, the
/// control loop reports `Ok` and raises no alarm. Every alarm must follow a
/// control decision that read above the threshold.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpoofMaskingChecker;

impl InvariantChecker for SpoofMaskingChecker {
    fn name(&self) -> &'static str {
        "spoof_masking"
    }

    fn check(&self, trace: &Trace, ctx: &RunContext<'_>) -> InvariantResult {
        let threshold = ctx.config.safety_threshold;
        let mut last_decision: Option<(u64, f64, ControlStatus)> = None;

        for event in trace.events() {
            match event.kind {
                EventKind::ControlTick {
                    reading,
                    status,
                    spoofed,
                } => {
                    if spoofed && reading <= threshold && status != ControlStatus::Ok {
                        return InvariantResult::violated(
                            "spoofed_reading_masks_alarm",
                            format!(
                                "spoofed reading {reading} <= {threshold} produced {status:?} at {}ns",
                                event.time_ns
                            ),
                            vec![
                                ("reading", reading.to_string()),
                                ("threshold", threshold.to_string()),
                            ],
                        );
                    }
                    last_decision = Some((event.time_ns, reading, status));
                }
                EventKind::Alarm { reading } => {
                    let justified = matches!(
                        last_decision,
                        Some((at_ns, decided, ControlStatus::Alarm))
                            if at_ns == event.time_ns && decided == reading && reading > threshold
                    );
                    if !justified {
                        return InvariantResult::violated(
                            "alarm_requires_reading_above_threshold",
                            format!(
                                "alarm at {}ns with reading {reading} not backed by a control decision",
                                event.time_ns
                            ),
                            vec![
                                ("reading", reading.to_string()),
                                ("threshold", threshold.to_string()),
                            ],
                        );
                    }
                }
                _ => {}
            }
        }

        InvariantResult::Ok
    }
}

// ============================================================================
// Attack Ordering Checker
// ============================================================================

/// Attack stages occur at their planned instants: spoofing at the attack
/// time, actuation exactly one pivot delay later, and completion no earlier
/// than actuation. Without a plan, no stage is ever recorded.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttackOrderingChecker;

impl InvariantChecker for AttackOrderingChecker {
    fn name(&self) -> &'static str {
        "attack_ordering"
    }

    fn check(&self, trace: &Trace, ctx: &RunContext<'_>) -> InvariantResult {
        let spoofing = trace.attack_stage_time(AttackStage::Spoofing);
        let actuating = trace.attack_stage_time(AttackStage::Actuating);
        let done = trace.attack_stage_time(AttackStage::Done);

        let Some(plan) = ctx.config.attack else {
            if spoofing.is_some() || actuating.is_some() || done.is_some() {
                return InvariantResult::violated(
                    "no_attack_without_plan",
                    "attack stage recorded although no attack was planned".to_string(),
                    Vec::new(),
                );
            }
            return InvariantResult::Ok;
        };

        if let Some(at_ns) = spoofing {
            if !plan.spoof_sensor || at_ns != plan.attack_ns {
                return InvariantResult::violated(
                    "spoofing_at_attack_time",
                    format!("spoofing began at {at_ns}ns, planned {}ns", plan.attack_ns),
                    vec![
                        ("spoofing_ns", at_ns.to_string()),
                        ("attack_ns", plan.attack_ns.to_string()),
                        ("spoof_sensor", plan.spoof_sensor.to_string()),
                    ],
                );
            }
        }

        if let Some(at_ns) = actuating {
            let expected = plan.actuation_ns();
            if at_ns != expected {
                return InvariantResult::violated(
                    "actuation_after_pivot_delay",
                    format!("valve closed at {at_ns}ns, expected {expected}ns"),
                    vec![
                        ("actuating_ns", at_ns.to_string()),
                        ("expected_ns", expected.to_string()),
                    ],
                );
            }
            if plan.spoof_sensor && spoofing.is_none() {
                return InvariantResult::violated(
                    "spoofing_precedes_actuation",
                    format!("valve closed at {at_ns}ns without prior spoofing"),
                    vec![("actuating_ns", at_ns.to_string())],
                );
            }
        }

        match (actuating, done) {
            (Some(a), Some(d)) if d < a => InvariantResult::violated(
                "done_after_actuation",
                format!("attack finished at {d}ns before actuation at {a}ns"),
                vec![("actuating_ns", a.to_string()), ("done_ns", d.to_string())],
            ),
            (None, Some(d)) => InvariantResult::violated(
                "done_after_actuation",
                format!("attack finished at {d}ns without actuation"),
                vec![("done_ns", d.to_string())],
            ),
            _ => InvariantResult::Ok,
        }
    }
}

// ============================================================================
// Invariant Suite
// ============================================================================

/// A named collection of checkers run together.
pub struct InvariantSuite {
    checkers: Vec<Box<dyn InvariantChecker>>,
}

impl InvariantSuite {
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
        }
    }

    /// All four built-in checkers.
    pub fn standard() -> Self {
        Self::new()
            .with(ClockMonotonicityChecker)
            .with(RuptureIrreversibilityChecker)
            .with(SpoofMaskingChecker)
            .with(AttackOrderingChecker)
    }

    #[must_use]
    pub fn with(mut self, checker: impl InvariantChecker + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Runs every checker; returns only the violations.
    pub fn check_all(&self, trace: &Trace, ctx: &RunContext<'_>) -> Vec<InvariantResult> {
        self.checkers
            .iter()
            .map(|checker| checker.check(trace, ctx))
            .filter(|result| !result.is_ok())
            .collect()
    }

    /// Per-checker results, in suite order.
    pub fn results(
        &self,
        trace: &Trace,
        ctx: &RunContext<'_>,
    ) -> Vec<(&'static str, InvariantResult)> {
        self.checkers
            .iter()
            .map(|checker| (checker.name(), checker.check(trace, ctx)))
            .collect()
    }
}

impl Default for InvariantSuite {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;
    use crate::event::ProcessId;

    fn resolved(config: SimConfig) -> ResolvedConfig {
        config.resolve().expect("valid config")
    }

    fn check(
        checker: &dyn InvariantChecker,
        trace: &Trace,
        config: &ResolvedConfig,
    ) -> InvariantResult {
        let ctx = RunContext {
            config,
            resumptions: &[],
        };
        checker.check(trace, &ctx)
    }

    fn invariant_name(result: &InvariantResult) -> &str {
        match result {
            InvariantResult::Violated { invariant, .. } => invariant,
            InvariantResult::Ok => "ok",
        }
    }

    #[test]
    fn out_of_order_events_violate_monotonicity() {
        let mut trace = Trace::new();
        trace.record(5, EventKind::Alarm { reading: 1.0 });
        trace.record(3, EventKind::Alarm { reading: 1.0 });

        let config = resolved(SimConfig::default());
        let result = check(&ClockMonotonicityChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "event_time_monotonic");
    }

    #[test]
    fn late_resumption_violates_monotonicity() {
        let config = resolved(SimConfig::default());
        let resumptions = [Resumption {
            process: ProcessId::new(0),
            requested_ns: 10,
            resumed_ns: 11,
        }];
        let ctx = RunContext {
            config: &config,
            resumptions: &resumptions,
        };
        let result = ClockMonotonicityChecker.check(&Trace::new(), &ctx);
        assert_eq!(invariant_name(&result), "resumption_on_time");
    }

    #[test]
    fn pressure_change_after_rupture_is_caught() {
        let mut trace = Trace::new();
        trace.record(20, EventKind::Rupture { pressure: 1500.0 });
        trace.record(
            21,
            EventKind::PhysicsTick {
                pressure: 1500.0,
                mode: PhysicsMode::Ruptured,
            },
        );
        trace.record(
            22,
            EventKind::PhysicsTick {
                pressure: 1450.0,
                mode: PhysicsMode::Ruptured,
            },
        );

        let config = resolved(SimConfig::default());
        let result = check(&RuptureIrreversibilityChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "pressure_frozen_after_rupture");
    }

    #[test]
    fn control_after_rupture_is_caught() {
        let mut trace = Trace::new();
        trace.record(20, EventKind::Rupture { pressure: 1500.0 });
        trace.record(
            21,
            EventKind::ControlTick {
                reading: 300.0,
                status: ControlStatus::Ok,
                spoofed: true,
            },
        );

        let config = resolved(SimConfig::default());
        let result = check(&RuptureIrreversibilityChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "control_halted_after_rupture");
    }

    #[test]
    fn alarm_on_plausible_spoof_is_caught() {
        let mut trace = Trace::new();
        trace.record(
            12,
            EventKind::ControlTick {
                reading: 300.0,
                status: ControlStatus::Alarm,
                spoofed: true,
            },
        );

        let config = resolved(SimConfig::default());
        let result = check(&SpoofMaskingChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "spoofed_reading_masks_alarm");
    }

    #[test]
    fn alarm_without_decision_is_caught() {
        let mut trace = Trace::new();
        trace.record(12, EventKind::Alarm { reading: 1050.0 });

        let config = resolved(SimConfig::default());
        let result = check(&SpoofMaskingChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "alarm_requires_reading_above_threshold");
    }

    #[test]
    fn honest_alarm_passes_masking_check() {
        let mut trace = Trace::new();
        trace.record(
            17,
            EventKind::ControlTick {
                reading: 1050.0,
                status: ControlStatus::Alarm,
                spoofed: false,
            },
        );
        trace.record(17, EventKind::Alarm { reading: 1050.0 });

        let config = resolved(SimConfig::default());
        assert!(check(&SpoofMaskingChecker, &trace, &config).is_ok());
    }

    #[test]
    fn early_actuation_is_caught() {
        let mut trace = Trace::new();
        trace.record(
            10_000_000_000,
            EventKind::AttackStage {
                stage: AttackStage::Spoofing,
            },
        );
        trace.record(
            11_000_000_000,
            EventKind::AttackStage {
                stage: AttackStage::Actuating,
            },
        );

        let config = resolved(SimConfig::default());
        let result = check(&AttackOrderingChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "actuation_after_pivot_delay");
    }

    #[test]
    fn attack_stage_without_plan_is_caught() {
        let mut trace = Trace::new();
        trace.record(
            10,
            EventKind::AttackStage {
                stage: AttackStage::Spoofing,
            },
        );

        let config = resolved(SimConfig::default().with_attack_time(None));
        let result = check(&AttackOrderingChecker, &trace, &config);
        assert_eq!(invariant_name(&result), "no_attack_without_plan");
    }

    #[test]
    fn standard_suite_passes_real_run() {
        let config = SimConfig::default().with_seed(7);
        let resolved = resolved(config.clone());
        let summary = crate::run(config).unwrap();

        let suite = InvariantSuite::standard();
        assert_eq!(suite.len(), 4);
        let violations = suite.check_all(&summary.trace, &summary.run_context(&resolved));
        assert!(violations.is_empty(), "violations: {violations:?}");
    }
}
