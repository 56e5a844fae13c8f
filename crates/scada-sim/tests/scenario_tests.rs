//! End-to-end runs of the three preset scenarios.
//!
//! The noise-free variants pin exact instants; the noisy variants check the
//! qualitative outcome across a handful of seeds.

use scada_sim::{
    AttackStage, ControlStatus, EventKind, InvariantSuite, PhysicsMode, ScenarioType, SimConfig,
    SimSummary, Simulation, StopReason, sec_to_ns,
};

fn secs(s: f64) -> u64 {
    sec_to_ns(s).unwrap()
}

fn run_checked(config: SimConfig) -> SimSummary {
    let simulation = Simulation::new(config).unwrap();
    let resolved = simulation.resolved().clone();
    let summary = simulation.run().unwrap();

    let violations =
        InvariantSuite::standard().check_all(&summary.trace, &summary.run_context(&resolved));
    assert!(violations.is_empty(), "invariant violations: {violations:?}");
    summary
}

// ============================================================================
// Scenario A: baseline
// ============================================================================

#[test]
fn test_baseline_stays_near_operating_pressure() {
    for seed in 0..10 {
        let summary = run_checked(ScenarioType::Baseline.config(seed));

        assert!(!summary.ruptured(), "seed {seed} ruptured");
        assert_eq!(summary.alarm_count, 0);
        assert!(summary.final_plant.pump_on());
        assert!(summary.final_plant.valve_open());
        for (time_ns, pressure) in summary.trace.pressures() {
            assert!(
                (295.0..=305.0).contains(&pressure),
                "seed {seed}: pressure {pressure} at {time_ns}ns"
            );
        }
    }
}

#[test]
fn test_attack_after_horizon_behaves_like_baseline() {
    let summary = run_checked(SimConfig::default().with_attack_time(Some(90.0)));

    assert!(!summary.ruptured());
    assert_eq!(summary.alarm_count, 0);
    assert_eq!(summary.trace.attack_stage_time(AttackStage::Spoofing), None);
    assert!(!summary.final_plant.sensor_spoofed());
}

// ============================================================================
// Scenario B: spoof and actuate
// ============================================================================

#[test]
fn test_full_kill_chain_ruptures_silently() {
    let summary = run_checked(ScenarioType::SpoofAndActuate.config(0).noise_free());

    assert_eq!(summary.rupture_time_ns, Some(secs(20.0)));
    assert_eq!(summary.alarm_count, 0);
    assert_eq!(summary.stop_reason, StopReason::Horizon);
    assert_eq!(summary.final_time_ns, secs(60.0));

    let trace = &summary.trace;
    assert_eq!(trace.attack_stage_time(AttackStage::Spoofing), Some(secs(10.0)));
    assert_eq!(trace.attack_stage_time(AttackStage::Actuating), Some(secs(12.0)));
    assert_eq!(trace.attack_stage_time(AttackStage::Done), Some(secs(12.0)));

    let rupture = trace.rupture().unwrap();
    assert_eq!(rupture.kind, EventKind::Rupture { pressure: 1500.0 });
}

#[test]
fn test_pressure_ramp_after_valve_closes() {
    let summary = run_checked(ScenarioType::SpoofAndActuate.config(0).noise_free());

    let ramp: Vec<(u64, f64)> = summary
        .trace
        .pressures()
        .filter(|(t, _)| (secs(12.0)..=secs(20.0)).contains(t))
        .collect();
    let expected: Vec<(u64, f64)> = [300.0, 450.0, 600.0, 750.0, 900.0, 1050.0, 1200.0, 1350.0, 1500.0]
        .into_iter()
        .enumerate()
        .map(|(i, p)| (secs(12.0 + i as f64), p))
        .collect();
    assert_eq!(ramp, expected);
}

#[test]
fn test_operator_sees_nominal_while_pipe_builds() {
    let summary = run_checked(ScenarioType::SpoofAndActuate.config(0).noise_free());

    let spoofed_ticks: Vec<_> = summary
        .trace
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            EventKind::ControlTick {
                reading,
                status,
                spoofed: true,
            } => Some((reading, status)),
            _ => None,
        })
        .collect();

    // Control ticks at 11..=19 see the spoofed reading; at 20 it sees the rupture.
    assert_eq!(spoofed_ticks.len(), 9);
    assert!(spoofed_ticks.iter().all(|&(r, s)| r == 300.0 && s == ControlStatus::Ok));
}

#[test]
fn test_physics_keeps_reporting_frozen_pressure() {
    let summary = run_checked(ScenarioType::SpoofAndActuate.config(0).noise_free());

    let after: Vec<_> = summary
        .trace
        .events()
        .iter()
        .filter(|e| e.time_ns > secs(20.0))
        .collect();
    // Physics ticks at 21..=59; control has terminated.
    assert_eq!(after.len(), 39);
    assert!(after.iter().all(|e| e.kind
        == EventKind::PhysicsTick {
            pressure: 1500.0,
            mode: PhysicsMode::Ruptured
        }));
    assert_eq!(summary.final_plant.pressure(), 1500.0);
}

#[test]
fn test_noisy_kill_chain_always_ruptures_without_alarm() {
    for seed in 0..10 {
        let summary = run_checked(ScenarioType::SpoofAndActuate.config(seed));
        assert!(summary.ruptured(), "seed {seed} did not rupture");
        assert_eq!(summary.alarm_count, 0, "seed {seed} alarmed");
    }
}

#[test]
fn test_rupture_cooldown_ends_run_early() {
    let config = ScenarioType::SpoofAndActuate
        .config(0)
        .noise_free()
        .with_rupture_cooldown(Some(5.0));
    let summary = run_checked(config);

    assert_eq!(summary.stop_reason, StopReason::RuptureCooldown);
    assert_eq!(summary.final_time_ns, secs(25.0));
}

// ============================================================================
// Scenario C: actuate only
// ============================================================================

#[test]
fn test_unblinded_monitor_trips_interlock() {
    let summary = run_checked(ScenarioType::ActuateOnly.config(0).noise_free());

    assert!(!summary.ruptured());
    assert_eq!(summary.alarm_count, 1);
    assert!(!summary.final_plant.pump_on());
    assert!(!summary.final_plant.valve_open());

    let alarm = summary.trace.alarms().next().unwrap();
    assert_eq!(alarm.time_ns, secs(17.0));
    assert_eq!(alarm.kind, EventKind::Alarm { reading: 1050.0 });

    // Venting starts on the tick after the alarm.
    let (_, next) = summary
        .trace
        .pressures()
        .find(|(t, _)| *t == secs(18.0))
        .unwrap();
    assert_eq!(next, 1000.0);
    assert_eq!(summary.final_plant.pressure(), 0.0);
}

#[test]
fn test_noisy_actuate_only_never_ruptures() {
    for seed in 0..10 {
        let summary = run_checked(ScenarioType::ActuateOnly.config(seed));
        assert!(!summary.ruptured(), "seed {seed} ruptured");
        assert!(summary.alarm_count >= 1, "seed {seed} never alarmed");
    }
}

#[test]
fn test_implausible_spoof_gives_itself_away() {
    let mut config = SimConfig::default().noise_free();
    config.spoofed_value = Some(1200.0);
    let summary = run_checked(config);

    // The spoofed value lands after control's tick at 10, so the alarm is at 11.
    let alarm = summary.trace.alarms().next().unwrap();
    assert_eq!(alarm.time_ns, secs(11.0));
    assert!(!summary.ruptured());
}
