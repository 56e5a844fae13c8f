//! Property-based tests over random seeds and attack timings.

use proptest::prelude::*;
use scada_sim::{
    AttackStage, EventKind, InvariantSuite, SimConfig, Simulation, StopReason, sec_to_ns,
};

fn attack_config() -> impl Strategy<Value = SimConfig> {
    (
        any::<u64>(),
        prop::option::of(0.0f64..70.0),
        0.0f64..8.0,
        any::<bool>(),
        0.5f64..2.0,
    )
        .prop_map(|(seed, attack_time, pivot_delay, spoof, tick)| {
            SimConfig::default()
                .with_seed(seed)
                .with_attack_time(attack_time)
                .with_pivot_delay(pivot_delay)
                .with_spoofing(spoof)
                .with_tick_interval(tick)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_standard_invariants_hold(config in attack_config()) {
        let simulation = Simulation::new(config).unwrap();
        let resolved = simulation.resolved().clone();
        let summary = simulation.run().unwrap();

        let violations = InvariantSuite::standard()
            .check_all(&summary.trace, &summary.run_context(&resolved));
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn prop_run_never_passes_horizon(config in attack_config()) {
        let horizon = sec_to_ns(config.simulation_horizon).unwrap();
        let summary = scada_sim::run(config).unwrap();

        prop_assert_eq!(summary.stop_reason, StopReason::Horizon);
        prop_assert_eq!(summary.final_time_ns, horizon);
        prop_assert!(summary.trace.events().iter().all(|e| e.time_ns < horizon));
        prop_assert!(summary.resumptions.windows(2).all(|w| w[0].resumed_ns <= w[1].resumed_ns));
    }

    #[test]
    fn prop_rupture_is_final(config in attack_config()) {
        let summary = scada_sim::run(config).unwrap();

        if let Some(rupture_ns) = summary.rupture_time_ns {
            prop_assert!(summary.final_plant.ruptured());
            let ruptures = summary
                .trace
                .events()
                .iter()
                .filter(|e| matches!(e.kind, EventKind::Rupture { .. }))
                .count();
            prop_assert_eq!(ruptures, 1);
            prop_assert!(summary
                .trace
                .alarms()
                .all(|alarm| alarm.time_ns <= rupture_ns));
        } else {
            prop_assert!(!summary.final_plant.ruptured());
        }
    }

    #[test]
    fn prop_spoofed_attack_never_alarms(seed in any::<u64>()) {
        let summary = scada_sim::run(SimConfig::default().with_seed(seed)).unwrap();
        prop_assert_eq!(summary.alarm_count, 0);
        prop_assert!(summary.ruptured());
    }

    #[test]
    fn prop_actuation_follows_spoofing_by_pivot(
        seed in any::<u64>(),
        attack in 1u32..30,
        pivot in 0u32..10,
    ) {
        let config = SimConfig::default()
            .with_seed(seed)
            .with_attack_time(Some(f64::from(attack)))
            .with_pivot_delay(f64::from(pivot));
        let summary = scada_sim::run(config).unwrap();

        let spoofing = summary.trace.attack_stage_time(AttackStage::Spoofing);
        let actuating = summary.trace.attack_stage_time(AttackStage::Actuating);
        prop_assert_eq!(spoofing, Some(sec_to_ns(f64::from(attack)).unwrap()));
        prop_assert_eq!(
            actuating,
            Some(sec_to_ns(f64::from(attack + pivot)).unwrap())
        );
    }
}
