//! Scenario listing.

use scada_sim::ScenarioType;

use crate::style::{self, colors::SemanticStyle};

pub fn run() {
    let rows: Vec<Vec<String>> = ScenarioType::all()
        .iter()
        .map(|scenario| {
            let config = scenario.config(0);
            let attack = match config.attack_time {
                Some(t) if config.spoof_sensor => {
                    format!("spoof at {t}s, valve at {}s", t + config.pivot_delay)
                }
                Some(t) => format!("valve at {}s", t + config.pivot_delay),
                None => "none".to_string(),
            };
            vec![
                scenario.name().to_string(),
                attack,
                scenario.description().to_string(),
            ]
        })
        .collect();

    println!("{}", style::styled_table(&["Scenario", "Attack", "Description"], &rows));
    style::print_hint(&format!(
        "Run one with: {}",
        "scada-sim run --scenario <NAME>".code()
    ));
}
