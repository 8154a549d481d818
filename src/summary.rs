//! Per-berth load summary.

use crate::model::{Berth, Snapshot};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollardLoad {
    pub name: String,
    pub total_tension: f64,
}

/// Aggregate figures for one berth in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BerthSummary {
    pub berth: String,
    pub ship_name: String,
    pub active_radars: usize,
    /// Mean ship distance over active radars with a reading.
    pub average_ship_distance: Option<f64>,
    pub bollard_loads: Vec<BollardLoad>,
    pub total_hooks: usize,
    pub hooks_in_use: usize,
    pub total_load: f64,
}

pub fn summarize_berth(berth: &Berth) -> BerthSummary {
    let active: Vec<_> = berth.radars.iter().filter(|r| r.is_active()).collect();
    let distances: Vec<f64> = active.iter().filter_map(|r| r.distance()).collect();
    let average_ship_distance = if distances.is_empty() {
        None
    } else {
        Some(distances.iter().sum::<f64>() / distances.len() as f64)
    };

    let bollard_loads: Vec<BollardLoad> = berth
        .bollards
        .iter()
        .map(|b| BollardLoad {
            name: b.name.clone(),
            total_tension: b.total_tension(),
        })
        .collect();

    let hooks = berth.bollards.iter().flat_map(|b| b.hooks.iter());
    let total_hooks = hooks.clone().count();
    let hooks_in_use = hooks.filter(|h| h.in_use()).count();

    BerthSummary {
        berth: berth.name.clone(),
        ship_name: berth.ship_name().to_string(),
        active_radars: active.len(),
        average_ship_distance,
        total_load: bollard_loads.iter().map(|l| l.total_tension).sum(),
        bollard_loads,
        total_hooks,
        hooks_in_use,
    }
}

/// Summaries for every berth, in snapshot order.
pub fn summarize(snapshot: &Snapshot) -> Vec<BerthSummary> {
    snapshot.berths.iter().map(summarize_berth).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bollard, Hook, Radar, NO_SHIP};

    #[test]
    fn test_summary_counts_only_active_radars() {
        let berth = Berth::new("B1")
            .with_ship("Aurora")
            .with_radar(Radar::active("R1", Some(4.0)))
            .with_radar(Radar::active("R2", Some(8.0)))
            .with_radar(Radar::new("R3", "INACTIVE", Some(100.0)))
            .with_bollard(
                Bollard::new("BL1")
                    .with_hook(Hook::new("H1", Some("L1"), Some(2.5)))
                    .with_hook(Hook::new("H2", None, Some(1.5)))
                    .with_hook(Hook::new("H3", Some("L3"), None)),
            );

        let summary = summarize_berth(&berth);
        assert_eq!(summary.ship_name, "Aurora");
        assert_eq!(summary.active_radars, 2);
        assert_eq!(summary.average_ship_distance, Some(6.0));
        assert_eq!(summary.bollard_loads[0].total_tension, 4.0);
        assert_eq!(summary.total_hooks, 3);
        assert_eq!(summary.hooks_in_use, 2);
        assert_eq!(summary.total_load, 4.0);
    }

    #[test]
    fn test_empty_berth_summary() {
        let summary = summarize_berth(&Berth::new("B2"));
        assert_eq!(summary.ship_name, NO_SHIP);
        assert_eq!(summary.average_ship_distance, None);
        assert!(summary.bollard_loads.is_empty());
        assert_eq!(summary.total_load, 0.0);
    }
}
