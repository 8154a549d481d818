//! Application state management for the monitoring service.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers and used by the background tick task.

use dashmap::DashMap;
use mooring_monitor::{EngineConfig, FacilityEngine};
use prometheus::Registry;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::config::Config;
use crate::metrics::AlertMetrics;
use mooring_monitor::ingest_stats::IngestStats;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// One engine per location. Evaluation is synchronous and short, so a
/// plain mutex serializes snapshots of the same facility.
pub type SharedEngine = Arc<Mutex<FacilityEngine>>;

/// Global application state shared across requests and background tasks.
pub struct AppState {
    pub registry: Registry,
    pub metrics: AlertMetrics,
    pub engines: DashMap<String, SharedEngine>,
    pub config: Arc<Config>,
    pub ingest_stats: Arc<IngestStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, registry: Registry, metrics: AlertMetrics) -> Self {
        Self {
            registry,
            metrics,
            engines: DashMap::new(),
            config: Arc::new(config),
            ingest_stats: Arc::new(IngestStats::new()),
            start_time: Instant::now(),
        }
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.config.engine
    }

    /// Returns the engine of a location, creating it on first sighting.
    pub fn engine_for(&self, location: &str) -> SharedEngine {
        self.engines
            .entry(location.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(FacilityEngine::new(self.config.engine.clone()))))
            .clone()
    }

    pub fn engine(&self, location: &str) -> Option<SharedEngine> {
        self.engines.get(location).map(|e| e.value().clone())
    }

    /// Known location names, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Fires due drift announcements on every engine and returns how many
    /// became announced.
    pub fn tick_engines(&self, now: Instant) -> usize {
        let engines: Vec<(String, SharedEngine)> = self
            .engines
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut total = 0;
        for (location, engine) in engines {
            let announced = lock_engine(&engine).tick(now).len();
            if announced > 0 {
                self.metrics.observe_announcements(&location, announced);
                self.ingest_stats
                    .record_drift_announcements(announced as u64);
                total += announced;
            }
        }
        total
    }
}

/// Locks an engine, recovering it if a previous holder panicked.
pub fn lock_engine(engine: &Mutex<FacilityEngine>) -> MutexGuard<'_, FacilityEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_monitor::{Berth, Radar, Snapshot};
    use std::time::Duration;

    fn test_state() -> AppState {
        let mut config = Config::default();
        config.engine.history_len = 6;
        config.engine.announce_delay_ms = 1000;
        let registry = Registry::new();
        let metrics = AlertMetrics::new(&registry).unwrap();
        AppState::new(config, registry, metrics)
    }

    fn radar_snapshot(distance: f64) -> Snapshot {
        Snapshot::new("Port A")
            .with_berth(Berth::new("B1").with_radar(Radar::active("R1", Some(distance))))
    }

    #[test]
    fn test_engine_for_creates_once() {
        let state = test_state();
        let a = state.engine_for("Port A");
        let b = state.engine_for("Port A");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(state.engine("Port B").is_none());
        state.engine_for("Anchorage");
        assert_eq!(state.locations(), vec!["Anchorage", "Port A"]);
    }

    #[test]
    fn test_tick_engines_fires_pending_drift() {
        let state = test_state();
        let engine = state.engine_for("Port A");
        let t0 = Instant::now();
        for i in 0..6u64 {
            let snapshot = radar_snapshot(i as f64 + 1.0);
            lock_engine(&engine).evaluate_at(&snapshot, t0 + Duration::from_secs(i));
        }

        assert_eq!(state.tick_engines(t0 + Duration::from_millis(5500)), 0);
        assert_eq!(state.tick_engines(t0 + Duration::from_secs(6)), 1);
        assert_eq!(
            state
                .ingest_stats
                .drift_announcements
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );

        let report = lock_engine(&engine).report().cloned().unwrap();
        assert!(report.issues.iter().all(|i| i.announced));
    }
}
