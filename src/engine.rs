//! Facility evaluation engine.
//!
//! One [`FacilityEngine`] owns all evaluation state of one monitored view:
//! the history store, the drift presence tracker and the edge detector for
//! `has_any_issue`. Snapshots are evaluated one at a time to completion;
//! callers that share an engine across tasks wrap it in a single mutex.
//!
//! # Usage
//!
//! ```rust
//! use mooring_monitor::{Berth, EngineConfig, FacilityEngine, Radar, Snapshot};
//!
//! let mut engine = FacilityEngine::new(EngineConfig::default());
//! let snapshot = Snapshot::new("North Quay")
//!     .with_berth(Berth::new("B1").with_radar(Radar::active("R1", Some(20.0))));
//!
//! let report = engine.evaluate(&snapshot);
//! assert!(report.has_any_issue);
//! assert_eq!(
//!     report.recommendations,
//!     vec!["Distance at radar R1 should be decreased by 25.00%".to_string()]
//! );
//! ```

use crate::alerts::{recommendations, CycleIssues, FacilityReport, FacilityStatus, Issue, Severity};
use crate::engine_config::EngineConfig;
use crate::history::HistoryStore;
use crate::model::{Berth, EntityId, InstrumentKind, Snapshot};
use crate::presence::{AlertKey, PresenceState, PresenceTracker};
use crate::summary::{summarize, summarize_berth};
use crate::thresholds::{classify, format_value};
use crate::trend::{consecutive_run, display_trend, ConsecutiveRun, Trend};
use ahash::AHashSet;
use chrono::Utc;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Which berths a view evaluates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BerthScope {
    #[default]
    All,
    Only(String),
}

impl BerthScope {
    pub fn berth(name: &str) -> Self {
        BerthScope::Only(name.to_string())
    }
}

/// Chart-ready history of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub entity: EntityId,
    pub key: String,
    pub subject: String,
    /// Buffered readings, newest first.
    pub values: Vec<f64>,
    pub formatted: Vec<String>,
    /// Reading stored before the latest one.
    pub previous_value: Option<f64>,
    pub trend: Trend,
    pub arrow: &'static str,
    /// Latest reading differs from the previous one.
    pub is_new: bool,
    pub run: ConsecutiveRun,
    pub capacity: usize,
}

/// Stateful alert engine for one facility view.
#[derive(Debug, Clone)]
pub struct FacilityEngine {
    config: EngineConfig,
    scope: BerthScope,
    history: HistoryStore,
    presence: PresenceTracker,
    previous_has_issues: bool,
    /// Berths that had issues in the previous cycle.
    berths_with_issues: AHashSet<String>,
    last_report: Option<FacilityReport>,
    cycles: u64,
}

impl FacilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_scope(config, BerthScope::All)
    }

    pub fn with_scope(config: EngineConfig, scope: BerthScope) -> Self {
        Self {
            history: HistoryStore::new(config.history_len),
            presence: PresenceTracker::new(config.announce_delay()),
            config,
            scope,
            previous_has_issues: false,
            berths_with_issues: AHashSet::new(),
            last_report: None,
            cycles: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scope(&self) -> &BerthScope {
        &self.scope
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Number of snapshots evaluated so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Latest report, with drift announcements fired since evaluation applied.
    pub fn report(&self) -> Option<&FacilityReport> {
        self.last_report.as_ref()
    }

    /// Evaluates a snapshot against the wall clock.
    pub fn evaluate(&mut self, snapshot: &Snapshot) -> FacilityReport {
        self.evaluate_at(snapshot, Instant::now())
    }

    /// Evaluates a snapshot at `now`.
    ///
    /// Pending drift announcements due by `now` fire before the snapshot is
    /// processed.
    pub fn evaluate_at(&mut self, snapshot: &Snapshot, now: Instant) -> FacilityReport {
        self.tick(now);
        self.presence.begin_cycle();
        self.cycles += 1;

        let berths: Vec<&Berth> = match &self.scope {
            BerthScope::All => snapshot.berths.iter().collect(),
            BerthScope::Only(name) => snapshot.berth(name).into_iter().collect(),
        };

        let berth_found = !matches!(self.scope, BerthScope::Only(_)) || !berths.is_empty();
        if !berth_found {
            debug!(
                location = %snapshot.location_name,
                scope = ?self.scope,
                "Scoped berth not present in snapshot"
            );
        }

        let mut cycle = CycleIssues::new();
        let mut evaluated = 0usize;

        for berth in &berths {
            for radar in berth.radars.iter().filter(|r| r.is_active()) {
                let entity = EntityId::radar(&snapshot.location_name, &berth.name, &radar.name);
                self.evaluate_entity(&entity, &radar.name, radar.distance(), &mut cycle, now);
                evaluated += 1;
            }
            for bollard in &berth.bollards {
                for hook in bollard.hooks.iter().filter(|h| h.in_use()) {
                    let entity = EntityId::hook(
                        &snapshot.location_name,
                        &berth.name,
                        &bollard.name,
                        &hook.name,
                    );
                    self.evaluate_entity(&entity, &hook.label(), hook.tension(), &mut cycle, now);
                    evaluated += 1;
                }
            }
        }

        for kind in InstrumentKind::ALL {
            for entity in self.presence.prune_unknown_of(kind) {
                debug!(alert = %AlertKey::drift(&entity), "Drift alert cleared");
            }
        }

        let issues = cycle.into_ordered();
        let has_any_issue = !issues.is_empty();
        let alert_just_triggered = has_any_issue && !self.previous_has_issues;
        self.previous_has_issues = has_any_issue;

        // Berths missing from this cycle start over, like the facility edge.
        let current: AHashSet<String> = issues.iter().map(|i| i.entity.berth.clone()).collect();
        let mut triggered_berths: Vec<String> = current
            .difference(&self.berths_with_issues)
            .cloned()
            .collect();
        triggered_berths.sort();
        self.berths_with_issues = current;

        if alert_just_triggered {
            info!(
                location = %snapshot.location_name,
                issues = issues.len(),
                "Facility alert triggered"
            );
        }

        let (ship_name, summaries) = match &self.scope {
            BerthScope::All => (None, summarize(snapshot)),
            BerthScope::Only(_) => (
                berths.first().map(|b| b.ship_name().to_string()),
                berths.iter().map(|b| summarize_berth(b)).collect(),
            ),
        };

        let report = FacilityReport {
            location_name: snapshot.location_name.clone(),
            berth_found,
            ship_name,
            has_any_issue,
            status: FacilityStatus::from_issues(&issues),
            alert_just_triggered,
            triggered_berths,
            recommendations: recommendations(&issues),
            issues,
            berths: summaries,
            evaluated_entities: evaluated,
            evaluated_at: Utc::now(),
        };

        self.last_report = Some(report.clone());
        report
    }

    fn evaluate_entity(
        &mut self,
        entity: &EntityId,
        label: &str,
        value: Option<f64>,
        cycle: &mut CycleIssues,
        now: Instant,
    ) {
        self.presence.note_present(entity);

        let previous = self.history.last_seen_value(entity);
        self.history.record(entity, value);
        let run = consecutive_run(&self.history.history(entity));
        let band = self.config.band_for(entity.kind);

        if let (Some(value), Some(remediation)) = (value, classify(value, band)) {
            debug!(
                entity = %entity,
                value,
                previous = ?previous,
                band = %band,
                "Threshold breached"
            );
            cycle.push(Issue::breach(entity, label, value, &remediation));
            return;
        }

        if run.reaches(self.config.consecutive_threshold) {
            let state = self.presence.observe(entity, now);
            let mut issue = Issue::drift(entity, label, value, run);
            issue.announced = state == PresenceState::Announced;
            debug!(
                entity = %entity,
                direction = %run.direction,
                length = run.length,
                state = ?state,
                "Sustained drift"
            );
            cycle.push(issue);
        }
    }

    /// Fires pending drift announcements due by `now` and returns the
    /// entities that became announced.
    pub fn tick(&mut self, now: Instant) -> Vec<EntityId> {
        let announced = self.presence.tick(now);
        if announced.is_empty() {
            return announced;
        }

        for entity in &announced {
            info!(alert = %AlertKey::drift(entity), "Drift alert announced");
        }

        if let Some(report) = self.last_report.as_mut() {
            for issue in report
                .issues
                .iter_mut()
                .filter(|i| i.severity == Severity::Drift)
            {
                if announced.contains(&issue.entity) {
                    issue.announced = true;
                }
            }
        }

        announced
    }

    /// History view of one entity, or `None` if it was never recorded.
    pub fn history_view(&self, entity: &EntityId) -> Option<HistoryView> {
        let buffer = self.history.buffer(entity)?;
        let oldest_first = buffer.get_history();
        let previous_value = self.history.value_before_latest(entity);
        let latest = buffer.latest();
        let trend = display_trend(&oldest_first, previous_value);

        let values: Vec<f64> = oldest_first.iter().rev().copied().collect();
        let formatted = values.iter().map(|v| format_value(Some(*v))).collect();

        Some(HistoryView {
            entity: entity.clone(),
            key: entity.to_string(),
            subject: entity.subject(),
            formatted,
            previous_value,
            trend,
            arrow: trend.arrow(),
            is_new: latest.is_some() && latest != previous_value,
            run: consecutive_run(&oldest_first),
            capacity: buffer.capacity(),
            values,
        })
    }

    /// History views of every tracked entity in a stable order.
    pub fn history_views(&self) -> Vec<HistoryView> {
        self.history
            .entities()
            .iter()
            .filter_map(|e| self.history_view(e))
            .collect()
    }

    /// Drops all state, as at the start of a new session.
    pub fn reset(&mut self) {
        self.history.clear();
        self.presence.clear();
        self.previous_has_issues = false;
        self.berths_with_issues.clear();
        self.last_report = None;
        self.cycles = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bollard, Hook, Radar};

    fn snapshot(distance: f64) -> Snapshot {
        Snapshot::new("Port").with_berth(
            Berth::new("B1")
                .with_ship("Aurora")
                .with_radar(Radar::active("R1", Some(distance))),
        )
    }

    #[test]
    fn test_inactive_radar_is_skipped() {
        let mut engine = FacilityEngine::new(EngineConfig::default());
        let snap = Snapshot::new("Port")
            .with_berth(Berth::new("B1").with_radar(Radar::new("R1", "OFF", Some(99.0))));
        let report = engine.evaluate(&snap);
        assert!(!report.has_any_issue);
        assert_eq!(report.evaluated_entities, 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_edge_detection() {
        let mut engine = FacilityEngine::new(EngineConfig::default());
        let t0 = Instant::now();
        assert!(engine.evaluate_at(&snapshot(20.0), t0).alert_just_triggered);
        assert!(!engine.evaluate_at(&snapshot(21.0), t0).alert_just_triggered);
        assert!(!engine.evaluate_at(&snapshot(5.0), t0).has_any_issue);
        assert!(engine.evaluate_at(&snapshot(-3.0), t0).alert_just_triggered);
    }

    #[test]
    fn test_scoped_berth_missing() {
        let mut engine =
            FacilityEngine::with_scope(EngineConfig::default(), BerthScope::berth("B9"));
        let report = engine.evaluate(&snapshot(20.0));
        assert!(!report.berth_found);
        assert!(!report.has_any_issue);
        assert_eq!(report.ship_name, None);
    }

    #[test]
    fn test_scoped_berth_ship_name() {
        let mut engine =
            FacilityEngine::with_scope(EngineConfig::default(), BerthScope::berth("B1"));
        let report = engine.evaluate(&snapshot(5.0));
        assert!(report.berth_found);
        assert_eq!(report.ship_name.as_deref(), Some("Aurora"));
        assert_eq!(report.status_label(), "All Systems Normal");
    }

    #[test]
    fn test_history_view_newest_first() {
        let mut engine = FacilityEngine::new(EngineConfig::default());
        let t0 = Instant::now();
        for d in [3.0, 4.0, 2.0] {
            engine.evaluate_at(&snapshot(d), t0);
        }
        let entity = EntityId::radar("Port", "B1", "R1");
        let view = engine.history_view(&entity).unwrap();
        assert_eq!(view.values, vec![2.0, 4.0, 3.0]);
        assert_eq!(view.previous_value, Some(4.0));
        assert_eq!(view.trend, Trend::Down);
        assert!(view.is_new);
        assert_eq!(view.formatted[0], "2.00");
    }

    #[test]
    fn test_hook_label_in_issue() {
        let mut engine = FacilityEngine::new(EngineConfig::default());
        let snap = Snapshot::new("Port").with_berth(
            Berth::new("B1").with_bollard(
                Bollard::new("BL1").with_hook(Hook::new("H1", Some("Line 2"), Some(9.0))),
            ),
        );
        let report = engine.evaluate(&snap);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].label, "H1 (Line 2)");
        assert_eq!(report.status, FacilityStatus::Breach);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut engine = FacilityEngine::new(EngineConfig::default());
        engine.evaluate(&snapshot(20.0));
        engine.reset();
        assert!(engine.history().is_empty());
        assert!(engine.report().is_none());
        assert_eq!(engine.cycles(), 0);
        assert!(engine.evaluate(&snapshot(20.0)).alert_just_triggered);
    }
}
