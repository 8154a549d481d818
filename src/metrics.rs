//! Prometheus metrics definitions for mooring-monitor.
//!
//! Metrics are labelled by location so every facility can be alerted on
//! independently.

use mooring_monitor::{FacilityReport, Severity};
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};

/// Collection of Prometheus metrics exported by the service.
#[derive(Clone)]
pub struct AlertMetrics {
    pub snapshots_total: CounterVec,         // labels: location
    pub rejected_payloads_total: Counter,
    pub issues: GaugeVec,                    // labels: location, severity
    pub has_any_issue: GaugeVec,             // labels: location
    pub tracked_entities: GaugeVec,          // labels: location
    pub drift_announcements_total: CounterVec, // labels: location
    pub evaluation_duration_seconds: Gauge,
}

impl AlertMetrics {
    /// Creates and registers all Prometheus metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, Box<dyn std::error::Error>> {
        let snapshots_total = CounterVec::new(
            Opts::new(
                "mooring_snapshots_total",
                "Facility snapshots evaluated",
            ),
            &["location"],
        )?;
        let rejected_payloads_total = Counter::new(
            "mooring_rejected_payloads_total",
            "Payloads rejected as empty or invalid JSON",
        )?;
        let issues = GaugeVec::new(
            Opts::new(
                "mooring_issues",
                "Issues raised by the latest evaluation",
            ),
            &["location", "severity"],
        )?;
        let has_any_issue = GaugeVec::new(
            Opts::new(
                "mooring_has_any_issue",
                "Whether the latest evaluation raised any issue (1) or not (0)",
            ),
            &["location"],
        )?;
        let tracked_entities = GaugeVec::new(
            Opts::new(
                "mooring_tracked_entities",
                "Radars and hooks with reading history",
            ),
            &["location"],
        )?;
        let drift_announcements_total = CounterVec::new(
            Opts::new(
                "mooring_drift_announcements_total",
                "Drift alerts announced after the debounce delay",
            ),
            &["location"],
        )?;
        let evaluation_duration_seconds = Gauge::new(
            "mooring_evaluation_duration_seconds",
            "Time spent evaluating the latest snapshot",
        )?;

        registry.register(Box::new(snapshots_total.clone()))?;
        registry.register(Box::new(rejected_payloads_total.clone()))?;
        registry.register(Box::new(issues.clone()))?;
        registry.register(Box::new(has_any_issue.clone()))?;
        registry.register(Box::new(tracked_entities.clone()))?;
        registry.register(Box::new(drift_announcements_total.clone()))?;
        registry.register(Box::new(evaluation_duration_seconds.clone()))?;

        Ok(Self {
            snapshots_total,
            rejected_payloads_total,
            issues,
            has_any_issue,
            tracked_entities,
            drift_announcements_total,
            evaluation_duration_seconds,
        })
    }

    /// Updates per-location series from one evaluation.
    pub fn observe_report(&self, report: &FacilityReport, tracked: usize, duration_secs: f64) {
        let location = report.location_name.as_str();
        self.snapshots_total.with_label_values(&[location]).inc();

        for severity in [Severity::Breach, Severity::Drift] {
            let count = report.issues.iter().filter(|i| i.severity == severity).count();
            let label = severity.to_string();
            self.issues
                .with_label_values(&[location, label.as_str()])
                .set(count as f64);
        }

        self.has_any_issue
            .with_label_values(&[location])
            .set(if report.has_any_issue { 1.0 } else { 0.0 });
        self.tracked_entities
            .with_label_values(&[location])
            .set(tracked as f64);
        self.evaluation_duration_seconds.set(duration_secs);
    }

    pub fn observe_announcements(&self, location: &str, count: usize) {
        self.drift_announcements_total
            .with_label_values(&[location])
            .inc_by(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_monitor::{Berth, EngineConfig, FacilityEngine, Radar, Snapshot};

    #[test]
    fn test_observe_report_sets_series() {
        let registry = Registry::new();
        let metrics = AlertMetrics::new(&registry).unwrap();

        let mut engine = FacilityEngine::new(EngineConfig::default());
        let snapshot = Snapshot::new("Port")
            .with_berth(Berth::new("B1").with_radar(Radar::active("R1", Some(20.0))));
        let report = engine.evaluate(&snapshot);
        metrics.observe_report(&report, engine.history().len(), 0.001);

        assert_eq!(metrics.snapshots_total.with_label_values(&["Port"]).get(), 1.0);
        assert_eq!(
            metrics.issues.with_label_values(&["Port", "breach"]).get(),
            1.0
        );
        assert_eq!(metrics.has_any_issue.with_label_values(&["Port"]).get(), 1.0);
        assert_eq!(metrics.tracked_entities.with_label_values(&["Port"]).get(), 1.0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        AlertMetrics::new(&registry).unwrap();
        assert!(AlertMetrics::new(&registry).is_err());
    }
}
