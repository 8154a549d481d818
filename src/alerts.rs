//! Issue model and per-cycle aggregation.
//!
//! Severity priority, highest first: breach (red), drift (orange), normal.
//! An entity contributes at most one issue per cycle and a breach always
//! wins over drift. Output order is radar breaches, hook breaches, radar
//! drifts, hook drifts, each group in snapshot order.

use crate::model::{EntityId, InstrumentKind};
use crate::presence::AlertKey;
use crate::summary::BerthSummary;
use crate::thresholds::{format_value, Adjustment, Remediation};
use crate::trend::{ConsecutiveRun, Trend};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const STATUS_ISSUES: &str = "Issues Detected";
pub const STATUS_NORMAL: &str = "All Systems Normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Drift,
    Breach,
}

impl Severity {
    pub fn color(self) -> &'static str {
        match self {
            Severity::Drift => "orange",
            Severity::Breach => "red",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Drift => write!(f, "drift"),
            Severity::Breach => write!(f, "breach"),
        }
    }
}

/// Overall status of a facility for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    #[default]
    Normal,
    Drift,
    Breach,
}

impl FacilityStatus {
    pub fn color(self) -> &'static str {
        match self {
            FacilityStatus::Normal => "green",
            FacilityStatus::Drift => Severity::Drift.color(),
            FacilityStatus::Breach => Severity::Breach.color(),
        }
    }

    /// Worst status among the given issues.
    pub fn from_issues(issues: &[Issue]) -> Self {
        issues
            .iter()
            .map(|i| FacilityStatus::from(i.severity))
            .max()
            .unwrap_or_default()
    }
}

impl From<Severity> for FacilityStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Drift => FacilityStatus::Drift,
            Severity::Breach => FacilityStatus::Breach,
        }
    }
}

impl fmt::Display for FacilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacilityStatus::Normal => write!(f, "normal"),
            FacilityStatus::Drift => write!(f, "drift"),
            FacilityStatus::Breach => write!(f, "breach"),
        }
    }
}

/// One anomaly raised for one entity in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub entity: EntityId,
    pub key: String,
    pub label: String,
    pub severity: Severity,
    /// For a breach the direction the reading must move, for drift the
    /// direction it has been moving.
    pub direction: Trend,
    pub magnitude_percent: Option<f64>,
    pub run_length: Option<usize>,
    pub value: Option<f64>,
    pub formatted_value: String,
    pub message: String,
    /// Breaches are always announced; drift only after the debounce delay.
    pub announced: bool,
}

impl Issue {
    pub fn breach(entity: &EntityId, label: &str, value: f64, remediation: &Remediation) -> Self {
        let direction = match remediation.adjustment {
            Adjustment::Increase => Trend::Up,
            Adjustment::Decrease => Trend::Down,
        };
        Self {
            key: entity.to_string(),
            message: format!("{} should be {}", entity.subject(), remediation.phrase()),
            entity: entity.clone(),
            label: label.to_string(),
            severity: Severity::Breach,
            direction,
            magnitude_percent: remediation.percent(),
            run_length: None,
            value: Some(value),
            formatted_value: format_value(Some(value)),
            announced: true,
        }
    }

    pub fn drift(entity: &EntityId, label: &str, value: Option<f64>, run: ConsecutiveRun) -> Self {
        Self {
            key: AlertKey::drift(entity).to_string(),
            message: format!(
                "{} {} {} consecutive times",
                entity.subject(),
                run.direction.verb(),
                run.length
            ),
            entity: entity.clone(),
            label: label.to_string(),
            severity: Severity::Drift,
            direction: run.direction,
            magnitude_percent: None,
            run_length: Some(run.length),
            value,
            formatted_value: format_value(value),
            announced: false,
        }
    }
}

/// Issue accumulator for one evaluation cycle.
#[derive(Debug, Default)]
pub struct CycleIssues {
    radar_breaches: Vec<Issue>,
    hook_breaches: Vec<Issue>,
    radar_drifts: Vec<Issue>,
    hook_drifts: Vec<Issue>,
}

impl CycleIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: Issue) {
        let group = match (issue.severity, issue.entity.kind) {
            (Severity::Breach, InstrumentKind::Radar) => &mut self.radar_breaches,
            (Severity::Breach, InstrumentKind::Hook) => &mut self.hook_breaches,
            (Severity::Drift, InstrumentKind::Radar) => &mut self.radar_drifts,
            (Severity::Drift, InstrumentKind::Hook) => &mut self.hook_drifts,
        };
        group.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.radar_breaches.is_empty()
            && self.hook_breaches.is_empty()
            && self.radar_drifts.is_empty()
            && self.hook_drifts.is_empty()
    }

    /// Issues in reporting order.
    pub fn into_ordered(self) -> Vec<Issue> {
        let mut issues = self.radar_breaches;
        issues.extend(self.hook_breaches);
        issues.extend(self.radar_drifts);
        issues.extend(self.hook_drifts);
        issues
    }
}

/// Breach messages in issue order. Drift never yields a recommendation.
pub fn recommendations(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Breach)
        .map(|i| i.message.clone())
        .collect()
}

/// Result of evaluating one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityReport {
    pub location_name: String,
    /// False when the view is scoped to a berth missing from the snapshot.
    pub berth_found: bool,
    pub ship_name: Option<String>,
    pub has_any_issue: bool,
    pub status: FacilityStatus,
    /// True only on the cycle where `has_any_issue` turned on.
    pub alert_just_triggered: bool,
    /// Berths whose own issue set turned non-empty this cycle.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggered_berths: Vec<String>,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
    pub berths: Vec<BerthSummary>,
    pub evaluated_entities: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl FacilityReport {
    pub fn empty(location_name: &str) -> Self {
        Self {
            location_name: location_name.to_string(),
            berth_found: true,
            ship_name: None,
            has_any_issue: false,
            status: FacilityStatus::Normal,
            alert_just_triggered: false,
            triggered_berths: Vec::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            berths: Vec::new(),
            evaluated_entities: 0,
            evaluated_at: Utc::now(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.has_any_issue {
            STATUS_ISSUES
        } else {
            STATUS_NORMAL
        }
    }

    pub fn breaches(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Breach)
    }

    pub fn drifts(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Drift)
    }

    /// Issues a display should show now: breaches and announced drift.
    pub fn visible_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.announced)
    }

    /// Narrows a facility-wide report to one berth.
    pub fn filtered_to_berth(&self, berth: &str) -> FacilityReport {
        let issues: Vec<Issue> = self
            .issues
            .iter()
            .filter(|i| i.entity.berth == berth)
            .cloned()
            .collect();
        let berths: Vec<BerthSummary> = self
            .berths
            .iter()
            .filter(|b| b.berth == berth)
            .cloned()
            .collect();
        let has_any_issue = !issues.is_empty();

        FacilityReport {
            location_name: self.location_name.clone(),
            berth_found: self.berth_found && !berths.is_empty(),
            ship_name: berths.last().map(|b| b.ship_name.clone()),
            has_any_issue,
            status: FacilityStatus::from_issues(&issues),
            alert_just_triggered: self.triggered_berths.iter().any(|b| b == berth),
            triggered_berths: self
                .triggered_berths
                .iter()
                .filter(|b| *b == berth)
                .cloned()
                .collect(),
            recommendations: recommendations(&issues),
            evaluated_entities: berths.iter().map(|b| b.active_radars + b.hooks_in_use).sum(),
            issues,
            berths,
            evaluated_at: self.evaluated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::{classify, ThresholdBand};

    fn breach(entity: &EntityId, value: f64, band: ThresholdBand) -> Issue {
        let remediation = classify(Some(value), &band).unwrap();
        Issue::breach(entity, &entity.instrument, value, &remediation)
    }

    #[test]
    fn test_breach_message() {
        let radar = EntityId::radar("Port", "B1", "R1");
        let issue = breach(&radar, 20.0, ThresholdBand::new(0.0, 15.0));
        assert_eq!(issue.message, "Distance at radar R1 should be decreased by 25.00%");
        assert_eq!(issue.direction, Trend::Down);
        assert!(issue.announced);

        let hook = EntityId::hook("Port", "B1", "BL1", "H1");
        let issue = breach(&hook, -1.5, ThresholdBand::new(-1.0, 7.0));
        assert_eq!(issue.message, "Tension on BL1's H1 should be increased by 33.33%");
    }

    #[test]
    fn test_drift_message() {
        let radar = EntityId::radar("Port", "B1", "R1");
        let run = ConsecutiveRun {
            direction: Trend::Down,
            length: 4,
        };
        let issue = Issue::drift(&radar, "R1", Some(3.0), run);
        assert_eq!(issue.message, "Distance at radar R1 decreased 4 consecutive times");
        assert_eq!(issue.key, "B1::RADAR::R1::consecutive");
        assert!(!issue.announced);
    }

    #[test]
    fn test_ordering_breaches_before_drift_radar_before_hook() {
        let band = ThresholdBand::new(0.0, 15.0);
        let r1 = EntityId::radar("Port", "B1", "R1");
        let r2 = EntityId::radar("Port", "B1", "R2");
        let h1 = EntityId::hook("Port", "B1", "BL1", "H1");
        let run = ConsecutiveRun {
            direction: Trend::Up,
            length: 5,
        };

        let mut cycle = CycleIssues::new();
        cycle.push(Issue::drift(&h1, "H1", Some(3.0), run));
        cycle.push(Issue::drift(&r1, "R1", Some(3.0), run));
        cycle.push(breach(&h1, 20.0, band));
        cycle.push(breach(&r2, 20.0, band));
        cycle.push(breach(&r1, 20.0, band));

        let keys: Vec<(Severity, String)> = cycle
            .into_ordered()
            .into_iter()
            .map(|i| (i.severity, i.entity.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (Severity::Breach, "B1::RADAR::R2".to_string()),
                (Severity::Breach, "B1::RADAR::R1".to_string()),
                (Severity::Breach, "B1::BOLLARD::BL1::HOOK::H1".to_string()),
                (Severity::Drift, "B1::RADAR::R1".to_string()),
                (Severity::Drift, "B1::BOLLARD::BL1::HOOK::H1".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_priority() {
        assert!(FacilityStatus::Breach > FacilityStatus::Drift);
        assert!(FacilityStatus::Drift > FacilityStatus::Normal);
        assert_eq!(FacilityStatus::from_issues(&[]), FacilityStatus::Normal);
        assert_eq!(FacilityStatus::Breach.color(), "red");
        assert_eq!(FacilityStatus::Drift.color(), "orange");
    }

    #[test]
    fn test_recommendations_only_from_breaches() {
        let r1 = EntityId::radar("Port", "B1", "R1");
        let run = ConsecutiveRun {
            direction: Trend::Up,
            length: 5,
        };
        let issues = vec![
            breach(&r1, -1.0, ThresholdBand::new(0.0, 15.0)),
            Issue::drift(&EntityId::radar("Port", "B1", "R2"), "R2", Some(3.0), run),
        ];
        assert_eq!(
            recommendations(&issues),
            vec!["Distance at radar R1 should be increased by 100.00%".to_string()]
        );
    }
}
