//! Ingest statistics for the monitoring service.
//!
//! Tracks snapshot throughput, evaluation cost, alert activity and HTTP
//! usage, and renders them as the plain-text `/health` table.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

const REQUEST_WINDOW: Duration = Duration::from_secs(600);

/// Running statistics for a single measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = RunningStat {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Snapshot of a [`Stat`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatSnapshot {
    pub last: f64,
    pub avg: f64,
    pub max: f64,
    pub min: f64,
    pub count: u64,
}

/// Thread-safe wrapper for running statistics.
#[derive(Debug, Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    pub fn snapshot(&self) -> StatSnapshot {
        match self.inner.lock() {
            Ok(s) => StatSnapshot {
                last: s.last,
                avg: s.avg(),
                max: s.max,
                min: s.min,
                count: s.count,
            },
            Err(_) => StatSnapshot::default(),
        }
    }
}

/// Timestamps of recent HTTP requests, bounded to a ten minute window.
#[derive(Debug)]
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > REQUEST_WINDOW)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        match self.inner.lock() {
            Ok(guard) => guard
                .iter()
                .filter(|t| t.elapsed() <= Duration::from_secs(60))
                .count() as u64,
            Err(_) => 0,
        }
    }
}

/// Service-wide ingest statistics.
#[derive(Debug)]
pub struct IngestStats {
    pub snapshots_received: AtomicU64,
    pub snapshots_rejected: AtomicU64,
    pub alerts_triggered: AtomicU64,
    pub drift_announcements: AtomicU64,
    pub status_requests: AtomicU64,
    pub metrics_endpoint_calls: AtomicU64,

    pub evaluation_duration_ms: Stat,
    pub payload_size_kb: Stat,
    pub entities_per_snapshot: Stat,
    pub issues_per_snapshot: Stat,

    pub http_request_timestamps: RequestTimestamps,

    pub start_time: Instant,
    pub last_snapshot_time: RwLock<Option<chrono::DateTime<chrono::Utc>>>,
}

impl Default for IngestStats {
    fn default() -> Self {
        Self {
            snapshots_received: AtomicU64::new(0),
            snapshots_rejected: AtomicU64::new(0),
            alerts_triggered: AtomicU64::new(0),
            drift_announcements: AtomicU64::new(0),
            status_requests: AtomicU64::new(0),
            metrics_endpoint_calls: AtomicU64::new(0),
            evaluation_duration_ms: Stat::default(),
            payload_size_kb: Stat::default(),
            entities_per_snapshot: Stat::default(),
            issues_per_snapshot: Stat::default(),
            http_request_timestamps: RequestTimestamps::default(),
            start_time: Instant::now(),
            last_snapshot_time: RwLock::new(None),
        }
    }
}

impl IngestStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one evaluated snapshot.
    pub fn record_snapshot(
        &self,
        payload_bytes: usize,
        entities: usize,
        issues: usize,
        evaluation_ms: f64,
    ) {
        self.snapshots_received.fetch_add(1, Ordering::Relaxed);
        self.payload_size_kb.add_sample(payload_bytes as f64 / 1024.0);
        self.entities_per_snapshot.add_sample(entities as f64);
        self.issues_per_snapshot.add_sample(issues as f64);
        self.evaluation_duration_ms.add_sample(evaluation_ms);
        if let Ok(mut guard) = self.last_snapshot_time.write() {
            *guard = Some(chrono::Utc::now());
        }
    }

    pub fn record_rejected(&self) {
        self.snapshots_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_triggered(&self) {
        self.alerts_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drift_announcements(&self, count: u64) {
        self.drift_announcements.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_status_request(&self) {
        self.status_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of payloads that were accepted, in percent.
    pub fn acceptance_rate(&self) -> f64 {
        let ok = self.snapshots_received.load(Ordering::Relaxed);
        let rejected = self.snapshots_rejected.load(Ordering::Relaxed);
        let total = ok + rejected;
        if total == 0 {
            100.0
        } else {
            ok as f64 / total as f64 * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn get_last_snapshot_time_str(&self) -> String {
        match self.last_snapshot_time.read() {
            Ok(guard) => guard
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            Err(_) => "N/A".to_string(),
        }
    }

    pub fn render_table(&self) -> String {
        let left = 28usize;
        let col = 12usize;
        let mut out = String::new();

        let stat_row = |out: &mut String, name: &str, s: StatSnapshot, precision: usize| {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                name,
                format!("{:.*}", precision, s.last),
                format!("{:.*}", precision, s.avg),
                format!("{:.*}", precision, s.max),
                format!("{:.*}", precision, s.min),
            )
            .ok();
        };
        let value_row = |out: &mut String, name: &str, value: String| {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                name, value, "N/A", "N/A", "N/A",
            )
            .ok();
        };

        writeln!(out, "HEALTH ENDPOINT - INGEST STATS").ok();
        writeln!(out, "==============================").ok();
        writeln!(out).ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "", "current", "average", "max", "min",
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "SNAPSHOTS").ok();
        writeln!(out, "---------").ok();
        value_row(
            &mut out,
            "snapshots_received",
            self.snapshots_received.load(Ordering::Relaxed).to_string(),
        );
        value_row(
            &mut out,
            "snapshots_rejected",
            self.snapshots_rejected.load(Ordering::Relaxed).to_string(),
        );
        value_row(
            &mut out,
            "acceptance_rate (%)",
            format!("{:.1}", self.acceptance_rate()),
        );
        stat_row(&mut out, "payload_size (KB)", self.payload_size_kb.snapshot(), 2);
        stat_row(&mut out, "entities_per_snapshot", self.entities_per_snapshot.snapshot(), 0);
        value_row(&mut out, "last_snapshot", self.get_last_snapshot_time_str());

        writeln!(out).ok();
        writeln!(out, "EVALUATION").ok();
        writeln!(out, "----------").ok();
        stat_row(
            &mut out,
            "evaluation_duration (ms)",
            self.evaluation_duration_ms.snapshot(),
            3,
        );
        stat_row(&mut out, "issues_per_snapshot", self.issues_per_snapshot.snapshot(), 1);
        value_row(
            &mut out,
            "alerts_triggered",
            self.alerts_triggered.load(Ordering::Relaxed).to_string(),
        );
        value_row(
            &mut out,
            "drift_announcements",
            self.drift_announcements.load(Ordering::Relaxed).to_string(),
        );

        writeln!(out).ok();
        writeln!(out, "HTTP SERVER").ok();
        writeln!(out, "-----------").ok();
        value_row(
            &mut out,
            "http_requests_last_minute",
            self.http_request_timestamps.count_last_minute().to_string(),
        );
        value_row(
            &mut out,
            "status_requests",
            self.status_requests.load(Ordering::Relaxed).to_string(),
        );
        value_row(
            &mut out,
            "metrics_endpoint_calls",
            self.metrics_endpoint_calls.load(Ordering::Relaxed).to_string(),
        );

        writeln!(out).ok();
        writeln!(out, "uptime: {}s", self.get_uptime_seconds()).ok();

        out
    }
}
