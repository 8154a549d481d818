//! Replay command implementation.
//!
//! Feeds a recorded snapshot stream through fresh engines with a simulated
//! clock, so drift announcements fire exactly as they would have live.

use ahash::AHashMap;
use anyhow::Context;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cli::OutputFormat;
use crate::config::Config;
use mooring_monitor::{BerthScope, FacilityEngine, FacilityReport, Snapshot};

/// Result of replaying one stream.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub reports: Vec<FacilityReport>,
    pub rejected: usize,
}

impl ReplayOutcome {
    pub fn alerts_triggered(&self) -> usize {
        self.reports.iter().filter(|r| r.alert_just_triggered).count()
    }
}

/// Splits the input into raw snapshot values. A top-level array is one
/// stream, anything else is read as JSON lines.
fn split_stream(content: &str) -> (Vec<Value>, usize) {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
            return (items, 0);
        }
    }

    let mut values = Vec::new();
    let mut rejected = 0;
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => values.push(value),
            Err(e) => {
                warn!("Skipping line {}: {}", n + 1, e);
                rejected += 1;
            }
        }
    }
    (values, rejected)
}

/// Evaluates every snapshot in `content`, one engine per location.
///
/// Snapshot `i` is evaluated at `start + interval * i`. Snapshots whose
/// simulated time overflows are counted as rejected.
pub fn replay_stream(
    content: &str,
    config: &Config,
    scope: &BerthScope,
    interval: Duration,
    start: Instant,
) -> ReplayOutcome {
    let (values, mut rejected) = split_stream(content);
    let mut engines: AHashMap<String, FacilityEngine> = AHashMap::new();
    let mut reports = Vec::with_capacity(values.len());

    for (i, value) in values.into_iter().enumerate() {
        let snapshot = match Snapshot::from_value(value) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Skipping snapshot {}: {}", i, e);
                rejected += 1;
                continue;
            }
        };

        let offset = u32::try_from(i).ok().and_then(|n| interval.checked_mul(n));
        let Some(now) = offset.and_then(|d| start.checked_add(d)) else {
            warn!("Skipping snapshot {}: simulated time overflows", i);
            rejected += 1;
            continue;
        };
        let engine = engines
            .entry(snapshot.location_name.clone())
            .or_insert_with(|| FacilityEngine::with_scope(config.engine.clone(), scope.clone()));
        let report = engine.evaluate_at(&snapshot, now);
        debug!(
            "Replayed snapshot {} for {}: {} issues",
            i,
            report.location_name,
            report.issues.len()
        );
        reports.push(report);
    }

    ReplayOutcome { reports, rejected }
}

fn render_text(index: usize, report: &FacilityReport) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    writeln!(
        out,
        "#{:<4} {}: {} ({})",
        index,
        report.location_name,
        report.status_label(),
        report.status
    )
    .ok();
    if !report.berth_found {
        writeln!(out, "      berth not found in snapshot").ok();
    }
    if report.alert_just_triggered {
        writeln!(out, "      🚨 alert triggered").ok();
    }
    for issue in &report.issues {
        let marker = if issue.announced { "" } else { " (pending)" };
        writeln!(out, "      [{}] {}{}", issue.severity, issue.message, marker).ok();
    }
    out
}

/// Replays a recorded stream and prints each report.
pub fn command_replay(
    input: &Path,
    interval_ms: u64,
    berth: Option<String>,
    format: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("reading snapshot stream from {}", input.display()))?;

    let scope = match berth.as_deref() {
        Some(name) => BerthScope::berth(name),
        None => BerthScope::All,
    };
    info!(
        "Replaying {} with interval {} ms",
        input.display(),
        interval_ms
    );

    let outcome = replay_stream(
        &content,
        config,
        &scope,
        Duration::from_millis(interval_ms),
        Instant::now(),
    );

    for (i, report) in outcome.reports.iter().enumerate() {
        match format {
            OutputFormat::Text => print!("{}", render_text(i, report)),
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
            OutputFormat::Yaml => print!("---\n{}", serde_yaml::to_string(report)?),
        }
    }

    if matches!(format, OutputFormat::Text) {
        println!();
        println!(
            "✅ Replayed {} snapshots ({} rejected, {} alerts triggered)",
            outcome.reports.len(),
            outcome.rejected,
            outcome.alerts_triggered()
        );
    }

    Ok(())
}
