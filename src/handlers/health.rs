//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that returns
//! ingest statistics and the current status of every location.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::{lock_engine, AppState, SharedState};

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = concat!("mooring-monitor ", env!("CARGO_PKG_VERSION"));

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");
    state.ingest_stats.record_http_request();

    let uptime_seconds = state.ingest_stats.get_uptime_seconds();
    let uptime_hours = uptime_seconds as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = state.ingest_stats.render_table();
    let locations = render_locations(&state);

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("OK\n\nUptime: {uptime_str}\n\n{table}\n{locations}\n{FOOTER_TEXT}"),
    )
}

/// Renders one line per location with its latest status.
fn render_locations(state: &AppState) -> String {
    let mut out = String::new();
    writeln!(out, "LOCATIONS").ok();
    writeln!(out, "=========").ok();
    writeln!(out).ok();
    writeln!(
        out,
        "{:24} | {:>8} | {:>7} | {:>8} | {:>8} | {}",
        "Location", "Cycles", "Issues", "Entities", "Pending", "Status"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(84)).ok();

    for location in state.locations() {
        let Some(engine) = state.engine(&location) else {
            continue;
        };
        let engine = lock_engine(&engine);
        let (issues, label) = engine
            .report()
            .map(|r| (r.issues.len(), r.status_label()))
            .unwrap_or((0, "No data"));
        writeln!(
            out,
            "{:24} | {:>8} | {:>7} | {:>8} | {:>8} | {}",
            location,
            engine.cycles(),
            issues,
            engine.history().len(),
            engine.presence().pending_count(),
            label
        )
        .ok();
    }
    out
}
