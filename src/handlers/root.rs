//! Root endpoint handler.
//!
//! Lists the available endpoints and the locations seen so far.

use axum::{extract::State, response::IntoResponse};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::handlers::health::FOOTER_TEXT;
use crate::state::SharedState;

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("POST", "/data/all", "Ingest one facility snapshot"),
    ("GET", "/locations", "Known location names"),
    ("GET", "/status/{location}", "Latest alert report (?berth= narrows to one berth)"),
    ("GET", "/history/{location}", "Reading history per radar and hook"),
    ("GET", "/health", "Ingest statistics"),
    ("GET", "/metrics", "Prometheus metrics"),
];

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");
    state.ingest_stats.record_http_request();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    let mut out = String::new();
    writeln!(out, "MOORING MONITOR").ok();
    writeln!(out, "===============").ok();
    writeln!(out).ok();
    writeln!(out, "Uptime: {}h {}m {}s", hours, minutes, seconds).ok();
    writeln!(out).ok();
    writeln!(out, "ENDPOINTS").ok();
    writeln!(out, "---------").ok();
    for (method, path, description) in ENDPOINTS {
        let disabled = (*path == "/health" && !state.config.enable_health.unwrap_or(true))
            || (*path == "/metrics" && !state.config.enable_metrics.unwrap_or(true));
        if disabled {
            continue;
        }
        writeln!(out, "{:5} {:22} {}", method, path, description).ok();
    }
    writeln!(out).ok();
    writeln!(out, "LOCATIONS").ok();
    writeln!(out, "---------").ok();
    let locations = state.locations();
    if locations.is_empty() {
        writeln!(out, "(none yet)").ok();
    }
    for location in locations {
        writeln!(out, "{}", location).ok();
    }
    writeln!(out).ok();
    writeln!(out, "{}", FOOTER_TEXT).ok();

    ([("Content-Type", "text/plain; charset=utf-8")], out)
}
