//! Snapshot ingest endpoint handler.
//!
//! `POST /data/all` receives one facility snapshot per request, in the same
//! envelope the stream relay pushes, and evaluates it with the engine of
//! the snapshot's location.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use mooring_monitor::{parse_snapshot, FacilityReport, SnapshotError};
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::state::{lock_engine, AppState, SharedState};

/// Reasons a payload is refused.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("empty payload")]
    Empty,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Parses and evaluates one payload against the shared state.
pub fn ingest_payload(state: &AppState, body: &str) -> Result<FacilityReport, IngestError> {
    if body.trim().is_empty() {
        return Err(IngestError::Empty);
    }
    let snapshot = parse_snapshot(body)?;

    let engine = state.engine_for(&snapshot.location_name);
    let start = Instant::now();
    let (report, tracked) = {
        let mut engine = lock_engine(&engine);
        let report = engine.evaluate(&snapshot);
        (report, engine.history().len())
    };
    let elapsed = start.elapsed();

    state.ingest_stats.record_snapshot(
        body.len(),
        report.evaluated_entities,
        report.issues.len(),
        elapsed.as_secs_f64() * 1000.0,
    );
    state
        .metrics
        .observe_report(&report, tracked, elapsed.as_secs_f64());

    if report.alert_just_triggered {
        state.ingest_stats.record_alert_triggered();
        info!(
            location = %report.location_name,
            recommendations = ?report.recommendations,
            "{}",
            report.status_label()
        );
    }

    Ok(report)
}

/// Handler for `POST /data/all`.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn ingest_handler(State(state): State<SharedState>, body: String) -> impl IntoResponse {
    debug!("Processing /data/all request");
    state.ingest_stats.record_http_request();

    match ingest_payload(&state, &body) {
        Ok(report) => (StatusCode::OK, Json(json!(report))),
        Err(e) => {
            warn!("Rejected snapshot payload: {}", e);
            state.ingest_stats.record_rejected();
            state.metrics.rejected_payloads_total.inc();
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}
