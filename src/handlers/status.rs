//! Location and status endpoint handlers.
//!
//! - `/locations`: known location names
//! - `/status/{location}`: latest report, optionally narrowed with `?berth=`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::state::{lock_engine, SharedState};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub berth: Option<String>,
}

/// Handler for the /locations endpoint.
#[instrument(skip(state))]
pub async fn locations_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /locations request");
    state.ingest_stats.record_http_request();
    Json(state.locations())
}

/// Handler for the /status/{location} endpoint.
#[instrument(skip(state))]
pub async fn status_handler(
    State(state): State<SharedState>,
    Path(location): Path<String>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    debug!("Processing /status request");
    state.ingest_stats.record_http_request();
    state.ingest_stats.record_status_request();

    let report = state.engine(&location).and_then(|engine| {
        let engine = lock_engine(&engine);
        engine.report().cloned()
    });

    match report {
        Some(report) => {
            let report = match query.berth.as_deref() {
                Some(berth) => report.filtered_to_berth(berth),
                None => report,
            };
            (StatusCode::OK, Json(json!(report)))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no data for location '{}'", location) })),
        ),
    }
}
