//! History endpoint handler.
//!
//! Serves the buffered readings of every radar and hook of one location
//! for charting, newest first.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{debug, instrument};

use crate::state::{lock_engine, SharedState};

/// Handler for the /history/{location} endpoint.
#[instrument(skip(state))]
pub async fn history_handler(
    State(state): State<SharedState>,
    Path(location): Path<String>,
) -> impl IntoResponse {
    debug!("Processing /history request");
    state.ingest_stats.record_http_request();

    let Some(engine) = state.engine(&location) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("no data for location '{}'", location) })),
        );
    };

    let views = lock_engine(&engine).history_views();
    (StatusCode::OK, Json(json!(views)))
}
