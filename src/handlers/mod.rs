//! HTTP endpoint handlers for the monitoring service.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/data/all`: Snapshot ingest
//! - `/locations`, `/status/{location}`: Alert reports
//! - `/history/{location}`: Reading history
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint

pub mod health;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod root;
pub mod status;

// Re-export handlers
pub use health::health_handler;
pub use history::history_handler;
pub use ingest::ingest_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;
pub use status::{locations_handler, status_handler};
