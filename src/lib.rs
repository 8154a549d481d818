//! Mooring Monitor Library
//!
//! Stateful alert evaluation for mooring facility sensor streams: radar
//! ship distance per berth and tension per bollard hook. The library is
//! framework-agnostic; it consumes parsed snapshots and returns
//! classification reports, leaving transport and presentation to the caller.
//!
//! # Features
//!
//! - **History Store**: bounded per-instrument reading history
//! - **Trend Detection**: immediate trend and consecutive-run length
//! - **Threshold Classification**: band breaches with remediation percentages
//! - **Alert Aggregation**: breach over drift priority, ordered recommendations
//! - **Drift Debounce**: delayed first announcement driven by an explicit clock
//!
//! # Usage
//!
//! ```rust
//! use mooring_monitor::{parse_snapshot, EngineConfig, FacilityEngine};
//!
//! let payload = r#"{
//!     "location_name": "North Quay",
//!     "berths": [{
//!         "name": "B1",
//!         "ship": { "name": "Aurora" },
//!         "radars": [{ "name": "R1", "distanceStatus": "ACTIVE", "shipDistance": -1 }],
//!         "bollards": [{ "name": "BL1", "hooks": [
//!             { "name": "H1", "attachedLine": "Line 1", "tension": 3.0 }
//!         ]}]
//!     }]
//! }"#;
//!
//! let snapshot = parse_snapshot(payload).unwrap();
//! let mut engine = FacilityEngine::new(EngineConfig::default());
//! let report = engine.evaluate(&snapshot);
//!
//! assert_eq!(report.status_label(), "Issues Detected");
//! for line in &report.recommendations {
//!     println!("{}", line);
//! }
//! ```

pub mod alerts;
pub mod engine;
pub mod engine_config;
pub mod history;
pub mod ingest_stats;
pub mod model;
pub mod presence;
pub mod ringbuffer;
pub mod summary;
pub mod thresholds;
pub mod trend;

// Re-export main types for convenience
pub use alerts::{FacilityReport, FacilityStatus, Issue, Severity};
pub use engine::{BerthScope, FacilityEngine, HistoryView};
pub use engine_config::{ConfigError, EngineConfig};
pub use history::{HistoryStats, HistoryStore};
pub use model::{
    parse_snapshot, Berth, Bollard, EntityId, Hook, InstrumentKind, Radar, Snapshot,
    SnapshotError,
};
pub use presence::{AlertKey, PresenceState, PresenceTracker};
pub use summary::{BerthSummary, BollardLoad};
pub use thresholds::{classify, format_value, Remediation, ThresholdBand};
pub use trend::{consecutive_run, trend, ConsecutiveRun, Trend};
