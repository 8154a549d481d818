//! Integration tests for the ingest statistics shown on /health.

use mooring_monitor::ingest_stats::IngestStats;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

#[test]
fn test_ingest_stats_initialize_empty() {
    let stats = IngestStats::new();

    assert_eq!(stats.snapshots_received.load(Ordering::Relaxed), 0);
    assert_eq!(stats.snapshots_rejected.load(Ordering::Relaxed), 0);
    assert_eq!(stats.acceptance_rate(), 100.0);
    assert_eq!(stats.get_last_snapshot_time_str(), "N/A");

    let eval = stats.evaluation_duration_ms.snapshot();
    assert_eq!(eval.count, 0);
    assert_eq!(eval.avg, 0.0);
}

#[test]
fn test_ingest_stats_track_snapshots() {
    let stats = IngestStats::new();
    stats.record_snapshot(2048, 10, 2, 0.5);
    stats.record_snapshot(1024, 6, 0, 1.5);
    stats.record_rejected();
    stats.record_alert_triggered();
    stats.record_drift_announcements(3);

    assert_eq!(stats.snapshots_received.load(Ordering::Relaxed), 2);
    assert!((stats.acceptance_rate() - 66.666).abs() < 0.01);

    let entities = stats.entities_per_snapshot.snapshot();
    assert_eq!(entities.last, 6.0);
    assert_eq!(entities.max, 10.0);
    assert_eq!(entities.min, 6.0);
    assert_eq!(entities.avg, 8.0);

    let payload = stats.payload_size_kb.snapshot();
    assert_eq!(payload.max, 2.0);
    assert_ne!(stats.get_last_snapshot_time_str(), "N/A");

    let table = stats.render_table();
    assert!(table.contains("snapshots_received"));
    assert!(table.contains("drift_announcements"));
}

#[test]
fn test_ingest_stats_concurrent_updates() {
    let stats = Arc::new(IngestStats::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..100 {
                    stats.record_snapshot(512, 4, 1, 0.1);
                    stats.record_http_request();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stats.snapshots_received.load(Ordering::Relaxed), 400);
    assert_eq!(stats.issues_per_snapshot.snapshot().count, 400);
    assert_eq!(stats.http_request_timestamps.count_last_minute(), 400);
}
