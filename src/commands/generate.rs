//! Generate testdata command implementation.
//!
//! Writes a synthetic snapshot stream as JSON lines. Each berth carries a
//! radar that drifts outward until it breaches, a noisy radar, an inactive
//! radar, and hooks with occasional tension spikes.

use anyhow::Context;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use mooring_monitor::{Berth, Bollard, Hook, Radar, Snapshot};

pub const TESTDATA_LOCATION: &str = "Test Terminal";

// Drifting radar: starts here and moves outward every snapshot.
const DRIFT_START_M: f64 = 4.0;
const DRIFT_STEP_M: f64 = 0.6;
const DRIFT_CYCLE: usize = 20;

const NOISY_RADAR_BASE_M: f64 = 6.0;
const NOISY_RADAR_SPREAD_M: f64 = 1.5;

const HOOK_TENSION_MIN: f64 = 1.5;
const HOOK_TENSION_MAX: f64 = 5.5;
const HOOK_SPIKE_PROBABILITY: f64 = 0.05;
const HOOK_SPIKE_MIN: f64 = 7.5;
const HOOK_SPIKE_MAX: f64 = 9.5;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn generate_berth(rng: &mut StdRng, berth_no: usize, index: usize) -> Berth {
    let drift = DRIFT_START_M + DRIFT_STEP_M * (index % DRIFT_CYCLE) as f64;
    let noisy = NOISY_RADAR_BASE_M + rng.gen_range(-NOISY_RADAR_SPREAD_M..NOISY_RADAR_SPREAD_M);

    let mut berth = Berth::new(&format!("Berth {}", berth_no))
        .with_ship(&format!("MV Test {}", berth_no))
        .with_radar(Radar::active("R1", Some(round2(drift))))
        .with_radar(Radar::active("R2", Some(round2(noisy))))
        .with_radar(Radar::new("R3", "INACTIVE", None));

    for bollard_no in 1..=2 {
        let mut bollard = Bollard::new(&format!("BL{}", bollard_no));
        for hook_no in 1..=3 {
            let name = format!("H{}", hook_no);
            // Last hook of the second bollard has no line attached.
            if bollard_no == 2 && hook_no == 3 {
                bollard = bollard.with_hook(Hook::new(&name, None, None));
                continue;
            }
            let tension = if rng.gen_bool(HOOK_SPIKE_PROBABILITY) {
                rng.gen_range(HOOK_SPIKE_MIN..HOOK_SPIKE_MAX)
            } else {
                rng.gen_range(HOOK_TENSION_MIN..HOOK_TENSION_MAX)
            };
            let line = format!("L{}{}", bollard_no, hook_no);
            bollard = bollard.with_hook(Hook::new(&name, Some(&line), Some(round2(tension))));
        }
        berth = berth.with_bollard(bollard);
    }

    berth
}

/// Builds `count` snapshots with `berths` berths each.
pub fn generate_snapshots(count: usize, berths: usize, seed: Option<u64>) -> Vec<Snapshot> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..count)
        .map(|index| {
            let mut snapshot = Snapshot::new(TESTDATA_LOCATION);
            for berth_no in 1..=berths {
                snapshot = snapshot.with_berth(generate_berth(&mut rng, berth_no, index));
            }
            snapshot
        })
        .collect()
}

/// Generates a synthetic snapshot stream and writes it as JSON lines.
pub fn command_generate_testdata(
    output: &Path,
    snapshots: usize,
    berths: usize,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Generating {} snapshots with {} berths (seed: {:?})",
        snapshots, berths, seed
    );

    let stream = generate_snapshots(snapshots, berths, seed);
    let mut content = String::new();
    for snapshot in &stream {
        content.push_str(&serde_json::to_string(snapshot)?);
        content.push('\n');
    }
    debug!("Serialized {} bytes", content.len());

    fs::write(output, content)
        .with_context(|| format!("writing test data to {}", output.display()))?;

    println!("✅ Test data written to: {}", output.display());
    println!("   Snapshots: {}", snapshots);
    println!("   Berths per snapshot: {}", berths);
    println!("   Generated at: {}", Utc::now().to_rfc3339());
    println!(
        "\n   Replay with: mooring-monitor replay --input {}",
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_monitor::parse_snapshot;

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_snapshots(5, 2, Some(42));
        let b = generate_snapshots(5, 2, Some(42));
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert_eq!(a[0].berths.len(), 2);
    }

    #[test]
    fn test_written_lines_parse_as_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testdata.jsonl");
        command_generate_testdata(&path, 3, 1, Some(7)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let snapshots: Vec<Snapshot> = content
            .lines()
            .map(|line| parse_snapshot(line).unwrap())
            .collect();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].location_name, TESTDATA_LOCATION);

        let berth = &snapshots[2].berths[0];
        assert_eq!(berth.radars[0].distance(), Some(5.2));
        assert!(!berth.radars[2].is_active());
        assert!(!berth.bollards[1].hooks[2].in_use());
    }

    #[test]
    fn test_drifting_radar_eventually_breaches() {
        let stream = generate_snapshots(DRIFT_CYCLE, 1, Some(1));
        let last = stream[DRIFT_CYCLE - 1].berths[0].radars[0].distance().unwrap();
        assert!(last > 15.0);
    }
}
