//! Trend direction and consecutive-run detection.
//!
//! Adjacent readings are compared newest to oldest and counting stops at the
//! first flat step or reversal. A single reversal resets the run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of change between two readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Flat,
}

impl Trend {
    /// Arrow shown next to the latest value; empty for flat.
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "",
        }
    }

    /// Past-tense verb used in drift messages.
    pub fn verb(self) -> &'static str {
        match self {
            Trend::Up => "increased",
            Trend::Down => "decreased",
            Trend::Flat => "unchanged",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Flat => write!(f, "flat"),
        }
    }
}

/// Compares `current` against `reference`.
///
/// Flat when the values are equal or either one is absent.
pub fn trend(current: Option<f64>, reference: Option<f64>) -> Trend {
    match (current, reference) {
        (Some(c), Some(r)) if c > r => Trend::Up,
        (Some(c), Some(r)) if c < r => Trend::Down,
        _ => Trend::Flat,
    }
}

/// Length and direction of the current unbroken directional run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsecutiveRun {
    pub direction: Trend,
    pub length: usize,
}

impl ConsecutiveRun {
    pub const NONE: ConsecutiveRun = ConsecutiveRun {
        direction: Trend::Flat,
        length: 0,
    };

    /// True when the run is directional and at least `threshold` long.
    pub fn reaches(&self, threshold: usize) -> bool {
        self.direction != Trend::Flat && self.length >= threshold
    }
}

/// Counts the adjacent transitions, newest first, that share one non-flat
/// direction. Buffers with fewer than two readings yield [`ConsecutiveRun::NONE`].
pub fn consecutive_run(buffer: &[f64]) -> ConsecutiveRun {
    let mut run = ConsecutiveRun::NONE;

    for pair in buffer.windows(2).rev() {
        let step = trend(Some(pair[1]), Some(pair[0]));
        if step == Trend::Flat {
            break;
        }

        if run.direction == Trend::Flat {
            run = ConsecutiveRun {
                direction: step,
                length: 1,
            };
        } else if run.direction == step {
            run.length += 1;
        } else {
            break;
        }
    }

    run
}

/// Trend of the newest reading for display next to the history.
///
/// Compares against the second-newest buffered reading, or against the
/// value seen before the latest update when the buffer holds only one.
pub fn display_trend(buffer: &[f64], previous: Option<f64>) -> Trend {
    let Some((&latest, rest)) = buffer.split_last() else {
        return Trend::Flat;
    };
    let reference = rest.last().copied().or(previous);
    trend(Some(latest), reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_basic() {
        assert_eq!(trend(Some(2.0), Some(1.0)), Trend::Up);
        assert_eq!(trend(Some(1.0), Some(2.0)), Trend::Down);
        assert_eq!(trend(Some(1.0), Some(1.0)), Trend::Flat);
    }

    #[test]
    fn test_trend_absent_operand_is_flat() {
        assert_eq!(trend(None, Some(1.0)), Trend::Flat);
        assert_eq!(trend(Some(1.0), None), Trend::Flat);
        assert_eq!(trend(None, None), Trend::Flat);
    }

    #[test]
    fn test_run_of_five_increases() {
        let run = consecutive_run(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(
            run,
            ConsecutiveRun {
                direction: Trend::Up,
                length: 5
            }
        );
        assert!(run.reaches(5));
    }

    #[test]
    fn test_reversal_stops_run() {
        let run = consecutive_run(&[1.0, 2.0, 3.0, 2.0, 3.0]);
        assert_eq!(
            run,
            ConsecutiveRun {
                direction: Trend::Up,
                length: 1
            }
        );
    }

    #[test]
    fn test_flat_step_stops_run() {
        let run = consecutive_run(&[5.0, 4.0, 4.0, 3.0, 2.0]);
        assert_eq!(
            run,
            ConsecutiveRun {
                direction: Trend::Down,
                length: 2
            }
        );

        let run = consecutive_run(&[1.0, 2.0, 3.0, 3.0]);
        assert_eq!(run, ConsecutiveRun::NONE);
    }

    #[test]
    fn test_short_buffers() {
        assert_eq!(consecutive_run(&[]), ConsecutiveRun::NONE);
        assert_eq!(consecutive_run(&[7.0]), ConsecutiveRun::NONE);
        assert!(!ConsecutiveRun::NONE.reaches(0));
    }

    #[test]
    fn test_display_trend_uses_previous_for_single_reading() {
        assert_eq!(display_trend(&[3.0], Some(2.0)), Trend::Up);
        assert_eq!(display_trend(&[3.0], None), Trend::Flat);
        assert_eq!(display_trend(&[4.0, 3.0], Some(10.0)), Trend::Down);
        assert_eq!(display_trend(&[], Some(1.0)), Trend::Flat);
    }
}
