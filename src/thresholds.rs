//! Threshold band classification and remediation arithmetic.
//!
//! Each instrument kind has one fixed `(low, high)` band. A reading outside
//! the band is a breach, and the remediation says by how many percent the
//! reading has to move to get back inside:
//!
//! - below `low`: increase by `(low - v) / |v| * 100`
//! - above `high`: decrease by `(v - high) / v * 100`
//!
//! Readings within [`NEAR_ZERO_EPSILON`] of zero cannot carry a meaningful
//! percentage. Below the band the remediation names the target value
//! instead; above the band it fails closed to [`MISSING_VALUE`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Magnitude below which a reading is treated as zero for percentage math.
pub const NEAR_ZERO_EPSILON: f64 = 0.001;

/// Placeholder rendered wherever a number is expected but unavailable.
pub const MISSING_VALUE: &str = "—";

/// Acceptable `(low, high)` range for one instrument kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub low: f64,
    pub high: f64,
}

impl ThresholdBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True if `value` lies strictly outside the band.
    pub fn breaches(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }

    /// True if the bounds are finite and ordered.
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }
}

impl fmt::Display for ThresholdBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

/// Which way a breaching reading has to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    Increase,
    Decrease,
}

impl Adjustment {
    pub fn verb(self) -> &'static str {
        match self {
            Adjustment::Increase => "increased",
            Adjustment::Decrease => "decreased",
        }
    }
}

/// How far a breaching reading has to move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum RemediationAmount {
    /// Relative change in percent.
    Percent(f64),
    /// Absolute target, used when the reading is too close to zero.
    Target(f64),
    /// No finite amount could be computed.
    Unknown,
}

/// Required correction for a reading outside its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Remediation {
    pub adjustment: Adjustment,
    pub amount: RemediationAmount,
}

impl Remediation {
    pub fn percent(&self) -> Option<f64> {
        match self.amount {
            RemediationAmount::Percent(p) => Some(p),
            _ => None,
        }
    }

    /// Remediation phrase, e.g. `increased by 33.33%` or `increased to -1`.
    pub fn phrase(&self) -> String {
        match self.amount {
            RemediationAmount::Percent(p) => {
                format!("{} by {}%", self.adjustment.verb(), format_value(Some(p)))
            }
            RemediationAmount::Target(target) => {
                format!("{} to {}", self.adjustment.verb(), target)
            }
            RemediationAmount::Unknown => {
                format!("{} by {}%", self.adjustment.verb(), format_value(None))
            }
        }
    }
}

fn finite_percent(percent: f64) -> RemediationAmount {
    if percent.is_finite() {
        RemediationAmount::Percent(percent)
    } else {
        RemediationAmount::Unknown
    }
}

/// Classifies a reading against a band.
///
/// Returns `None` when the reading is absent, non-finite, or inside the band.
pub fn classify(value: Option<f64>, band: &ThresholdBand) -> Option<Remediation> {
    let value = value.filter(|v| v.is_finite())?;

    if value < band.low {
        let amount = if value.abs() < NEAR_ZERO_EPSILON {
            RemediationAmount::Target(band.low)
        } else {
            finite_percent((band.low - value) / value.abs() * 100.0)
        };
        return Some(Remediation {
            adjustment: Adjustment::Increase,
            amount,
        });
    }

    if value > band.high {
        let amount = if value.abs() < NEAR_ZERO_EPSILON {
            RemediationAmount::Unknown
        } else {
            finite_percent((value - band.high) / value * 100.0)
        };
        return Some(Remediation {
            adjustment: Adjustment::Decrease,
            amount,
        });
    }

    None
}

/// Formats a number with two decimals, or [`MISSING_VALUE`] when absent.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => MISSING_VALUE.to_string(),
    }
}
