//! Configuration types for the alert engine.
//!
//! One [`EngineConfig`] parameterizes every evaluating view of a facility.
//! Views that share a facility must share the config, otherwise they can
//! disagree on whether an issue exists.

use crate::model::InstrumentKind;
use crate::thresholds::ThresholdBand;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_HISTORY_LEN: usize = 5;
pub const DEFAULT_CONSECUTIVE_THRESHOLD: usize = 5;
pub const DEFAULT_RADAR_BAND: ThresholdBand = ThresholdBand::new(0.0, 15.0);
pub const DEFAULT_HOOK_BAND: ThresholdBand = ThresholdBand::new(-1.0, 7.0);
pub const DEFAULT_ANNOUNCE_DELAY_MS: u64 = 1200;

fn default_history_len() -> usize {
    DEFAULT_HISTORY_LEN
}

fn default_consecutive_threshold() -> usize {
    DEFAULT_CONSECUTIVE_THRESHOLD
}

fn default_radar_band() -> ThresholdBand {
    DEFAULT_RADAR_BAND
}

fn default_hook_band() -> ThresholdBand {
    DEFAULT_HOOK_BAND
}

fn default_announce_delay_ms() -> u64 {
    DEFAULT_ANNOUNCE_DELAY_MS
}

/// Rejected engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{kind} band must have finite bounds with low < high, got [{low}, {high}]")]
    InvalidBand {
        kind: InstrumentKind,
        low: f64,
        high: f64,
    },
    #[error("history_len must be at least 1")]
    ZeroHistory,
    #[error("consecutive_threshold must be at least 1")]
    ZeroThreshold,
}

/// Parameters of one evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Readings kept per entity.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Run length at which a drift issue is raised.
    #[serde(default = "default_consecutive_threshold")]
    pub consecutive_threshold: usize,
    /// Delay before a newly qualifying drift alert is announced.
    #[serde(default = "default_announce_delay_ms")]
    pub announce_delay_ms: u64,
    /// Acceptable ship distance range for active radars.
    #[serde(default = "default_radar_band")]
    pub radar_band: ThresholdBand,
    /// Acceptable tension range for hooks in use.
    #[serde(default = "default_hook_band")]
    pub hook_band: ThresholdBand,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_len: DEFAULT_HISTORY_LEN,
            consecutive_threshold: DEFAULT_CONSECUTIVE_THRESHOLD,
            announce_delay_ms: DEFAULT_ANNOUNCE_DELAY_MS,
            radar_band: DEFAULT_RADAR_BAND,
            hook_band: DEFAULT_HOOK_BAND,
        }
    }
}

impl EngineConfig {
    /// Band selected by instrument kind.
    pub fn band_for(&self, kind: InstrumentKind) -> &ThresholdBand {
        match kind {
            InstrumentKind::Radar => &self.radar_band,
            InstrumentKind::Hook => &self.hook_band,
        }
    }

    pub fn announce_delay(&self) -> Duration {
        Duration::from_millis(self.announce_delay_ms)
    }

    /// A buffer of `history_len` readings holds at most `history_len - 1`
    /// transitions.
    pub fn drift_reachable(&self) -> bool {
        self.consecutive_threshold < self.history_len
    }

    /// Validates bands and sizes.
    ///
    /// An unreachable drift threshold is accepted with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_len == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        if self.consecutive_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        for kind in InstrumentKind::ALL {
            let band = self.band_for(kind);
            if !band.is_valid() {
                return Err(ConfigError::InvalidBand {
                    kind,
                    low: band.low,
                    high: band.high,
                });
            }
        }
        if !self.drift_reachable() {
            warn!(
                history_len = self.history_len,
                consecutive_threshold = self.consecutive_threshold,
                "Drift detection can never trigger: threshold needs more transitions than the history holds"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.history_len, 5);
        assert_eq!(config.consecutive_threshold, 5);
        assert_eq!(config.radar_band, ThresholdBand::new(0.0, 15.0));
        assert_eq!(config.hook_band, ThresholdBand::new(-1.0, 7.0));
        assert_eq!(config.announce_delay(), Duration::from_millis(1200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_band_selected_by_kind() {
        let config = EngineConfig::default();
        assert_eq!(config.band_for(InstrumentKind::Radar).high, 15.0);
        assert_eq!(config.band_for(InstrumentKind::Hook).low, -1.0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig = serde_yaml::from_str(
            "consecutive_threshold: 4\nradar_band:\n  low: 2.0\n  high: 12.0\n",
        )
        .unwrap();
        assert_eq!(config.consecutive_threshold, 4);
        assert_eq!(config.radar_band, ThresholdBand::new(2.0, 12.0));
        assert_eq!(config.history_len, DEFAULT_HISTORY_LEN);
        assert_eq!(config.hook_band, DEFAULT_HOOK_BAND);
        assert!(config.drift_reachable());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.hook_band = ThresholdBand::new(7.0, -1.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBand {
                kind: InstrumentKind::Hook,
                low: 7.0,
                high: -1.0
            })
        );

        let config = EngineConfig {
            history_len: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroHistory));

        let config = EngineConfig {
            consecutive_threshold: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
    }

    #[test]
    fn test_unreachable_threshold_is_only_a_warning() {
        let config = EngineConfig::default();
        assert!(!config.drift_reachable());
        assert!(config.validate().is_ok());
    }
}
