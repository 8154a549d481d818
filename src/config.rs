//! Configuration management for mooring-monitor.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use mooring_monitor::EngineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9320;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_metrics: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    /// Interval of the background task that fires pending drift announcements
    #[serde(alias = "tick-interval-ms")]
    pub tick_interval_ms: Option<u64>,

    // Alert engine, shared by every location
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            enable_health: Some(true),
            enable_metrics: Some(true),
            log_level: Some("info".into()),
            tick_interval_ms: Some(DEFAULT_TICK_INTERVAL_MS),
            engine: EngineConfig::default(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    if cfg.port == Some(0) {
        return Err("port must be greater than 0".into());
    }

    if cfg.tick_interval_ms == Some(0) {
        return Err("tick_interval_ms must be greater than 0".into());
    }

    cfg.engine.validate()?;

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_metrics {
        config.enable_metrics = Some(false);
    }
    if let Some(ms) = args.tick_interval_ms {
        config.tick_interval_ms = Some(ms);
    }

    // Engine overrides: CLI wins if provided
    if let Some(n) = args.history_len {
        config.engine.history_len = n;
    }
    if let Some(n) = args.consecutive_threshold {
        config.engine.consecutive_threshold = n;
    }
    if let Some(ms) = args.announce_delay_ms {
        config.engine.announce_delay_ms = ms;
    }

    Ok(config)
}

/// Loads configuration from an explicit path or the default locations.
///
/// Missing files yield the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/mooring-monitor/config.yaml",
                "/etc/mooring-monitor/config.yml",
                "/etc/mooring-monitor/config.json",
                "./mooring-monitor.yaml",
                "./mooring-monitor.yml",
                "./mooring-monitor.json",
                "./mooring-monitor.toml",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 8000\nengine:\n  consecutive_threshold: 4\n").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Args::parse_from(["mooring-monitor", "-c", &path, "--port", "9000"]);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.engine.consecutive_threshold, 4);
        assert_eq!(config.engine.history_len, 5);
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let args = Args::parse_from(["mooring-monitor", "--no-config", "--history-len", "6"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.port, Some(DEFAULT_PORT));
        assert_eq!(config.engine.history_len, 6);
        assert!(validate_effective_config(&config).is_ok());
    }

    #[test]
    fn test_toml_config() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "port = 7000\n\n[engine]\nhistory_len = 8\n\n[engine.radar_band]\nlow = 2.0\nhigh = 12.0\n"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.port, Some(7000));
        assert_eq!(config.engine.history_len, 8);
        assert_eq!(config.engine.radar_band.low, 2.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.bind = Some("not-an-ip".into());
        assert!(validate_effective_config(&config).is_err());

        let mut config = Config::default();
        config.engine.history_len = 0;
        assert!(validate_effective_config(&config).is_err());

        let mut config = Config::default();
        config.tick_interval_ms = Some(0);
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_render_round_trips_through_yaml() {
        let rendered = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed.engine, EngineConfig::default());
    }
}
