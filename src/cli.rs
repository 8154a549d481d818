//! CLI arguments and subcommands for mooring-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report output format for `replay`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "mooring-monitor",
    about = "Alert engine and ingest service for mooring radar distance and hook tension streams",
    long_about = "Alert engine and ingest service for mooring radar distance and hook tension streams.\n\n\
                  Receives facility snapshots, keeps a short history per radar and hook, \
                  classifies threshold breaches and sustained drift, and serves the resulting \
                  reports, history and Prometheus metrics over HTTP.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable /metrics endpoint
    #[arg(long)]
    pub disable_metrics: bool,

    /// Interval for firing pending drift announcements (ms)
    #[arg(long)]
    pub tick_interval_ms: Option<u64>,

    /// Readings kept per instrument (override config)
    #[arg(long)]
    pub history_len: Option<usize>,

    /// Consecutive changes that raise a drift alert (override config)
    #[arg(long)]
    pub consecutive_threshold: Option<usize>,

    /// Drift announce delay in ms (override config)
    #[arg(long)]
    pub announce_delay_ms: Option<u64>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration
    Check,

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },

    /// Evaluate a recorded snapshot stream offline
    Replay {
        /// Input file: JSON lines or a JSON array of snapshots
        #[arg(short = 'i', long)]
        input: PathBuf,

        /// Simulated time between snapshots (ms)
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Evaluate only this berth
        #[arg(long)]
        berth: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate a synthetic snapshot stream (JSON lines)
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.jsonl")]
        output: PathBuf,

        /// Number of snapshots to generate
        #[arg(short = 'n', long, default_value_t = 20)]
        snapshots: usize,

        /// Number of berths per snapshot
        #[arg(long, default_value_t = 2)]
        berths: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}
