//! CLI command implementations for mooring-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Configuration validation
//! - `config`: Configuration file generation
//! - `replay`: Offline evaluation of a recorded snapshot stream
//! - `generate`: Synthetic snapshot stream generation

pub mod check;
pub mod config;
pub mod generate;
pub mod replay;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use replay::command_replay;
