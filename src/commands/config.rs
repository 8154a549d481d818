//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Writes the default configuration, or prints it when the output is `-`.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| match format {
        ConfigFormat::Json => PathBuf::from("mooring-monitor.json"),
        ConfigFormat::Toml => PathBuf::from("mooring-monitor.toml"),
        ConfigFormat::Yaml => PathBuf::from("mooring-monitor.yaml"),
    });

    let content = render_config(&config, &format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("writing configuration to {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}
