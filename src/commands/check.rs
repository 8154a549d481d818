//! Check command implementation.
//!
//! Validates the effective configuration and reports the engine parameters.

use crate::config::{validate_effective_config, Config};

/// Validates configuration and prints the effective engine parameters.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Mooring Monitor - Configuration Check");
    println!("========================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    let engine = &config.engine;
    println!("\n📈 Alert engine");
    println!("   history length:        {}", engine.history_len);
    println!("   consecutive threshold: {}", engine.consecutive_threshold);
    println!("   radar distance band:   {}", engine.radar_band);
    println!("   hook tension band:     {}", engine.hook_band);
    println!("   drift announce delay:  {} ms", engine.announce_delay_ms);

    if !engine.drift_reachable() {
        println!(
            "   ⚠️  Drift alerts can never trigger: {} readings hold at most {} transitions",
            engine.history_len,
            engine.history_len.saturating_sub(1)
        );
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
