//! `curtain check-config` and `curtain default-config`.

use std::path::Path;

use clap::Args;
use curtain_core::config::RevealConfig;

use super::{config_exit_code, load_config, output_error};
use crate::exit_codes::codes;

/// Arguments for `curtain check-config`.
#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validates the configuration and prints the effective settings.
pub fn check(config_path: Option<&Path>, args: &CheckConfigArgs) -> u8 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            return output_error(args.json, "config_error", &e.to_string(), config_exit_code(&e));
        },
    };
    let resources = match config.resource_list() {
        Ok(resources) => resources,
        Err(e) => {
            return output_error(args.json, "config_error", &e.to_string(), codes::VALIDATION_ERROR);
        },
    };

    let timing = config.timing;
    if args.json {
        let output = serde_json::json!({
            "valid": true,
            "timing": timing,
            "earliest_ready_ms": timing.earliest_ready_ms(),
            "latest_ready_ms": timing.latest_ready_ms(),
            "images": resources.images().len(),
            "videos": resources.videos().len(),
            "cue": config.cue,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("configuration OK");
        println!("{:<20}{} ms", "min intro:", timing.min_intro_ms());
        println!("{:<20}{} ms", "safety ceiling:", timing.safety_ceiling_ms());
        println!("{:<20}{} ms", "dismiss delay:", timing.dismiss_delay_ms());
        println!(
            "{:<20}{}..{} ms",
            "ready window:",
            timing.earliest_ready_ms(),
            timing.latest_ready_ms()
        );
        println!(
            "{:<20}{} images, {} videos",
            "resources:",
            resources.images().len(),
            resources.videos().len()
        );
        println!(
            "{:<20}{} (volume {})",
            "cue:", config.cue.source, config.cue.volume
        );
    }
    codes::SUCCESS
}

/// Prints the default configuration as TOML.
pub fn print_default() -> u8 {
    match RevealConfig::default().to_toml() {
        Ok(text) => {
            print!("{text}");
            codes::SUCCESS
        },
        Err(e) => output_error(false, "serialize_failed", &e.to_string(), codes::GENERIC_ERROR),
    }
}
