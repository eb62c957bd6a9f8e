//! Subcommand implementations.

pub mod config;
pub mod run;

use std::io;
use std::path::Path;

use curtain_core::config::{ConfigError, RevealConfig};
use serde::Serialize;

use crate::exit_codes::codes;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "curtain.toml";

/// Loads the configuration.
///
/// An explicit path must exist. Without one, `./curtain.toml` is read if
/// present and the built-in defaults are used otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<RevealConfig, ConfigError> {
    match explicit {
        Some(path) => RevealConfig::from_file(path),
        None => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                RevealConfig::from_file(path)
            } else {
                Ok(RevealConfig::default())
            }
        },
    }
}

/// Maps a configuration error to an exit code.
///
/// Only a missing file is `NOT_FOUND`; other I/O failures are generic.
pub fn config_exit_code(error: &ConfigError) -> u8 {
    match error {
        ConfigError::Io(e) if e.kind() == io::ErrorKind::NotFound => codes::NOT_FOUND,
        ConfigError::Io(_) => codes::GENERIC_ERROR,
        _ => codes::VALIDATION_ERROR,
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

/// Output an error in the appropriate format.
pub fn output_error(json_output: bool, code: &str, message: &str, exit_code: u8) -> u8 {
    if json_output {
        let error = ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
        };
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&error).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        eprintln!("Error: {message}");
    }
    exit_code
}
