//! Configuration parsing and management.
//!
//! A curtain configuration file has three sections, each optional:
//!
//! ```toml
//! [timing]
//! min_intro_ms = 5500
//! safety_ceiling_ms = 12000
//! dismiss_delay_ms = 2500
//!
//! [resources]
//! images = ["/textures/velvet.png"]
//! videos = ["/videos/hero-luxury.mp4"]
//!
//! [cue]
//! source = "/audio/curtain-swoosh.wav"
//! volume = 0.5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::resource::{ResourceList, ResourceListError};
use crate::timing::TimingPolicy;

/// Default dismissal cue asset.
pub const DEFAULT_CUE_SOURCE: &str = "/audio/curtain-swoosh.wav";

/// Default dismissal cue volume.
pub const DEFAULT_CUE_VOLUME: f32 = 0.5;

/// Top-level curtain configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    /// Intro floor, safety ceiling and dismissal delay.
    pub timing: TimingPolicy,

    /// Resources to preload.
    pub resources: ResourceManifest,

    /// Dismissal cue.
    pub cue: CueConfig,
}

impl RevealConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, contains unknown keys, or
    /// holds out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing
            .validate()
            .map_err(|e| ConfigError::Validation(format!("[timing] {e}")))?;
        self.resources
            .to_list()
            .map_err(|e| ConfigError::Validation(format!("[resources] {e}")))?;
        self.cue
            .validate()
            .map_err(|e| ConfigError::Validation(format!("[cue] {e}")))?;
        Ok(())
    }

    /// Builds the deduplicated resource list.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceListError`] if the manifest is invalid.
    pub fn resource_list(&self) -> Result<ResourceList, ResourceListError> {
        self.resources.to_list()
    }
}

/// `[resources]` section: the raw preload manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceManifest {
    /// Image URLs.
    pub images: Vec<String>,
    /// Video URLs.
    pub videos: Vec<String>,
}

impl ResourceManifest {
    /// Converts the manifest into a validated [`ResourceList`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceListError`] on an empty or oversized URL, or too
    /// many resources.
    pub fn to_list(&self) -> Result<ResourceList, ResourceListError> {
        ResourceList::new(self.images.iter().cloned(), self.videos.iter().cloned())
    }
}

/// `[cue]` section: the one-shot sound played on dismissal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CueConfig {
    /// Asset URL, resolved like any preloaded resource.
    pub source: String,
    /// Playback volume in `0.0..=1.0`.
    pub volume: f32,
}

impl CueConfig {
    /// Validates the cue settings.
    ///
    /// # Errors
    ///
    /// Returns an error string if the source is empty or the volume is out
    /// of range.
    pub fn validate(&self) -> Result<(), String> {
        if self.source.trim().is_empty() {
            return Err("source must not be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(format!("volume ({}) must be within 0.0..=1.0", self.volume));
        }
        Ok(())
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_CUE_SOURCE.to_string(),
            volume: DEFAULT_CUE_VOLUME,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
