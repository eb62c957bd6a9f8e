//! One-shot dismissal cue.
//!
//! The cue is strictly best-effort. The sequencer starts it after the gate
//! is already dismissed, bounds it with [`CUE_TIMEOUT`], logs any failure
//! and never retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use curtain_core::config::CueConfig;
use thiserror::Error;
use tracing::debug;

use crate::fetch::{FetchError, ResourceFetcher};

/// Upper bound on one cue attempt.
pub const CUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from playing the cue.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CueError {
    /// The cue asset could not be loaded.
    #[error("cue asset unavailable: {0}")]
    Asset(#[from] FetchError),

    /// The cue asset is empty.
    #[error("cue asset {url} is empty")]
    EmptyAsset {
        /// Asset URL.
        url: String,
    },

    /// Playback was refused (for example by an autoplay policy).
    #[error("cue playback rejected: {reason}")]
    Rejected {
        /// Why playback was refused.
        reason: String,
    },

    /// Playback did not finish within [`CUE_TIMEOUT`].
    #[error("cue timed out after {after_ms}ms")]
    TimedOut {
        /// Elapsed budget in milliseconds.
        after_ms: u64,
    },
}

/// Audio output for the dismissal cue.
#[async_trait]
pub trait AudioCue: Send + Sync {
    /// Plays `cue` once.
    async fn play(&self, cue: &CueConfig) -> Result<(), CueError>;
}

/// Cue that does nothing, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCue;

#[async_trait]
impl AudioCue for SilentCue {
    async fn play(&self, _cue: &CueConfig) -> Result<(), CueError> {
        Ok(())
    }
}

/// Cue that loads its asset through a [`ResourceFetcher`].
///
/// Without an audio device the best this host can do is prove the asset is
/// reachable and non-empty; that is what "played" means here.
#[derive(Clone)]
pub struct AssetCue {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl AssetCue {
    /// Creates a cue backed by `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }
}

impl std::fmt::Debug for AssetCue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCue").finish_non_exhaustive()
    }
}

#[async_trait]
impl AudioCue for AssetCue {
    async fn play(&self, cue: &CueConfig) -> Result<(), CueError> {
        let bytes = self.fetcher.fetch(&cue.source).await?;
        if bytes == 0 {
            return Err(CueError::EmptyAsset {
                url: cue.source.clone(),
            });
        }
        debug!(source = %cue.source, volume = cue.volume, bytes, "cue played");
        Ok(())
    }
}

/// Plays `cue` with the [`CUE_TIMEOUT`] bound applied.
pub(crate) async fn play_bounded(player: &dyn AudioCue, cue: &CueConfig) -> Result<(), CueError> {
    tokio::time::timeout(CUE_TIMEOUT, player.play(cue))
        .await
        .unwrap_or_else(|_| {
            Err(CueError::TimedOut {
                after_ms: u64::try_from(CUE_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            })
        })
}
