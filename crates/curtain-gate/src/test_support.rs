//! Scripted collaborators for testing code built on the gate.
//!
//! Available to this crate's own tests and, with the `test-util` feature,
//! to anyone else. Every scripted delay runs on the tokio clock, so tests on
//! a paused runtime observe exact offsets.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use curtain_core::config::CueConfig;

use crate::cue::{AudioCue, CueError};
use crate::fetch::{FetchError, ResourceFetcher};

/// Behaviour of one scripted URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Load `bytes` bytes after `after_ms`.
    Succeed {
        /// Delay before settling.
        after_ms: u64,
        /// Reported size.
        bytes: u64,
    },
    /// Fail with [`FetchError::NotFound`] after `after_ms`.
    Fail {
        /// Delay before settling.
        after_ms: u64,
    },
    /// Never settle.
    Stall,
    /// Panic inside the fetch.
    Panic,
}

impl Script {
    /// Loads one byte after `after_ms`.
    #[must_use]
    pub const fn succeed_after(after_ms: u64) -> Self {
        Self::Succeed { after_ms, bytes: 1 }
    }

    /// Fails after `after_ms`.
    #[must_use]
    pub const fn fail_after(after_ms: u64) -> Self {
        Self::Fail { after_ms }
    }
}

/// Fetcher whose per-URL behaviour is fixed up front.
///
/// Unscripted URLs load one byte immediately.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    attempts: Mutex<HashMap<String, usize>>,
    completions: AtomicUsize,
}

impl ScriptedFetcher {
    /// Creates a fetcher with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts `url`.
    #[must_use]
    pub fn with(mut self, url: &str, script: Script) -> Self {
        self.scripts.insert(url.to_string(), script);
        self
    }

    /// Number of fetches started for `url`.
    #[must_use]
    pub fn attempts(&self, url: &str) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Number of fetches that settled, across all URLs.
    #[must_use]
    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<u64, FetchError> {
        *self
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default() += 1;

        let result = match self.scripts.get(url).copied() {
            None => Ok(1),
            Some(Script::Succeed { after_ms, bytes }) => {
                tokio::time::sleep(Duration::from_millis(after_ms)).await;
                Ok(bytes)
            },
            Some(Script::Fail { after_ms }) => {
                tokio::time::sleep(Duration::from_millis(after_ms)).await;
                Err(FetchError::NotFound {
                    url: url.to_string(),
                })
            },
            Some(Script::Stall) => std::future::pending().await,
            Some(Script::Panic) => panic!("scripted fetch of {url} panicked"),
        };
        self.completions.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Cue that counts plays and optionally rejects them.
#[derive(Debug, Default)]
pub struct RecordingCue {
    plays: AtomicUsize,
    fail: bool,
}

impl RecordingCue {
    /// Creates a cue whose every play is rejected.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            plays: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Number of play attempts.
    #[must_use]
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioCue for RecordingCue {
    async fn play(&self, cue: &CueConfig) -> Result<(), CueError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CueError::Rejected {
                reason: format!("playback of {} blocked", cue.source),
            });
        }
        Ok(())
    }
}
