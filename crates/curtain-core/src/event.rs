//! Events recorded over a gate's lifetime.
//!
//! Every event carries `elapsed_ms`, the time since gate construction on the
//! gate's own clock. Events are buffered by the gate and drained by the
//! caller; nothing is persisted.

use serde::Serialize;

use crate::document::OverflowStyle;
use crate::resource::{ResourceKind, ResourceOutcome};
use crate::state::{GatePath, GateState};

/// Events emitted by a reveal gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RevealEvent {
    /// Page scrolling was locked at construction.
    ScrollLocked {
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// One resource settled.
    ResourceSettled {
        /// Resource kind.
        kind: ResourceKind,
        /// Resource URL.
        url: String,
        /// Terminal outcome.
        outcome: ResourceOutcome,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// Every listed resource settled.
    PreloadSettled {
        /// Resources that loaded.
        loaded: usize,
        /// Resources that failed.
        failed: usize,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The minimum intro duration elapsed.
    IntroElapsed {
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The document reached its load-complete state.
    PageLoaded {
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The arbiter picked a winning path.
    PathWon {
        /// The winning path.
        path: GatePath,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The gate state advanced.
    StateChanged {
        /// Previous state.
        from: GateState,
        /// New state.
        to: GateState,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The scroll lock was released.
    ScrollReleased {
        /// Style the page was left with.
        style: OverflowStyle,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The dismissal cue played.
    CuePlayed {
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The dismissal cue failed; the failure is informational only.
    CueFailed {
        /// Failure reason.
        reason: String,
        /// Time since construction.
        elapsed_ms: u64,
    },
    /// The gate was torn down by its host.
    TornDown {
        /// State at teardown.
        state: GateState,
        /// Time since construction.
        elapsed_ms: u64,
    },
}

impl RevealEvent {
    /// Returns the time since construction at which the event occurred.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        match self {
            Self::ScrollLocked { elapsed_ms }
            | Self::ResourceSettled { elapsed_ms, .. }
            | Self::PreloadSettled { elapsed_ms, .. }
            | Self::IntroElapsed { elapsed_ms }
            | Self::PageLoaded { elapsed_ms }
            | Self::PathWon { elapsed_ms, .. }
            | Self::StateChanged { elapsed_ms, .. }
            | Self::ScrollReleased { elapsed_ms, .. }
            | Self::CuePlayed { elapsed_ms }
            | Self::CueFailed { elapsed_ms, .. }
            | Self::TornDown { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Returns the snake-case name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ScrollLocked { .. } => "scroll_locked",
            Self::ResourceSettled { .. } => "resource_settled",
            Self::PreloadSettled { .. } => "preload_settled",
            Self::IntroElapsed { .. } => "intro_elapsed",
            Self::PageLoaded { .. } => "page_loaded",
            Self::PathWon { .. } => "path_won",
            Self::StateChanged { .. } => "state_changed",
            Self::ScrollReleased { .. } => "scroll_released",
            Self::CuePlayed { .. } => "cue_played",
            Self::CueFailed { .. } => "cue_failed",
            Self::TornDown { .. } => "torn_down",
        }
    }
}
