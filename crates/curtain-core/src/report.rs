//! End-of-life summary of one reveal gate.

use serde::{Deserialize, Serialize};

use crate::document::OverflowStyle;
use crate::resource::PreloadReport;
use crate::state::{GatePath, GateState};

/// Outcome of the dismissal cue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CueStatus {
    /// The cue has not been attempted (the gate was not dismissed, or the
    /// cue is still in flight).
    #[default]
    NotPlayed,
    /// The cue played.
    Played,
    /// The cue failed. Never affects the gate.
    Failed {
        /// Failure reason.
        reason: String,
    },
}

/// Summary of a gate's run.
///
/// Timestamps are milliseconds since gate construction; `None` means the
/// milestone was never reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealReport {
    /// Last state the gate reached.
    pub final_state: GateState,
    /// Path that won the race, if the race finished.
    pub winning_path: Option<GatePath>,
    /// When the gate entered `ReadyToDismiss`.
    pub ready_to_dismiss_ms: Option<u64>,
    /// When the gate entered `Dismissed`.
    pub dismissed_ms: Option<u64>,
    /// Preload outcomes, if every resource settled while the gate was alive.
    pub preload: Option<PreloadReport>,
    /// Style the scroll lock was released to, if it was released.
    pub scroll_release: Option<OverflowStyle>,
    /// Dismissal cue outcome.
    pub cue: CueStatus,
    /// Whether the host tore the gate down.
    pub torn_down: bool,
}

impl RevealReport {
    /// Report for a gate that has just been constructed.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            final_state: GateState::Pending,
            winning_path: None,
            ready_to_dismiss_ms: None,
            dismissed_ms: None,
            preload: None,
            scroll_release: None,
            cue: CueStatus::NotPlayed,
            torn_down: false,
        }
    }

    /// Returns `true` if the gate reached `Dismissed`.
    #[must_use]
    pub const fn is_dismissed(&self) -> bool {
        self.final_state.is_terminal()
    }
}

impl Default for RevealReport {
    fn default() -> Self {
        Self::pending()
    }
}
