//! Reveal gate state machine.
//!
//! ```text
//! Pending -> ReadyToDismiss -> Dismissing -> Dismissed
//! ```
//!
//! Transitions only move one step forward. Nothing (a late resource, a late
//! timer, a second dismissal) can move a gate backwards or skip a step.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of one reveal gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Waiting on the primary path or the safety ceiling.
    Pending,
    /// The arbiter fired; dismissal not yet scheduled.
    ReadyToDismiss,
    /// The fade-out delay is running.
    Dismissing,
    /// The intro is gone, scrolling restored, "ready" exposed.
    Dismissed,
}

impl GateState {
    /// Returns the state's position in the lifecycle.
    const fn ordinal(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::ReadyToDismiss => 1,
            Self::Dismissing => 2,
            Self::Dismissed => 3,
        }
    }

    /// Returns the only state this one may advance to.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::ReadyToDismiss),
            Self::ReadyToDismiss => Some(Self::Dismissing),
            Self::Dismissing => Some(Self::Dismissed),
            Self::Dismissed => None,
        }
    }

    /// Advances to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`StateTransitionError`] unless `next` is the immediate
    /// successor of `self`.
    pub fn advance_to(self, next: Self) -> Result<Self, StateTransitionError> {
        if self.successor() == Some(next) {
            return Ok(next);
        }
        if next.ordinal() <= self.ordinal() {
            Err(StateTransitionError::Backwards {
                from: self,
                to: next,
            })
        } else {
            Err(StateTransitionError::Skipped {
                from: self,
                to: next,
            })
        }
    }

    /// Returns `true` once the gate has been dismissed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Dismissed)
    }

    /// Returns the snake-case label for this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReadyToDismiss => "ready_to_dismiss",
            Self::Dismissing => "dismissing",
            Self::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state transition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateTransitionError {
    /// The target state is not after the current one.
    #[error("gate state cannot move backwards: {from} -> {to}")]
    Backwards {
        /// Current state.
        from: GateState,
        /// Requested state.
        to: GateState,
    },

    /// The target state skips an intermediate state.
    #[error("gate state cannot skip ahead: {from} -> {to}")]
    Skipped {
        /// Current state.
        from: GateState,
        /// Requested state.
        to: GateState,
    },
}

/// Composite signal that moved a gate out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePath {
    /// Resources, intro floor and page load all settled first.
    Primary,
    /// The safety ceiling fired first.
    Safety,
}

impl GatePath {
    /// Returns the lowercase label for this path.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Safety => "safety",
        }
    }
}

impl fmt::Display for GatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
