//! Host document values observed and written by a gate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Load lifecycle of the hosting document.
///
/// Ordered: a document only ever moves from `Loading` towards `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// The document is still loading.
    Loading,
    /// The document is parsed, subresources are still loading.
    Interactive,
    /// The document and all subresources have finished loading.
    Complete,
}

impl ReadyState {
    /// Returns `true` once the full load lifecycle has completed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns the lowercase label for this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page-level overflow style, the scroll lock's only lever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowStyle {
    /// No explicit style; the page's own stylesheet applies.
    Unset,
    /// Scrolling disabled.
    Hidden,
    /// Scrolling enabled.
    Auto,
}

impl OverflowStyle {
    /// Returns `true` if this style blocks scrolling.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Returns the CSS keyword for this style.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Hidden => "hidden",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for OverflowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_is_ordered() {
        assert!(ReadyState::Loading < ReadyState::Interactive);
        assert!(ReadyState::Interactive < ReadyState::Complete);
        assert!(ReadyState::Complete.is_complete());
        assert!(!ReadyState::Interactive.is_complete());
    }

    #[test]
    fn test_overflow_keywords() {
        assert_eq!(OverflowStyle::Hidden.to_string(), "hidden");
        assert_eq!(OverflowStyle::Auto.to_string(), "auto");
        assert_eq!(OverflowStyle::Unset.to_string(), "unset");
        assert!(OverflowStyle::Hidden.is_locked());
        assert!(!OverflowStyle::Unset.is_locked());
    }
}
