//! Gate arbiter: primary path versus safety ceiling.

use std::future::Future;

use curtain_core::resource::PreloadReport;
use curtain_core::state::GatePath;
use tokio::time::{Instant, sleep_until};

/// Result of the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Preload, intro floor and page load all settled first.
    Primary(PreloadReport),
    /// The safety ceiling fired first.
    Safety,
}

impl Verdict {
    /// Returns the winning path.
    #[must_use]
    pub const fn path(&self) -> GatePath {
        match self {
            Self::Primary(_) => GatePath::Primary,
            Self::Safety => GatePath::Safety,
        }
    }
}

/// Races a primary future against a fixed safety deadline.
#[derive(Debug, Clone, Copy)]
pub struct Arbiter {
    safety_deadline: Instant,
}

impl Arbiter {
    /// Creates an arbiter whose safety path fires at `safety_deadline`.
    #[must_use]
    pub const fn new(safety_deadline: Instant) -> Self {
        Self { safety_deadline }
    }

    /// Returns the safety deadline.
    #[must_use]
    pub const fn safety_deadline(&self) -> Instant {
        self.safety_deadline
    }

    /// Resolves with whichever side settles first. The loser is dropped.
    ///
    /// Neither side is polled preferentially.
    pub async fn decide<F>(self, primary: F) -> Verdict
    where
        F: Future<Output = PreloadReport>,
    {
        tokio::select! {
            report = primary => Verdict::Primary(report),
            () = sleep_until(self.safety_deadline) => Verdict::Safety,
        }
    }
}
