//! Intro timer track.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

/// Settles once the minimum intro duration has passed since construction.
///
/// The deadline is fixed at creation and does not depend on anything the
/// gate observes later.
#[derive(Debug, Clone, Copy)]
pub struct IntroTimer {
    deadline: Instant,
}

impl IntroTimer {
    /// Creates a timer that expires `min_intro` after `started`.
    #[must_use]
    pub fn starting_at(started: Instant, min_intro: Duration) -> Self {
        Self {
            deadline: started + min_intro,
        }
    }

    /// Returns the instant the intro floor is reached.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the deadline.
    pub async fn elapsed(self) {
        sleep_until(self.deadline).await;
    }
}
