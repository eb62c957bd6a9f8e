//! Bounded per-gate event buffer.
//!
//! The log also owns the gate's clock origin: every `elapsed_ms` in a
//! [`RevealEvent`] is measured from the log's construction instant, on the
//! tokio clock (so paused-time tests observe exact offsets).

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use curtain_core::event::RevealEvent;
use tokio::time::Instant;
use tracing::warn;

/// Maximum number of buffered, undrained events.
///
/// A gate emits a bounded number of events per resource, so this only
/// trips if the caller never drains a very large list.
pub const MAX_BUFFERED_EVENTS: usize = 4_096;

/// Event buffer for one gate.
#[derive(Debug)]
pub struct EventLog {
    started: Instant,
    inner: Mutex<EventLogInner>,
}

#[derive(Debug, Default)]
struct EventLogInner {
    events: Vec<RevealEvent>,
    closed: bool,
    dropped: usize,
}

impl EventLog {
    /// Creates a log whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Creates a log whose clock started at `started`.
    #[must_use]
    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            inner: Mutex::new(EventLogInner::default()),
        }
    }

    /// Returns the clock origin.
    #[must_use]
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Returns the time since the clock origin.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns the time since the clock origin in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Appends an event built from the current elapsed time.
    ///
    /// Returns `false` if the log is closed or full; the event is dropped.
    pub fn record(&self, build: impl FnOnce(u64) -> RevealEvent) -> bool {
        let elapsed_ms = self.elapsed_ms();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.closed {
            return false;
        }
        if inner.events.len() >= MAX_BUFFERED_EVENTS {
            inner.dropped += 1;
            if inner.dropped == 1 {
                warn!(
                    max = MAX_BUFFERED_EVENTS,
                    "event buffer full, dropping events until drained"
                );
            }
            return false;
        }
        inner.events.push(build(elapsed_ms));
        true
    }

    /// Takes every buffered event, oldest first.
    pub fn drain(&self) -> Vec<RevealEvent> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.dropped = 0;
        std::mem::take(&mut inner.events)
    }

    /// Stops accepting events. Buffered events stay drainable.
    pub fn close(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
    }

    /// Returns `true` once the log has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_events_carry_elapsed_time() {
        let log = EventLog::new();
        log.record(|elapsed_ms| RevealEvent::ScrollLocked { elapsed_ms });
        tokio::time::sleep(Duration::from_millis(250)).await;
        log.record(|elapsed_ms| RevealEvent::PageLoaded { elapsed_ms });

        let events = log.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].elapsed_ms(), 0);
        assert_eq!(events[1].elapsed_ms(), 250);
        assert!(log.drain().is_empty());
    }

    #[tokio::test]
    async fn test_closed_log_rejects_events() {
        let log = EventLog::new();
        assert!(log.record(|elapsed_ms| RevealEvent::IntroElapsed { elapsed_ms }));
        log.close();
        assert!(log.is_closed());
        assert!(!log.record(|elapsed_ms| RevealEvent::PageLoaded { elapsed_ms }));
        assert_eq!(log.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_buffer_is_bounded() {
        let log = EventLog::new();
        for _ in 0..MAX_BUFFERED_EVENTS {
            assert!(log.record(|elapsed_ms| RevealEvent::CuePlayed { elapsed_ms }));
        }
        assert!(!log.record(|elapsed_ms| RevealEvent::CuePlayed { elapsed_ms }));
        assert_eq!(log.drain().len(), MAX_BUFFERED_EVENTS);
        assert!(log.record(|elapsed_ms| RevealEvent::CuePlayed { elapsed_ms }));
    }
}
