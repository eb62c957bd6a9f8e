//! Host document model.
//!
//! A [`Document`] stands in for the page hosting the intro. It carries the
//! two pieces of page state the gate cares about: the load lifecycle
//! ([`ReadyState`]), which the host advances, and the page-level overflow
//! style, which only the gate's scroll lock writes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use curtain_core::document::{OverflowStyle, ReadyState};
use tokio::sync::watch;
use tracing::debug;

/// Surface whose scrolling the gate locks while the intro is visible.
pub trait ScrollSurface: Send + Sync {
    /// Writes the page-level overflow style.
    fn set_overflow(&self, style: OverflowStyle);

    /// Reads the current page-level overflow style.
    fn overflow(&self) -> OverflowStyle;
}

/// Shared handle to the hosting document.
///
/// Cloning is cheap; all clones observe the same document.
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

#[derive(Debug)]
struct DocumentInner {
    ready_state: watch::Sender<ReadyState>,
    overflow: Mutex<OverflowStyle>,
    overflow_writes: AtomicUsize,
}

impl Document {
    /// Creates a document in the given load state with no overflow style.
    #[must_use]
    pub fn new(ready_state: ReadyState) -> Self {
        let (tx, _rx) = watch::channel(ready_state);
        Self {
            inner: Arc::new(DocumentInner {
                ready_state: tx,
                overflow: Mutex::new(OverflowStyle::Unset),
                overflow_writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Creates a document that has already finished loading.
    #[must_use]
    pub fn loaded() -> Self {
        Self::new(ReadyState::Complete)
    }

    /// Returns the current load state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        *self.inner.ready_state.borrow()
    }

    /// Advances the load state.
    ///
    /// The lifecycle only moves forward; returns `false` (and changes
    /// nothing) if `state` is not later than the current one.
    pub fn mark_ready_state(&self, state: ReadyState) -> bool {
        let advanced = self.inner.ready_state.send_if_modified(|current| {
            if state > *current {
                *current = state;
                true
            } else {
                false
            }
        });
        if advanced {
            debug!(ready_state = %state, "document ready state advanced");
        }
        advanced
    }

    /// Subscribes to load-state changes.
    #[must_use]
    pub fn subscribe_ready_state(&self) -> watch::Receiver<ReadyState> {
        self.inner.ready_state.subscribe()
    }

    /// Returns how many times the overflow style has been written.
    #[must_use]
    pub fn overflow_writes(&self) -> usize {
        self.inner.overflow_writes.load(Ordering::SeqCst)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(ReadyState::Loading)
    }
}

impl ScrollSurface for Document {
    fn set_overflow(&self, style: OverflowStyle) {
        let mut overflow = self
            .inner
            .overflow
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *overflow = style;
        self.inner.overflow_writes.fetch_add(1, Ordering::SeqCst);
    }

    fn overflow(&self) -> OverflowStyle {
        *self
            .inner
            .overflow
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
