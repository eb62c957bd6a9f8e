//! Scroll-lock guard.
//!
//! The lock is acquired when a gate is constructed (overflow `hidden`) and
//! released exactly once: to `auto` on natural dismissal, to `unset` on
//! early teardown or when the guard is dropped unreleased.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use curtain_core::document::OverflowStyle;
use tracing::debug;

use crate::document::ScrollSurface;

/// Guard holding a surface's scrolling locked.
pub struct ScrollLock {
    surface: Arc<dyn ScrollSurface>,
    released: AtomicBool,
}

impl ScrollLock {
    /// Locks scrolling on `surface`.
    #[must_use]
    pub fn acquire(surface: Arc<dyn ScrollSurface>) -> Self {
        surface.set_overflow(OverflowStyle::Hidden);
        debug!("scroll locked");
        Self {
            surface,
            released: AtomicBool::new(false),
        }
    }

    /// Releases the lock, leaving the surface at `style`.
    ///
    /// Returns `true` if this call released the lock; every later call is a
    /// no-op returning `false`.
    pub fn release(&self, style: OverflowStyle) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.surface.set_overflow(style);
        debug!(style = %style, "scroll released");
        true
    }

    /// Returns `true` once the lock has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.release(OverflowStyle::Unset);
    }
}

impl fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLock")
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
