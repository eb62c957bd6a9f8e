//! Page-load watcher.

use curtain_core::document::ReadyState;
use tokio::sync::watch;

use crate::document::Document;

/// Settles when the document reaches [`ReadyState::Complete`].
///
/// Consumed by [`PageLoadWatcher::loaded`], so a watcher observes at most
/// one completion.
#[derive(Debug)]
pub struct PageLoadWatcher {
    ready_state: watch::Receiver<ReadyState>,
}

impl PageLoadWatcher {
    /// Watches `document`.
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            ready_state: document.subscribe_ready_state(),
        }
    }

    /// Resolves immediately if the document has already loaded, otherwise
    /// on the next transition to `Complete`.
    ///
    /// If every handle to the document is dropped before it loads, this
    /// never resolves; the safety path still bounds the gate.
    pub async fn loaded(mut self) {
        let completed = self
            .ready_state
            .wait_for(ReadyState::is_complete)
            .await
            .is_ok();
        if !completed {
            std::future::pending::<()>().await;
        }
    }
}
