//! Best-effort resource preloader.
//!
//! [`Preloader::start`] spawns one detached task per listed resource the
//! moment it is called. [`PreloadHandle::settled`] resolves once every task
//! has settled, loaded or failed; it never fails. Dropping the handle (for
//! example when the safety path wins or the gate is torn down) detaches the
//! tasks: in-flight fetches run to completion and are simply ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use curtain_core::event::RevealEvent;
use curtain_core::resource::{
    PreloadReport, ResourceKind, ResourceList, ResourceOutcome, ResourceSettlement,
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::EventLog;
use crate::fetch::ResourceFetcher;

/// Starts preload passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preloader;

impl Preloader {
    /// Spawns one fetch per resource in `list`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(
        list: &ResourceList,
        fetcher: &Arc<dyn ResourceFetcher>,
        log: &Arc<EventLog>,
    ) -> PreloadHandle {
        let pending = Arc::new(AtomicUsize::new(list.len()));
        let tasks = list
            .iter()
            .map(|(kind, url)| {
                let task = tokio::spawn(fetch_one(
                    kind,
                    url.to_string(),
                    Arc::clone(fetcher),
                    Arc::clone(log),
                    Arc::clone(&pending),
                ));
                PendingResource {
                    kind,
                    url: url.to_string(),
                    task,
                }
            })
            .collect();

        debug!(resources = list.len(), "preload started");
        PreloadHandle {
            tasks,
            pending,
            log: Arc::clone(log),
        }
    }
}

struct PendingResource {
    kind: ResourceKind,
    url: String,
    task: JoinHandle<ResourceSettlement>,
}

/// In-flight preload pass.
pub struct PreloadHandle {
    tasks: Vec<PendingResource>,
    pending: Arc<AtomicUsize>,
    log: Arc<EventLog>,
}

impl PreloadHandle {
    /// Number of resources that have not settled yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Shared counter of unsettled resources, readable after the handle is
    /// consumed.
    #[must_use]
    pub fn pending_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pending)
    }

    /// Waits for every resource to settle.
    ///
    /// Settlements are reported in list order. A task that panicked counts
    /// as a failed resource.
    pub async fn settled(self) -> PreloadReport {
        let mut settlements = Vec::with_capacity(self.tasks.len());
        for PendingResource { kind, url, task } in self.tasks {
            let settlement = match task.await {
                Ok(settlement) => settlement,
                Err(e) => ResourceSettlement {
                    kind,
                    url,
                    outcome: ResourceOutcome::Failed {
                        reason: format!("fetch task failed: {e}"),
                    },
                    elapsed_ms: self.log.elapsed_ms(),
                },
            };
            settlements.push(settlement);
        }

        let report = PreloadReport { settlements };
        let (loaded, failed) = (report.loaded_count(), report.failed_count());
        self.log.record(|elapsed_ms| RevealEvent::PreloadSettled {
            loaded,
            failed,
            elapsed_ms,
        });
        info!(loaded, failed, bytes = report.total_bytes(), "preload settled");
        report
    }
}

impl std::fmt::Debug for PreloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadHandle")
            .field("resources", &self.tasks.len())
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Decrements the unsettled count when a fetch task ends, panics included.
struct SettleGuard(Arc<AtomicUsize>);

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn fetch_one(
    kind: ResourceKind,
    url: String,
    fetcher: Arc<dyn ResourceFetcher>,
    log: Arc<EventLog>,
    pending: Arc<AtomicUsize>,
) -> ResourceSettlement {
    let guard = SettleGuard(pending);
    let outcome = match fetcher.fetch(&url).await {
        Ok(bytes) => ResourceOutcome::Loaded { bytes },
        Err(e) => ResourceOutcome::Failed {
            reason: e.to_string(),
        },
    };
    drop(guard);

    let elapsed_ms = log.elapsed_ms();
    match &outcome {
        ResourceOutcome::Loaded { bytes } => {
            debug!(%kind, %url, bytes, elapsed_ms, "resource loaded");
        },
        ResourceOutcome::Failed { reason } => {
            debug!(%kind, %url, %reason, elapsed_ms, "resource failed");
        },
    }
    log.record(|elapsed_ms| RevealEvent::ResourceSettled {
        kind,
        url: url.clone(),
        outcome: outcome.clone(),
        elapsed_ms,
    });

    ResourceSettlement {
        kind,
        url,
        outcome,
        elapsed_ms,
    }
}
