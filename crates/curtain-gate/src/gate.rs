//! Reveal gate construction, shared state and caller handle.
//!
//! A gate is started with [`RevealGate::builder`] and observed through the
//! returned [`GateHandle`]. Starting a gate does, synchronously:
//!
//! 1. lock page scrolling,
//! 2. spawn one fetch per listed resource,
//! 3. fix the intro-floor and safety-ceiling deadlines,
//! 4. spawn the driver task that runs the arbiter and then the dismissal
//!    sequencer.
//!
//! # State ownership
//!
//! Gate state, the scroll lock and the "ready" flag have a single writer:
//! the shared core owned by the gate. Every transition checks the
//! teardown flag under the same lock, so nothing the driver does can land
//! after [`GateHandle::teardown`] returns.
//!
//! # Teardown
//!
//! Teardown (explicit, or by dropping the handle) cancels the gate's
//! [`CancellationToken`], aborts the driver task, releases the scroll lock
//! to `unset` if it is still held, and closes the event log. No timer owned
//! by the gate fires afterwards. Resource fetches already in flight are not
//! aborted; their results are discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use curtain_core::config::{CueConfig, ResourceManifest, RevealConfig};
use curtain_core::document::OverflowStyle;
use curtain_core::event::RevealEvent;
use curtain_core::report::{CueStatus, RevealReport};
use curtain_core::resource::{PreloadReport, ResourceList, ResourceListError};
use curtain_core::state::{GatePath, GateState};
use curtain_core::timing::TimingPolicy;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::arbiter::{Arbiter, Verdict};
use crate::cue::{AudioCue, CueError, SilentCue};
use crate::document::Document;
use crate::events::EventLog;
use crate::fetch::{DEFAULT_ASSET_ROOT, FsFetcher, ResourceFetcher};
use crate::intro::IntroTimer;
use crate::page_load::PageLoadWatcher;
use crate::preload::{PreloadHandle, Preloader};
use crate::scroll::ScrollLock;
use crate::sequencer;

// =============================================================================
// Error Types
// =============================================================================

/// Errors from starting or waiting on a gate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GateError {
    /// `start()` was called outside a tokio runtime.
    #[error("reveal gate must be started inside a tokio runtime")]
    NoRuntime,

    /// The timing policy is invalid.
    #[error("invalid timing policy: {0}")]
    InvalidTiming(String),

    /// The resource manifest is invalid.
    #[error("invalid resource list: {0}")]
    InvalidResources(#[from] ResourceListError),

    /// The cue configuration is invalid.
    #[error("invalid cue configuration: {0}")]
    InvalidCue(String),

    /// The gate was torn down before the awaited milestone.
    #[error("reveal gate torn down in state {state}")]
    TornDown {
        /// State at teardown.
        state: GateState,
    },
}

// =============================================================================
// Builder
// =============================================================================

/// Entry point for starting reveal gates.
#[derive(Debug, Clone, Copy)]
pub struct RevealGate;

impl RevealGate {
    /// Creates a builder seeded from `config`.
    #[must_use]
    pub fn builder(config: &RevealConfig) -> RevealGateBuilder {
        RevealGateBuilder {
            timing: config.timing,
            manifest: config.resources.clone(),
            resources: None,
            cue_config: config.cue.clone(),
            fetcher: None,
            document: None,
            audio_cue: None,
        }
    }
}

/// Builder for a reveal gate.
///
/// Defaults: resources from the config's `[resources]` section, an
/// [`FsFetcher`] rooted at `public/`, an already-loaded [`Document`], and a
/// [`SilentCue`].
pub struct RevealGateBuilder {
    timing: TimingPolicy,
    manifest: ResourceManifest,
    resources: Option<ResourceList>,
    cue_config: CueConfig,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    document: Option<Document>,
    audio_cue: Option<Arc<dyn AudioCue>>,
}

impl RevealGateBuilder {
    /// Overrides the timing policy.
    #[must_use]
    pub fn timing(mut self, timing: TimingPolicy) -> Self {
        self.timing = timing;
        self
    }

    /// Overrides the resource list.
    #[must_use]
    pub fn resources(mut self, resources: ResourceList) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Sets the fetcher used for preloading.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Sets the hosting document.
    #[must_use]
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    /// Sets the dismissal cue player.
    #[must_use]
    pub fn audio_cue(mut self, cue: Arc<dyn AudioCue>) -> Self {
        self.audio_cue = Some(cue);
        self
    }

    /// Locks scrolling, starts every signal and returns the gate handle.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NoRuntime`] outside a tokio runtime, or a
    /// validation error for bad timing, resources or cue settings. Nothing
    /// is locked or spawned on error.
    pub fn start(self) -> Result<GateHandle, GateError> {
        let runtime = Handle::try_current().map_err(|_| GateError::NoRuntime)?;

        self.timing.validate().map_err(GateError::InvalidTiming)?;
        self.cue_config.validate().map_err(GateError::InvalidCue)?;
        let resources = match self.resources {
            Some(resources) => resources,
            None => self.manifest.to_list()?,
        };
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(FsFetcher::new(DEFAULT_ASSET_ROOT)));
        let document = self.document.unwrap_or_else(Document::loaded);
        let audio_cue = self.audio_cue.unwrap_or_else(|| Arc::new(SilentCue));
        let timing = self.timing;

        let log = Arc::new(EventLog::new());
        let started = log.started();

        let scroll = ScrollLock::acquire(Arc::new(document.clone()));
        log.record(|elapsed_ms| RevealEvent::ScrollLocked { elapsed_ms });

        let run = GateRun {
            preload: Preloader::start(&resources, &fetcher, &log),
            intro: IntroTimer::starting_at(started, timing.min_intro()),
            page_load: PageLoadWatcher::new(&document),
            arbiter: Arbiter::new(started + timing.safety_ceiling()),
            dismiss_delay: timing.dismiss_delay(),
            audio_cue,
            cue_config: self.cue_config,
        };

        info!(
            resources = resources.len(),
            min_intro_ms = timing.min_intro_ms(),
            safety_ceiling_ms = timing.safety_ceiling_ms(),
            dismiss_delay_ms = timing.dismiss_delay_ms(),
            "reveal gate started"
        );

        let shared = Arc::new(GateShared::new(log, scroll));
        let driver = runtime
            .spawn({
                let shared = Arc::clone(&shared);
                async move {
                    tokio::select! {
                        () = shared.cancel.cancelled() => {},
                        () = drive(&shared, run) => {},
                    }
                    shared.mark_finished();
                }
            })
            .abort_handle();

        Ok(GateHandle { shared, driver })
    }
}

impl std::fmt::Debug for RevealGateBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealGateBuilder")
            .field("timing", &self.timing)
            .field("resources", &self.resources)
            .field("cue_config", &self.cue_config)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Driver
// =============================================================================

/// Everything the driver task owns.
struct GateRun {
    preload: PreloadHandle,
    intro: IntroTimer,
    page_load: PageLoadWatcher,
    arbiter: Arbiter,
    dismiss_delay: Duration,
    audio_cue: Arc<dyn AudioCue>,
    cue_config: CueConfig,
}

async fn drive(shared: &GateShared, run: GateRun) {
    let GateRun {
        preload,
        intro,
        page_load,
        arbiter,
        dismiss_delay,
        audio_cue,
        cue_config,
    } = run;
    let log = &shared.log;
    let unsettled = preload.pending_counter();

    let primary = async {
        let (report, (), ()) = tokio::join!(
            preload.settled(),
            async {
                intro.elapsed().await;
                log.record(|elapsed_ms| RevealEvent::IntroElapsed { elapsed_ms });
            },
            async {
                page_load.loaded().await;
                log.record(|elapsed_ms| RevealEvent::PageLoaded { elapsed_ms });
            },
        );
        report
    };

    let verdict = arbiter.decide(primary).await;
    let path = verdict.path();
    if path == GatePath::Safety {
        warn!(
            unsettled = unsettled.load(std::sync::atomic::Ordering::SeqCst),
            elapsed_ms = log.elapsed_ms(),
            "safety ceiling reached before preload, intro and page load settled"
        );
    }
    let preload = match verdict {
        Verdict::Primary(report) => Some(report),
        Verdict::Safety => None,
    };

    if !shared.settle_race(path, preload) {
        return;
    }
    sequencer::dismiss(shared, dismiss_delay, audio_cue.as_ref(), &cue_config).await;
}

// =============================================================================
// Shared State
// =============================================================================

struct GateCore {
    state: GateState,
    torn_down: bool,
    cue_claimed: bool,
    report: RevealReport,
}

/// State shared between the driver task and the handle.
pub(crate) struct GateShared {
    core: Mutex<GateCore>,
    state_tx: watch::Sender<GateState>,
    ready_tx: watch::Sender<bool>,
    finished_tx: watch::Sender<bool>,
    log: Arc<EventLog>,
    scroll: ScrollLock,
    cancel: CancellationToken,
}

impl GateShared {
    fn new(log: Arc<EventLog>, scroll: ScrollLock) -> Self {
        Self {
            core: Mutex::new(GateCore {
                state: GateState::Pending,
                torn_down: false,
                cue_claimed: false,
                report: RevealReport::pending(),
            }),
            state_tx: watch::channel(GateState::Pending).0,
            ready_tx: watch::channel(false).0,
            finished_tx: watch::channel(false).0,
            log,
            scroll,
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies one forward transition. Must be called with the core locked.
    fn transition(&self, core: &mut GateCore, next: GateState) -> bool {
        if core.torn_down {
            debug!(to = %next, "transition ignored after teardown");
            return false;
        }
        let from = core.state;
        match from.advance_to(next) {
            Ok(to) => {
                let elapsed_ms = self.log.elapsed_ms();
                core.state = to;
                core.report.final_state = to;
                match to {
                    GateState::ReadyToDismiss => core.report.ready_to_dismiss_ms = Some(elapsed_ms),
                    GateState::Dismissed => core.report.dismissed_ms = Some(elapsed_ms),
                    GateState::Pending | GateState::Dismissing => {},
                }
                self.log.record(|elapsed_ms| RevealEvent::StateChanged {
                    from,
                    to,
                    elapsed_ms,
                });
                self.state_tx.send_replace(to);
                info!(from = %from, to = %to, elapsed_ms, "gate state changed");
                true
            },
            Err(e) => {
                debug!(error = %e, "transition rejected");
                false
            },
        }
    }

    /// Advances the gate one step.
    pub(crate) fn advance(&self, next: GateState) -> bool {
        let mut core = self.lock();
        self.transition(&mut core, next)
    }

    /// Records the arbiter's verdict and enters `ReadyToDismiss`.
    fn settle_race(&self, path: GatePath, preload: Option<PreloadReport>) -> bool {
        let mut core = self.lock();
        if core.torn_down || core.state != GateState::Pending {
            return false;
        }
        core.report.winning_path = Some(path);
        core.report.preload = preload;
        self.log.record(|elapsed_ms| RevealEvent::PathWon { path, elapsed_ms });
        self.transition(&mut core, GateState::ReadyToDismiss)
    }

    /// Enters `Dismissed`, releases scrolling to `auto` and exposes ready.
    pub(crate) fn finish_dismissal(&self) -> bool {
        let mut core = self.lock();
        if !self.transition(&mut core, GateState::Dismissed) {
            return false;
        }
        self.release_scroll(&mut core, OverflowStyle::Auto);
        self.ready_tx.send_if_modified(|ready| {
            let changed = !*ready;
            *ready = true;
            changed
        });
        true
    }

    fn release_scroll(&self, core: &mut GateCore, style: OverflowStyle) {
        if self.scroll.release(style) {
            core.report.scroll_release = Some(style);
            self.log
                .record(|elapsed_ms| RevealEvent::ScrollReleased { style, elapsed_ms });
        }
    }

    /// Claims the single cue attempt. Returns `false` if it was already
    /// claimed or the gate is torn down.
    pub(crate) fn claim_cue(&self) -> bool {
        let mut core = self.lock();
        if core.torn_down || core.cue_claimed {
            return false;
        }
        core.cue_claimed = true;
        true
    }

    /// Records the cue outcome. Failures are logged and otherwise ignored.
    pub(crate) fn record_cue(&self, result: Result<(), CueError>) {
        let mut core = self.lock();
        if core.torn_down {
            return;
        }
        match result {
            Ok(()) => {
                core.report.cue = CueStatus::Played;
                self.log
                    .record(|elapsed_ms| RevealEvent::CuePlayed { elapsed_ms });
                debug!("dismissal cue played");
            },
            Err(e) => {
                let reason = e.to_string();
                warn!(error = %reason, "dismissal cue failed");
                core.report.cue = CueStatus::Failed {
                    reason: reason.clone(),
                };
                self.log
                    .record(|elapsed_ms| RevealEvent::CueFailed { reason, elapsed_ms });
            },
        }
    }

    fn mark_finished(&self) {
        self.finished_tx.send_replace(true);
    }

    fn teardown(&self) -> bool {
        {
            let mut core = self.lock();
            if core.torn_down {
                return false;
            }
            core.torn_down = true;
            core.report.torn_down = true;
            let state = core.state;
            self.log
                .record(|elapsed_ms| RevealEvent::TornDown { state, elapsed_ms });
            self.release_scroll(&mut core, OverflowStyle::Unset);
            info!(state = %state, elapsed_ms = self.log.elapsed_ms(), "gate torn down");
        }
        self.cancel.cancel();
        self.log.close();
        self.mark_finished();
        true
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Caller-side handle to a running gate.
///
/// Dropping the handle tears the gate down.
pub struct GateHandle {
    shared: Arc<GateShared>,
    driver: AbortHandle,
}

impl GateHandle {
    /// Returns the current gate state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.shared.lock().state
    }

    /// Returns `true` once the gate is dismissed.
    ///
    /// This is the "ready" value the UI reads; it changes exactly once,
    /// from `false` to `true`.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.shared.ready_tx.borrow()
    }

    /// Subscribes to the "ready" value.
    #[must_use]
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.shared.ready_tx.subscribe()
    }

    /// Subscribes to gate state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<GateState> {
        self.shared.state_tx.subscribe()
    }

    /// Waits until the gate is dismissed.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::TornDown`] if the gate is torn down first.
    pub async fn wait_ready(&self) -> Result<(), GateError> {
        let mut ready = self.shared.ready_tx.subscribe();
        tokio::select! {
            ok = async move { ready.wait_for(|ready| *ready).await.is_ok() } => {
                if ok { Ok(()) } else { Err(self.torn_down_error()) }
            },
            () = self.shared.cancel.cancelled() => {
                if self.is_ready() { Ok(()) } else { Err(self.torn_down_error()) }
            },
        }
    }

    /// Waits until the gate is dismissed and returns the report at that
    /// moment. The cue may still be in flight.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::TornDown`] if the gate is torn down first.
    pub async fn wait_dismissed(&self) -> Result<RevealReport, GateError> {
        self.wait_ready().await?;
        Ok(self.report())
    }

    /// Waits until the gate has nothing left to do: dismissed with the cue
    /// settled, or torn down.
    pub async fn wait_finished(&self) -> RevealReport {
        let mut finished = self.shared.finished_tx.subscribe();
        // The sender lives as long as `self`, so this cannot close early.
        let _ = finished.wait_for(|finished| *finished).await;
        self.report()
    }

    /// Returns a snapshot of the gate's report.
    #[must_use]
    pub fn report(&self) -> RevealReport {
        self.shared.lock().report.clone()
    }

    /// Tears the gate down.
    ///
    /// Idempotent: returns `true` only for the call that tore it down.
    pub fn teardown(&self) -> bool {
        let torn_down = self.shared.teardown();
        self.driver.abort();
        torn_down
    }

    /// Returns `true` once the gate has been torn down.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.shared.lock().torn_down
    }

    /// Takes every buffered event, oldest first.
    #[must_use]
    pub fn drain_events(&self) -> Vec<RevealEvent> {
        self.shared.log.drain()
    }

    /// Returns the time since the gate was started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.shared.log.elapsed()
    }

    fn torn_down_error(&self) -> GateError {
        GateError::TornDown {
            state: self.state(),
        }
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for GateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateHandle")
            .field("state", &self.state())
            .field("ready", &self.is_ready())
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
