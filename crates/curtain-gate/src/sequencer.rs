//! Dismissal sequencer.
//!
//! Runs once the arbiter has moved the gate to `ReadyToDismiss`:
//!
//! ```text
//! ReadyToDismiss --(now)--> Dismissing --(dismiss_delay)--> Dismissed
//!                                                             |
//!                                  scroll released to `auto`, ready = true
//!                                                             |
//!                                              cue fired (best-effort)
//! ```
//!
//! Every step goes through the gate's guarded transitions, so running the
//! sequence twice, or after teardown, changes nothing.

use std::time::Duration;

use curtain_core::config::CueConfig;
use curtain_core::state::GateState;

use crate::cue::{AudioCue, play_bounded};
use crate::gate::GateShared;

/// Runs the dismissal sequence to completion.
pub(crate) async fn dismiss(
    shared: &GateShared,
    delay: Duration,
    cue: &dyn AudioCue,
    cue_config: &CueConfig,
) {
    if !shared.advance(GateState::Dismissing) {
        return;
    }
    tokio::time::sleep(delay).await;

    if !shared.finish_dismissal() {
        return;
    }
    if !shared.claim_cue() {
        return;
    }
    let result = play_bounded(cue, cue_config).await;
    shared.record_cue(result);
}
