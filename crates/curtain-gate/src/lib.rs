#![allow(clippy::doc_markdown)]

//! curtain-gate - Reveal gate runtime
//!
//! Drives one intro "curtain" from construction to dismissal on a tokio
//! runtime. The gate races two composite signals:
//!
//! ```text
//!  primary:  preload(all resources) AND intro floor AND page load
//!  safety:   safety ceiling
//!
//!  first to settle -> ReadyToDismiss -> Dismissing -> (dismiss delay)
//!                  -> Dismissed: scroll released, ready = true, cue fired
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use curtain_core::RevealConfig;
//! use curtain_gate::{Document, FsFetcher, RevealGate};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RevealConfig::from_file("curtain.toml".as_ref())?;
//! let document = Document::default();
//!
//! let gate = RevealGate::builder(&config)
//!     .fetcher(Arc::new(FsFetcher::new("public")))
//!     .document(document.clone())
//!     .start()?;
//!
//! // The host finishes loading the page.
//! document.mark_ready_state(curtain_core::ReadyState::Complete);
//!
//! let report = gate.wait_dismissed().await?;
//! println!("dismissed after {:?}ms", report.dismissed_ms);
//! # Ok(())
//! # }
//! ```

pub mod arbiter;
pub mod cue;
pub mod document;
pub mod events;
pub mod fetch;
pub mod gate;
pub mod intro;
pub mod page_load;
pub mod preload;
pub mod scroll;
mod sequencer;
#[cfg(any(test, feature = "test-util"))]
pub mod test_support;

pub use arbiter::{Arbiter, Verdict};
pub use cue::{AssetCue, AudioCue, CueError, SilentCue};
pub use document::{Document, ScrollSurface};
pub use events::EventLog;
pub use fetch::{FetchError, FsFetcher, HttpFetcher, ResourceFetcher};
pub use gate::{GateError, GateHandle, RevealGate, RevealGateBuilder};
pub use intro::IntroTimer;
pub use page_load::PageLoadWatcher;
pub use preload::{PreloadHandle, Preloader};
pub use scroll::ScrollLock;
