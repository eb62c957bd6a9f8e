#![allow(clippy::doc_markdown)]

//! curtain-core - Reveal gate data model
//!
//! This crate holds the synchronous, runtime-free half of the curtain reveal
//! gate: everything that can be described without a clock or an executor.
//! The async runtime that drives a gate lives in `curtain-gate`.
//!
//! # Modules
//!
//! - [`config`]: TOML configuration (`[timing]`, `[resources]`, `[cue]`)
//! - [`timing`]: `TimingPolicy` for the intro floor, safety ceiling and
//!   dismissal delay
//! - [`resource`]: resource lists, per-resource outcomes and preload reports
//! - [`document`]: document ready-state and overflow style values
//! - [`state`]: forward-only gate state machine
//! - [`event`]: events recorded over a gate's lifetime
//! - [`report`]: end-of-life summary of one gate

pub mod config;
pub mod document;
pub mod event;
pub mod report;
pub mod resource;
pub mod state;
pub mod timing;

pub use config::{ConfigError, CueConfig, ResourceManifest, RevealConfig};
pub use document::{OverflowStyle, ReadyState};
pub use event::RevealEvent;
pub use report::{CueStatus, RevealReport};
pub use resource::{
    PreloadReport, ResourceKind, ResourceList, ResourceListError, ResourceOutcome,
    ResourceSettlement,
};
pub use state::{GatePath, GateState, StateTransitionError};
pub use timing::{TimingPolicy, TimingPolicyBuilder};
