//! Gate timing policy.
//!
//! This module defines the `TimingPolicy` type, the three product-tuning
//! delays that shape a reveal:
//!
//! ```text
//! TimingPolicy
//!     |
//!     +-- min_intro_ms: floor before the intro may be dismissed
//!     +-- safety_ceiling_ms: fallback that dismisses regardless of preload
//!     +-- dismiss_delay_ms: fade-out window between arbiter and "ready"
//! ```
//!
//! All three are measured in milliseconds. The floor and the ceiling are
//! measured from gate construction; the dismissal delay from the moment the
//! arbiter fires.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default minimum intro duration (2.0s loading bar + 3.5s curtain open).
pub const DEFAULT_MIN_INTRO_MS: u64 = 5_500;

/// Default safety ceiling.
pub const DEFAULT_SAFETY_CEILING_MS: u64 = 12_000;

/// Default fade-out window after the arbiter fires.
pub const DEFAULT_DISMISS_DELAY_MS: u64 = 2_500;

/// Upper bound for every timing value (10 minutes).
///
/// An intro longer than this is a misconfiguration, not a design choice.
pub const MAX_TIMING_MS: u64 = 600_000;

/// Timing configuration for one reveal gate.
///
/// # Example
///
/// ```rust
/// use curtain_core::timing::TimingPolicy;
///
/// let policy = TimingPolicy::builder()
///     .min_intro_ms(3_000)
///     .safety_ceiling_ms(8_000)
///     .build();
///
/// assert_eq!(policy.min_intro_ms(), 3_000);
/// assert_eq!(policy.dismiss_delay_ms(), 2_500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingPolicy {
    /// Minimum visible intro duration.
    min_intro_ms: u64,

    /// Fallback delay after which the intro is dismissed regardless of
    /// resource or page-load state.
    safety_ceiling_ms: u64,

    /// Delay between the arbiter firing and the gate reporting ready.
    dismiss_delay_ms: u64,
}

impl TimingPolicy {
    /// Creates a new policy builder.
    #[must_use]
    pub const fn builder() -> TimingPolicyBuilder {
        TimingPolicyBuilder::new()
    }

    /// Validates policy invariants.
    ///
    /// # Errors
    ///
    /// Returns an error string if any value is out of bounds, if the safety
    /// ceiling is zero, or if the intro floor exceeds the ceiling (the
    /// primary path could then never win the race).
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("min_intro_ms", self.min_intro_ms),
            ("safety_ceiling_ms", self.safety_ceiling_ms),
            ("dismiss_delay_ms", self.dismiss_delay_ms),
        ] {
            if value > MAX_TIMING_MS {
                return Err(format!(
                    "{field} ({value}) above maximum ({MAX_TIMING_MS})"
                ));
            }
        }
        if self.safety_ceiling_ms == 0 {
            return Err("safety_ceiling_ms must be greater than zero".to_string());
        }
        if self.min_intro_ms > self.safety_ceiling_ms {
            return Err(format!(
                "min_intro_ms ({}) exceeds safety_ceiling_ms ({})",
                self.min_intro_ms, self.safety_ceiling_ms
            ));
        }
        Ok(())
    }

    /// Returns the minimum intro duration in milliseconds.
    #[must_use]
    pub const fn min_intro_ms(&self) -> u64 {
        self.min_intro_ms
    }

    /// Returns the safety ceiling in milliseconds.
    #[must_use]
    pub const fn safety_ceiling_ms(&self) -> u64 {
        self.safety_ceiling_ms
    }

    /// Returns the dismissal delay in milliseconds.
    #[must_use]
    pub const fn dismiss_delay_ms(&self) -> u64 {
        self.dismiss_delay_ms
    }

    /// Returns the minimum intro duration.
    #[must_use]
    pub const fn min_intro(&self) -> Duration {
        Duration::from_millis(self.min_intro_ms)
    }

    /// Returns the safety ceiling.
    #[must_use]
    pub const fn safety_ceiling(&self) -> Duration {
        Duration::from_millis(self.safety_ceiling_ms)
    }

    /// Returns the dismissal delay.
    #[must_use]
    pub const fn dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.dismiss_delay_ms)
    }

    /// Earliest time, measured from construction, at which the gate can
    /// report ready.
    #[must_use]
    pub const fn earliest_ready_ms(&self) -> u64 {
        self.min_intro_ms + self.dismiss_delay_ms
    }

    /// Latest time, measured from construction, at which the gate reports
    /// ready.
    #[must_use]
    pub const fn latest_ready_ms(&self) -> u64 {
        self.safety_ceiling_ms + self.dismiss_delay_ms
    }
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            min_intro_ms: DEFAULT_MIN_INTRO_MS,
            safety_ceiling_ms: DEFAULT_SAFETY_CEILING_MS,
            dismiss_delay_ms: DEFAULT_DISMISS_DELAY_MS,
        }
    }
}

/// Builder for [`TimingPolicy`].
#[derive(Debug, Clone)]
pub struct TimingPolicyBuilder {
    min_intro_ms: u64,
    safety_ceiling_ms: u64,
    dismiss_delay_ms: u64,
}

impl TimingPolicyBuilder {
    /// Creates a new builder with the design defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_intro_ms: DEFAULT_MIN_INTRO_MS,
            safety_ceiling_ms: DEFAULT_SAFETY_CEILING_MS,
            dismiss_delay_ms: DEFAULT_DISMISS_DELAY_MS,
        }
    }

    /// Sets the minimum intro duration in milliseconds.
    #[must_use]
    pub const fn min_intro_ms(mut self, ms: u64) -> Self {
        self.min_intro_ms = ms;
        self
    }

    /// Sets the safety ceiling in milliseconds.
    #[must_use]
    pub const fn safety_ceiling_ms(mut self, ms: u64) -> Self {
        self.safety_ceiling_ms = ms;
        self
    }

    /// Sets the dismissal delay in milliseconds.
    #[must_use]
    pub const fn dismiss_delay_ms(mut self, ms: u64) -> Self {
        self.dismiss_delay_ms = ms;
        self
    }

    /// Builds the policy, clamping every value to [`MAX_TIMING_MS`].
    #[must_use]
    pub const fn build(self) -> TimingPolicy {
        TimingPolicy {
            min_intro_ms: clamp_timing(self.min_intro_ms),
            safety_ceiling_ms: clamp_timing(self.safety_ceiling_ms),
            dismiss_delay_ms: clamp_timing(self.dismiss_delay_ms),
        }
    }

    /// Builds the policy with validation.
    ///
    /// # Errors
    ///
    /// Returns an error string if any invariant is violated after clamping.
    pub fn try_build(self) -> Result<TimingPolicy, String> {
        let policy = self.build();
        policy.validate()?;
        Ok(policy)
    }
}

impl Default for TimingPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const fn clamp_timing(ms: u64) -> u64 {
    if ms > MAX_TIMING_MS {
        MAX_TIMING_MS
    } else {
        ms
    }
}
