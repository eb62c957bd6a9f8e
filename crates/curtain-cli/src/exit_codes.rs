//! Process exit codes.
//!
//! - `0`: success
//! - `1`: generic error
//! - `10`: configuration or argument validation failed
//! - `12`: asset root or origin not found
//! - `30`: the gate was torn down before it dismissed

/// Exit codes returned by `curtain`.
pub mod codes {
    /// Success.
    pub const SUCCESS: u8 = 0;
    /// Generic error.
    pub const GENERIC_ERROR: u8 = 1;
    /// Validation error.
    pub const VALIDATION_ERROR: u8 = 10;
    /// Asset root or origin not found.
    pub const NOT_FOUND: u8 = 12;
    /// Gate torn down before dismissal.
    pub const TORN_DOWN: u8 = 30;
}
