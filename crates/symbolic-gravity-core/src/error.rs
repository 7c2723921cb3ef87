//! Error types for symbolic-gravity-core.
//!
//! This module defines the central error type used throughout the crate:
//!
//! - [`GravityError`]: unified error for all fabric, store and engine failures
//! - [`Result`]: crate-wide result alias
//!
//! Numeric guard conditions (a weight update skipped because of a non-finite
//! intermediate) are deliberately NOT errors: they are recovered locally,
//! logged at WARN level and counted in the fabric metrics so that
//! `generate_diagnostic_report` can surface systemic instability even though
//! no individual call fails.

use thiserror::Error;

/// Unified error type for symbolic gravity operations.
///
/// # Recoverability
///
/// Per-call value errors (`InvalidValue`, `UnknownPillar`) are local to the
/// failing call and never corrupt shared state; the caller may retry with
/// corrected input. `Configuration` errors are raised once at construction
/// and are fatal: the fabric is not usable until reconstructed with a valid
/// configuration.
#[derive(Debug, Error)]
pub enum GravityError {
    /// Non-finite input to a pillar write.
    ///
    /// The write is rejected without mutating state.
    #[error("Invalid value for pillar '{pillar}': {value} is not finite")]
    InvalidValue {
        /// The pillar the write targeted
        pillar: String,
        /// The rejected value (NaN or infinite)
        value: f32,
    },

    /// Strict-mode read of a pillar that was never registered.
    ///
    /// Non-strict mode instead returns the documented default
    /// ([`crate::config::constants::pillar::DEFAULT_VALUE`]) and does not
    /// error.
    #[error("Unknown pillar: '{0}'")]
    UnknownPillar(String),

    /// Invalid configuration at construction time.
    ///
    /// # When This Occurs
    ///
    /// - `eta <= 0` or non-finite
    /// - `lambda < 0` or non-finite
    /// - degenerate pillar bounds (`min >= max`, non-finite)
    /// - interaction rule referencing an unregistered pillar
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GravityError {
    /// Check if this error is recoverable by retrying with corrected input.
    ///
    /// Configuration errors require reconstructing the fabric and are not
    /// recoverable per call.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration(_))
    }

    /// Create a configuration error from a message.
    #[inline]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid-value error for a pillar write.
    #[inline]
    pub fn invalid_value(pillar: impl Into<String>, value: f32) -> Self {
        Self::InvalidValue {
            pillar: pillar.into(),
            value,
        }
    }
}

/// Result type alias for symbolic gravity operations.
pub type Result<T> = std::result::Result<T, GravityError>;
