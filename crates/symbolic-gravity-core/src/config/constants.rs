//! Centralized default constants for the gravity correction system.
//!
//! All documented defaults live here so that configuration, tests and
//! diagnostics agree on a single source of truth. The threshold values are
//! empirically chosen; they are exposed as configurable defaults through
//! [`crate::config::GravityConfig`] rather than hardcoded at use sites.

/// Pillar value and history defaults.
pub mod pillar {
    /// Default lower bound of a pillar value.
    pub const DEFAULT_MIN: f32 = 0.0;

    /// Default upper bound of a pillar value.
    pub const DEFAULT_MAX: f32 = 1.0;

    /// Documented default returned when reading a pillar that has never been
    /// set (non-strict mode). Downstream diagnostics assume this exact
    /// constant; it is a deliberate contract, not a fallback.
    pub const DEFAULT_VALUE: f32 = 0.5;

    /// Default cap on every rolling history in the system (pillar history,
    /// residual history, metric windows).
    pub const DEFAULT_MAX_HISTORY: usize = 1000;
}

/// Learning-rule defaults for the residual correction engine.
pub mod learning {
    /// Default learning rate (eta). Must be > 0.
    pub const DEFAULT_ETA: f32 = 0.05;

    /// Default L2-style regularization strength (lambda). Must be >= 0.
    pub const DEFAULT_LAMBDA: f32 = 0.01;

    /// Default step-time scaling applied to the effective learning rate.
    ///
    /// With `dt = 1.0` and `state_dimensionality = 1` the effective rate
    /// equals `eta` exactly.
    pub const DEFAULT_DT: f32 = 1.0;

    /// Default symbolic state dimensionality used to scale the effective
    /// learning rate when one engine serves vectors of different sizes.
    pub const DEFAULT_STATE_DIMENSIONALITY: usize = 1;
}

/// Diagnostic thresholds.
///
/// These are empirically chosen constants with no documented derivation;
/// treat them as starting points, not load-bearing truths.
pub mod diagnostics {
    /// Average residual magnitude above which the report suggests reviewing
    /// the underlying prediction model rather than the correction layer.
    pub const RESIDUAL_MAGNITUDE_THRESHOLD: f32 = 2.0;

    /// Fraction of recent steps dominated by a single pillar above which the
    /// report suggests checking for a degenerate or overfit weight.
    pub const DOMINANCE_THRESHOLD: f32 = 0.8;

    /// Instability score above which the report suggests resetting the
    /// learned weights.
    pub const INSTABILITY_THRESHOLD: f32 = 0.7;

    /// Guard on the improvement computation: below this original error
    /// magnitude, `improvement_pct` reports 0.0 instead of dividing.
    pub const IMPROVEMENT_EPSILON: f32 = 1e-6;
}
