//! Configuration for the gravity correction system.
//!
//! A [`GravityConfig`] is loaded once at fabric construction and validated
//! there; it is never re-validated per call. Invalid configuration is a fatal
//! [`GravityError::Configuration`](crate::error::GravityError) and the fabric
//! is not usable until reconstructed.

pub mod constants;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GravityError, Result};

use constants::{diagnostics, learning, pillar};

// ============================================================================
// PILLAR BOUNDS
// ============================================================================

/// Inclusive value bounds for a single pillar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PillarBounds {
    /// Lower bound (inclusive).
    pub min: f32,
    /// Upper bound (inclusive).
    pub max: f32,
}

impl PillarBounds {
    /// Create bounds without validation; validity is checked once at fabric
    /// construction via [`GravityConfig::validate`].
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp a value into these bounds.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub(crate) fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(GravityError::configuration(format!(
                "bounds for pillar '{name}' must be finite, got [{}, {}]",
                self.min, self.max
            )));
        }
        if self.min >= self.max {
            return Err(GravityError::configuration(format!(
                "bounds for pillar '{name}' are degenerate: min {} >= max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for PillarBounds {
    fn default() -> Self {
        Self {
            min: pillar::DEFAULT_MIN,
            max: pillar::DEFAULT_MAX,
        }
    }
}

// ============================================================================
// INTERACTION RULES
// ============================================================================

/// A configured inter-pillar interaction.
///
/// The pillar store only executes rules; the domain semantics (which pillar
/// couples to which) are supplied entirely by configuration. Rules are applied
/// in configured order and later rules observe the effects of earlier ones.
/// Every affected pillar is re-clamped to its bounds after each rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionRule {
    /// `source` pushes `target` toward the source's current value by
    /// `coupling` times the remaining distance.
    Push {
        /// Pillar whose value supplies the push direction
        source: String,
        /// Pillar being pushed
        target: String,
        /// Fraction of the distance covered per application, in `[0, 1]`
        coupling: f32,
    },

    /// `target` relaxes toward a fixed `setpoint` by `rate` times the
    /// remaining distance. This is the decay-to-baseline rule.
    DriveToward {
        /// Pillar being relaxed
        target: String,
        /// Fixed value the pillar relaxes toward
        setpoint: f32,
        /// Fraction of the distance covered per application, in `[0, 1]`
        rate: f32,
    },

    /// `source` pushes `target` toward the target's lower bound in
    /// proportion to the source's current value.
    Suppress {
        /// Pillar whose value scales the suppression
        source: String,
        /// Pillar being suppressed
        target: String,
        /// Suppression strength per application, in `[0, 1]`
        coupling: f32,
    },
}

impl InteractionRule {
    /// Pillar names this rule reads or writes.
    pub fn referenced_pillars(&self) -> Vec<&str> {
        match self {
            Self::Push { source, target, .. } => vec![source.as_str(), target.as_str()],
            Self::DriveToward { target, .. } => vec![target.as_str()],
            Self::Suppress { source, target, .. } => vec![source.as_str(), target.as_str()],
        }
    }

    fn validate(&self) -> Result<()> {
        let (factor, label) = match self {
            Self::Push { coupling, .. } => (*coupling, "coupling"),
            Self::DriveToward { setpoint, rate, .. } => {
                if !setpoint.is_finite() {
                    return Err(GravityError::configuration(format!(
                        "interaction setpoint must be finite, got {setpoint}"
                    )));
                }
                (*rate, "rate")
            }
            Self::Suppress { coupling, .. } => (*coupling, "coupling"),
        };
        if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            return Err(GravityError::configuration(format!(
                "interaction {label} must be in [0, 1], got {factor}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC THRESHOLDS
// ============================================================================

/// Thresholds driving the qualitative suggestions in the diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticThresholds {
    /// Average residual magnitude above which the underlying prediction model
    /// should be reviewed.
    pub residual_magnitude: f32,
    /// Dominance fraction above which a degenerate/overfit weight is
    /// suspected.
    pub dominance: f32,
    /// Instability score above which a weight reset is suggested.
    pub instability: f32,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            residual_magnitude: diagnostics::RESIDUAL_MAGNITUDE_THRESHOLD,
            dominance: diagnostics::DOMINANCE_THRESHOLD,
            instability: diagnostics::INSTABILITY_THRESHOLD,
        }
    }
}

impl DiagnosticThresholds {
    fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("residual_magnitude", self.residual_magnitude),
            ("dominance", self.dominance),
            ("instability", self.instability),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GravityError::configuration(format!(
                    "diagnostic threshold {label} must be a positive finite value, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// GRAVITY CONFIG
// ============================================================================

/// Complete configuration for one [`GravityFabric`](crate::fabric::GravityFabric).
///
/// Loaded once at construction. [`GravityConfig::validate`] is the single
/// validation point; per-call paths never re-check these invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityConfig {
    /// Pillars registered at construction. Further pillars may still be
    /// registered at runtime through `add_pillar` / first write.
    pub pillar_names: Vec<String>,

    /// Per-pillar bounds; pillars without an entry use the default `[0, 1]`.
    #[serde(default)]
    pub bounds: HashMap<String, PillarBounds>,

    /// Cap shared by every rolling history in the fabric (pillar history,
    /// residual history, metric windows).
    pub max_history: usize,

    /// Learning rate (eta). Must be > 0.
    pub eta: f32,

    /// L2-style regularization strength (lambda). Must be >= 0.
    pub lambda: f32,

    /// Step-time scaling of the effective learning rate. Must be > 0.
    pub dt: f32,

    /// Symbolic state dimensionality scaling of the effective learning rate.
    /// Must be >= 1.
    pub state_dimensionality: usize,

    /// Optional symmetric clamp on learned weights: after every update each
    /// weight is clamped to `[-max_abs_weight, max_abs_weight]`.
    #[serde(default)]
    pub max_abs_weight: Option<f32>,

    /// Strict reads: querying an unregistered pillar fails with
    /// `UnknownPillar` instead of returning the documented default.
    #[serde(default)]
    pub strict_reads: bool,

    /// Write corrected pillar values back into the world-state view after a
    /// step that was given one.
    #[serde(default = "default_write_back")]
    pub write_back: bool,

    /// Inter-pillar interaction rules, applied in order on every step.
    #[serde(default)]
    pub interaction_rules: Vec<InteractionRule>,

    /// Diagnostic report thresholds.
    #[serde(default)]
    pub thresholds: DiagnosticThresholds,
}

fn default_write_back() -> bool {
    true
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            pillar_names: Vec::new(),
            bounds: HashMap::new(),
            max_history: pillar::DEFAULT_MAX_HISTORY,
            eta: learning::DEFAULT_ETA,
            lambda: learning::DEFAULT_LAMBDA,
            dt: learning::DEFAULT_DT,
            state_dimensionality: learning::DEFAULT_STATE_DIMENSIONALITY,
            max_abs_weight: None,
            strict_reads: false,
            write_back: true,
            interaction_rules: Vec::new(),
            thresholds: DiagnosticThresholds::default(),
        }
    }
}

impl GravityConfig {
    /// Start building a configuration from the documented defaults.
    pub fn builder() -> GravityConfigBuilder {
        GravityConfigBuilder {
            config: Self::default(),
        }
    }

    /// Bounds for a named pillar, falling back to the default `[0, 1]`.
    pub fn bounds_for(&self, name: &str) -> PillarBounds {
        self.bounds.get(name).copied().unwrap_or_default()
    }

    /// Validate the full configuration.
    ///
    /// # Errors
    ///
    /// `Configuration` on the first violated invariant: non-positive or
    /// non-finite `eta`/`dt`, negative or non-finite `lambda`, zero
    /// `state_dimensionality` or `max_history`, degenerate bounds, rule
    /// factors outside `[0, 1]`, or a rule referencing a pillar that is not
    /// in `pillar_names`.
    pub fn validate(&self) -> Result<()> {
        if !self.eta.is_finite() || self.eta <= 0.0 {
            return Err(GravityError::configuration(format!(
                "eta must be a positive finite value, got {}",
                self.eta
            )));
        }
        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(GravityError::configuration(format!(
                "lambda must be a non-negative finite value, got {}",
                self.lambda
            )));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(GravityError::configuration(format!(
                "dt must be a positive finite value, got {}",
                self.dt
            )));
        }
        if self.state_dimensionality == 0 {
            return Err(GravityError::configuration(
                "state_dimensionality must be >= 1",
            ));
        }
        if self.max_history == 0 {
            return Err(GravityError::configuration("max_history must be >= 1"));
        }
        if let Some(clamp) = self.max_abs_weight {
            if !clamp.is_finite() || clamp <= 0.0 {
                return Err(GravityError::configuration(format!(
                    "max_abs_weight must be a positive finite value, got {clamp}"
                )));
            }
        }
        for (name, bounds) in &self.bounds {
            bounds.validate(name)?;
        }
        self.thresholds.validate()?;
        for rule in &self.interaction_rules {
            rule.validate()?;
            for name in rule.referenced_pillars() {
                if !self.pillar_names.iter().any(|p| p == name) {
                    return Err(GravityError::configuration(format!(
                        "interaction rule references unregistered pillar '{name}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Chained builder for [`GravityConfig`].
#[derive(Debug, Clone)]
pub struct GravityConfigBuilder {
    config: GravityConfig,
}

impl GravityConfigBuilder {
    /// Register a pillar with default `[0, 1]` bounds.
    pub fn pillar(mut self, name: impl Into<String>) -> Self {
        self.config.pillar_names.push(name.into());
        self
    }

    /// Register a pillar with explicit bounds.
    pub fn pillar_with_bounds(mut self, name: impl Into<String>, min: f32, max: f32) -> Self {
        let name = name.into();
        self.config
            .bounds
            .insert(name.clone(), PillarBounds::new(min, max));
        self.config.pillar_names.push(name);
        self
    }

    /// Set the learning rate.
    pub fn eta(mut self, eta: f32) -> Self {
        self.config.eta = eta;
        self
    }

    /// Set the regularization strength.
    pub fn lambda(mut self, lambda: f32) -> Self {
        self.config.lambda = lambda;
        self
    }

    /// Set the step-time scaling.
    pub fn dt(mut self, dt: f32) -> Self {
        self.config.dt = dt;
        self
    }

    /// Set the state dimensionality scaling.
    pub fn state_dimensionality(mut self, dim: usize) -> Self {
        self.config.state_dimensionality = dim;
        self
    }

    /// Set the shared rolling-history cap.
    pub fn max_history(mut self, cap: usize) -> Self {
        self.config.max_history = cap;
        self
    }

    /// Enable the symmetric weight clamp.
    pub fn max_abs_weight(mut self, clamp: f32) -> Self {
        self.config.max_abs_weight = Some(clamp);
        self
    }

    /// Enable strict reads.
    pub fn strict_reads(mut self, strict: bool) -> Self {
        self.config.strict_reads = strict;
        self
    }

    /// Control write-back of pillar values into the world-state view.
    pub fn write_back(mut self, write_back: bool) -> Self {
        self.config.write_back = write_back;
        self
    }

    /// Append an interaction rule.
    pub fn rule(mut self, rule: InteractionRule) -> Self {
        self.config.interaction_rules.push(rule);
        self
    }

    /// Override the diagnostic thresholds.
    pub fn thresholds(mut self, thresholds: DiagnosticThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Finish building. Validation happens at fabric construction.
    pub fn build(self) -> GravityConfig {
        self.config
    }
}
