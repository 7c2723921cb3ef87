//! Residual correction engine: linear weighted correction with online
//! gradient-style weight updates.
//!
//! The engine is a generic online-learning unit. It has no dependency on the
//! pillar store's internal representation; it only consumes a symbolic state
//! vector (name -> value mapping) and maintains one learned weight per pillar
//! name it has seen.
//!
//! # Update rule
//!
//! For every pillar `p` in the symbol vector:
//!
//! ```text
//! w[p] += eta_eff * residual * v[p] - eta_eff * lambda * w[p]
//! ```
//!
//! a gradient step toward reducing the residual, with shrinkage toward zero
//! to prevent unbounded weight growth. The effective learning rate is
//!
//! ```text
//! eta_eff = eta * dt / state_dimensionality
//! ```
//!
//! so one engine can serve variables with different update frequencies (`dt`)
//! or vector sizes (`state_dimensionality`) without retuning `eta`.
//!
//! # Numeric guards
//!
//! A non-finite symbol value, residual or resulting weight never corrupts the
//! weight map: the affected pillar's update is skipped, a WARN is logged and
//! the skip is counted in the returned [`UpdateOutcome`] so the fabric can
//! aggregate guard pressure into its metrics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::constants::learning;
use crate::config::GravityConfig;
use crate::error::{GravityError, Result};

// ============================================================================
// OUTCOME TYPES
// ============================================================================

/// Result of one correction: the corrected value plus each pillar's
/// contribution `w[p] * v[p]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    /// `predicted + sum of contributions`.
    pub corrected: f32,
    /// Per-pillar contribution to the correction.
    pub contributions: HashMap<String, f32>,
}

impl CorrectionOutcome {
    /// Pillar with the largest absolute contribution in this step, with its
    /// contribution. `None` when every contribution is zero (e.g. all weights
    /// still at their initial value).
    pub fn dominant_pillar(&self) -> Option<(&str, f32)> {
        self.contributions
            .iter()
            .filter(|(_, c)| c.abs() > 0.0)
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
            .map(|(name, c)| (name.as_str(), *c))
    }
}

/// Result of one weight update pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Pillars whose weight was updated.
    pub applied: usize,
    /// Pillars skipped by a numeric guard this pass.
    pub skipped: usize,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Online-learning unit mapping a symbolic state vector to a scalar
/// correction.
///
/// The weight map is mutated only by [`update_weights`](Self::update_weights)
/// and [`reset_weights`](Self::reset_weights); correction application is
/// read-only and deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualCorrectionEngine {
    /// Learned weight per pillar name; names are created lazily at first
    /// update with weight 0.0.
    weights: HashMap<String, f32>,
    eta: f32,
    lambda: f32,
    dt: f32,
    state_dimensionality: usize,
    max_abs_weight: Option<f32>,
}

impl ResidualCorrectionEngine {
    /// Create an engine with explicit learning parameters and the default
    /// `dt` / dimensionality scaling.
    ///
    /// # Errors
    ///
    /// `Configuration` when `eta <= 0`, `lambda < 0` or either is non-finite.
    pub fn new(eta: f32, lambda: f32) -> Result<Self> {
        Self::with_scaling(
            eta,
            lambda,
            learning::DEFAULT_DT,
            learning::DEFAULT_STATE_DIMENSIONALITY,
            None,
        )
    }

    /// Create an engine with full scaling parameters.
    pub fn with_scaling(
        eta: f32,
        lambda: f32,
        dt: f32,
        state_dimensionality: usize,
        max_abs_weight: Option<f32>,
    ) -> Result<Self> {
        if !eta.is_finite() || eta <= 0.0 {
            return Err(GravityError::configuration(format!(
                "eta must be a positive finite value, got {eta}"
            )));
        }
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(GravityError::configuration(format!(
                "lambda must be a non-negative finite value, got {lambda}"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(GravityError::configuration(format!(
                "dt must be a positive finite value, got {dt}"
            )));
        }
        if state_dimensionality == 0 {
            return Err(GravityError::configuration(
                "state_dimensionality must be >= 1",
            ));
        }
        Ok(Self {
            weights: HashMap::new(),
            eta,
            lambda,
            dt,
            state_dimensionality,
            max_abs_weight,
        })
    }

    /// Create an engine from a validated fabric configuration.
    pub fn from_config(config: &GravityConfig) -> Result<Self> {
        Self::with_scaling(
            config.eta,
            config.lambda,
            config.dt,
            config.state_dimensionality,
            config.max_abs_weight,
        )
    }

    /// Effective learning rate after `dt` and dimensionality scaling.
    #[inline]
    pub fn effective_eta(&self) -> f32 {
        self.eta * self.dt / self.state_dimensionality as f32
    }

    /// Learned weight for a pillar, 0.0 for names never updated.
    #[inline]
    pub fn get_weight(&self, name: &str) -> f32 {
        self.weights.get(name).copied().unwrap_or(0.0)
    }

    /// Number of pillar names with a weight entry.
    pub fn weight_count(&self) -> usize {
        self.weights.len()
    }

    /// Compute the corrected value for a prediction.
    ///
    /// `corrected = predicted + sum(w[p] * v[p])`. Pillar names without a
    /// learned weight contribute 0.0. Read-only with respect to the weight
    /// map: calling this twice with the same inputs and no intervening update
    /// yields the same corrected value.
    ///
    /// A non-finite symbol value contributes nothing rather than poisoning
    /// the corrected value.
    pub fn apply_correction(
        &self,
        predicted: f32,
        symbol_vec: &HashMap<String, f32>,
    ) -> CorrectionOutcome {
        let mut contributions = HashMap::with_capacity(symbol_vec.len());
        let mut corrected = predicted;
        for (name, value) in symbol_vec {
            if !value.is_finite() {
                tracing::debug!(pillar = name.as_str(), value = *value, "non-finite symbol value ignored in correction");
                continue;
            }
            let contribution = self.get_weight(name) * value;
            corrected += contribution;
            contributions.insert(name.clone(), contribution);
        }
        CorrectionOutcome {
            corrected,
            contributions,
        }
    }

    /// Update the per-pillar weights from an observed residual
    /// (`actual - predicted`).
    ///
    /// Every pillar in the symbol vector gets a weight entry (0.0 on first
    /// sight) and a gradient-plus-shrinkage step. Updates that would write a
    /// non-finite weight are skipped and counted; the rest of the batch still
    /// applies.
    pub fn update_weights(
        &mut self,
        residual: f32,
        symbol_vec: &HashMap<String, f32>,
    ) -> UpdateOutcome {
        if !residual.is_finite() {
            tracing::warn!(residual, "non-finite residual, skipping weight update pass");
            // Names still get their entry so the weight map stays complete.
            for name in symbol_vec.keys() {
                self.weights.entry(name.clone()).or_insert(0.0);
            }
            return UpdateOutcome {
                applied: 0,
                skipped: symbol_vec.len(),
            };
        }

        let eta_eff = self.effective_eta();
        let mut outcome = UpdateOutcome::default();
        for (name, value) in symbol_vec {
            let weight = self.weights.entry(name.clone()).or_insert(0.0);
            if !value.is_finite() {
                tracing::warn!(
                    pillar = name.as_str(),
                    value = *value,
                    "non-finite symbol value, weight update skipped"
                );
                outcome.skipped += 1;
                continue;
            }
            let mut next = *weight + eta_eff * residual * value - eta_eff * self.lambda * *weight;
            if let Some(clamp) = self.max_abs_weight {
                next = next.clamp(-clamp, clamp);
            }
            if !next.is_finite() {
                tracing::warn!(
                    pillar = name.as_str(),
                    weight = *weight,
                    "weight update produced non-finite value, skipped"
                );
                outcome.skipped += 1;
                continue;
            }
            *weight = next;
            outcome.applied += 1;
        }
        outcome
    }

    /// Zero all learned weights. Used for diagnostic recovery when the
    /// report indicates instability.
    pub fn reset_weights(&mut self) {
        for weight in self.weights.values_mut() {
            *weight = 0.0;
        }
        tracing::debug!(weights = self.weights.len(), "weights reset to zero");
    }
}
