//! Gravity fabric: the orchestrator owning one pillar store and one
//! residual correction engine.
//!
//! The fabric exposes the public operations used by the external simulation
//! loop: apply-correction, residual recording, pillar accessors, metrics
//! retrieval and diagnostic reporting.
//!
//! # Step shape
//!
//! Each [`GravityFabric::apply_gravity`] call runs Idle -> Correcting ->
//! (optionally) Updating -> Idle as straight-line control flow. There is no
//! persistent error state; every call is independently retryable.
//!
//! # Ordering guarantee
//!
//! The symbolic state snapshot is captured exactly once per step and reused
//! for both the correction and the weight update, so an update is always
//! applied with the state vector that produced the correction it is
//! correcting, never a snapshot from a later step.

mod diagnostics;
mod metrics;

pub use diagnostics::DiagnosticReport;
pub use metrics::{GravityFabricMetrics, RollingWindow};

use serde::{Deserialize, Serialize};

use crate::config::{GravityConfig, PillarBounds};
use crate::engine::ResidualCorrectionEngine;
use crate::error::{GravityError, Result};
use crate::pillar::PillarStore;
use crate::residual::ResidualPoint;
use crate::world::WorldStateView;

/// Summary of one correction step, returned alongside the corrected value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepInfo {
    /// `|corrected - predicted|` for this step.
    pub correction_magnitude: f32,
    /// Pillar with the largest absolute contribution this step, if any
    /// contribution was non-zero.
    pub dominant_pillar: Option<String>,
    /// Whether ground truth was supplied and a weight update occurred.
    pub updated: bool,
}

/// Orchestrator owning one pillar store, one correction engine, the metrics
/// object and the residual history.
///
/// One fabric per simulation worker: the design provides no internal locking,
/// and the correction/update sequence must stay atomic with respect to a
/// single variable's state. Callers sharing a fabric across threads must wrap
/// every public method in their own mutual-exclusion boundary.
#[derive(Debug, Clone)]
pub struct GravityFabric {
    config: GravityConfig,
    store: PillarStore,
    engine: ResidualCorrectionEngine,
    metrics: GravityFabricMetrics,
    residual_history: Vec<ResidualPoint>,
}

impl GravityFabric {
    /// Build a fabric from configuration.
    ///
    /// # Errors
    ///
    /// `Configuration` when the configuration is invalid; the error is fatal
    /// and the fabric must be reconstructed with valid configuration.
    pub fn new(config: GravityConfig) -> Result<Self> {
        config.validate()?;
        let store = PillarStore::from_config(&config);
        let engine = ResidualCorrectionEngine::from_config(&config)?;
        let metrics = GravityFabricMetrics::new(config.max_history);
        Ok(Self {
            config,
            store,
            engine,
            metrics,
            residual_history: Vec::new(),
        })
    }

    /// Correct a prediction from the pillars currently set on the fabric.
    ///
    /// Runs interactions, captures the symbolic state snapshot once, applies
    /// the correction and, when `truth` is supplied, computes the residual
    /// (`truth - predicted`), updates the engine weights with the same
    /// snapshot and records a [`ResidualPoint`].
    pub fn apply_gravity(
        &mut self,
        variable: &str,
        predicted: f32,
        truth: Option<f32>,
    ) -> Result<(f32, StepInfo)> {
        self.step(None, variable, predicted, truth)
    }

    /// Like [`apply_gravity`](Self::apply_gravity), but first pulls named
    /// overlay values out of the world-state view into the pillar store and,
    /// when `write_back` is configured, writes the post-interaction pillar
    /// values back.
    ///
    /// Overlay names absent from the world keep their current pillar value;
    /// non-finite overlay values are ignored with a warning rather than
    /// failing the step.
    pub fn apply_gravity_with_world(
        &mut self,
        world: &mut dyn WorldStateView,
        variable: &str,
        predicted: f32,
        truth: Option<f32>,
    ) -> Result<(f32, StepInfo)> {
        self.step(Some(world), variable, predicted, truth)
    }

    fn step(
        &mut self,
        mut world: Option<&mut dyn WorldStateView>,
        variable: &str,
        predicted: f32,
        truth: Option<f32>,
    ) -> Result<(f32, StepInfo)> {
        if let Some(world) = world.as_deref_mut() {
            self.pull_overlays(world)?;
        }

        self.store.apply_interactions();

        // Captured once; reused for correction and update (ordering guarantee)
        let snapshot = self.store.snapshot();

        let outcome = self.engine.apply_correction(predicted, &snapshot);
        let correction_magnitude = (outcome.corrected - predicted).abs();
        let dominant_pillar = outcome
            .dominant_pillar()
            .map(|(name, _)| name.to_string());
        self.metrics
            .record_correction(correction_magnitude, dominant_pillar.as_deref());

        let updated = match truth {
            Some(truth) => {
                let residual = truth - predicted;
                let update = self.engine.update_weights(residual, &snapshot);
                self.metrics.record_update(residual.abs(), update);
                self.push_residual_point(ResidualPoint::new(
                    variable,
                    predicted,
                    truth,
                    Some(outcome.corrected),
                    snapshot.clone(),
                ));
                true
            }
            None => false,
        };

        if self.config.write_back {
            if let Some(world) = world {
                for (name, value) in self.store.snapshot() {
                    world.set(&name, value);
                }
            }
        }

        tracing::debug!(
            variable,
            predicted,
            corrected = outcome.corrected,
            updated,
            "gravity step"
        );

        Ok((
            outcome.corrected,
            StepInfo {
                correction_magnitude,
                dominant_pillar,
                updated,
            },
        ))
    }

    fn pull_overlays(&mut self, world: &dyn WorldStateView) -> Result<()> {
        for name in self.config.pillar_names.clone() {
            let Some(value) = world.get(&name) else {
                continue;
            };
            if !value.is_finite() {
                tracing::warn!(pillar = name.as_str(), value, "non-finite world overlay ignored");
                continue;
            }
            self.store.set_value(&name, value)?;
        }
        Ok(())
    }

    /// Record a residual observation independently of a live correction call
    /// (e.g. batch backfill of ground truth).
    ///
    /// Captures the current symbolic state, updates the engine weights and
    /// appends a [`ResidualPoint`] without a corrected value.
    pub fn record_residual(
        &mut self,
        variable_name: &str,
        predicted: f32,
        actual: f32,
    ) -> Result<ResidualPoint> {
        let snapshot = self.store.snapshot();
        let residual = actual - predicted;
        let update = self.engine.update_weights(residual, &snapshot);
        self.metrics.record_update(residual.abs(), update);

        let point = ResidualPoint::new(variable_name, predicted, actual, None, snapshot);
        self.push_residual_point(point.clone());
        Ok(point)
    }

    fn push_residual_point(&mut self, point: ResidualPoint) {
        self.residual_history.push(point);
        while self.residual_history.len() > self.config.max_history {
            self.residual_history.remove(0);
        }
    }

    // ------------------------------------------------------------------
    // Pillar pass-throughs
    // ------------------------------------------------------------------

    /// Register a pillar with an initial value and optional explicit bounds.
    /// Registering an existing name leaves it untouched.
    pub fn add_pillar(
        &mut self,
        name: &str,
        initial_value: f32,
        bounds: Option<PillarBounds>,
    ) -> Result<()> {
        if !initial_value.is_finite() {
            return Err(GravityError::invalid_value(name, initial_value));
        }
        if let Some(bounds) = bounds {
            bounds.validate(name)?;
        }
        self.store.register(name, initial_value, bounds);
        Ok(())
    }

    /// Set a pillar value (clamped to its bounds).
    pub fn set_pillar_value(&mut self, name: &str, value: f32) -> Result<()> {
        self.store.set_value(name, value)
    }

    /// Read a pillar value under the configured strictness.
    pub fn get_pillar_value(&self, name: &str) -> Result<f32> {
        self.store.get_value(name)
    }

    /// Read-only access to the pillar store.
    pub fn pillars(&self) -> &PillarStore {
        &self.store
    }

    /// Read-only access to the correction engine.
    pub fn engine(&self) -> &ResidualCorrectionEngine {
        &self.engine
    }

    // ------------------------------------------------------------------
    // Metrics and diagnostics
    // ------------------------------------------------------------------

    /// Read-only metrics snapshot.
    pub fn get_metrics(&self) -> &GravityFabricMetrics {
        &self.metrics
    }

    /// Recorded residual observations, most-recent-last, capped at
    /// `max_history`.
    pub fn residual_history(&self) -> &[ResidualPoint] {
        &self.residual_history
    }

    /// Generate the diagnostic report from the current metrics.
    pub fn generate_diagnostic_report(&self) -> DiagnosticReport {
        DiagnosticReport::from_metrics(&self.metrics, &self.config.thresholds)
    }

    /// Zero the learned weights (diagnostic recovery, typically after the
    /// report suggests it).
    pub fn reset_weights(&mut self) {
        self.engine.reset_weights();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionRule;
    use crate::world::{InMemoryWorldState, WorldStateView};

    fn fabric_with(names: &[&str]) -> GravityFabric {
        let mut builder = GravityConfig::builder();
        for name in names {
            builder = builder.pillar(*name);
        }
        GravityFabric::new(builder.build()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_fatal_at_construction() {
        let config = GravityConfig::builder().eta(-1.0).build();
        let err = GravityFabric::new(config).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_zero_weights_leave_prediction_unchanged() {
        let mut fabric = fabric_with(&["hope"]);
        fabric.set_pillar_value("hope", 0.8).unwrap();

        let (corrected, info) = fabric.apply_gravity("flux", 10.0, None).unwrap();
        assert!((corrected - 10.0).abs() < f32::EPSILON);
        assert!(!info.updated);
        assert!(info.dominant_pillar.is_none());
    }

    #[test]
    fn test_truth_triggers_update_and_residual_point() {
        let mut fabric = fabric_with(&["hope"]);
        fabric.set_pillar_value("hope", 0.8).unwrap();

        let (_, info) = fabric.apply_gravity("flux", 10.0, Some(12.0)).unwrap();
        assert!(info.updated);
        assert_eq!(fabric.residual_history().len(), 1);
        assert_eq!(fabric.get_metrics().update_count(), 1);

        let point = &fabric.residual_history()[0];
        assert_eq!(point.variable_name, "flux");
        assert!((point.residual() - 2.0).abs() < f32::EPSILON);
        assert!(point.corrected.is_some());
        // Weight moved toward reducing the residual
        assert!(fabric.engine().get_weight("hope") > 0.0);
    }

    #[test]
    fn test_weights_settle_at_regularized_fixed_point() {
        // With a constant residual r and symbol value v, the update rule has
        // the fixed point w* = r * v / lambda.
        let mut fabric = GravityFabric::new(
            GravityConfig::builder().pillar("hope").eta(0.1).lambda(0.5).build(),
        )
        .unwrap();
        fabric.set_pillar_value("hope", 0.8).unwrap();

        for _ in 0..200 {
            fabric.apply_gravity("flux", 10.0, Some(12.0)).unwrap();
        }
        let expected = 2.0 * 0.8 / 0.5;
        assert!((fabric.engine().get_weight("hope") - expected).abs() < 0.01);
    }

    #[test]
    fn test_snapshot_is_shared_between_correction_and_update() {
        // An interaction mutating pillars on every step must not let the
        // update see a different state than the correction did: the learned
        // weight must follow v*residual with v captured once per step.
        let config = GravityConfig::builder()
            .pillar("hope")
            .rule(InteractionRule::DriveToward {
                target: "hope".to_string(),
                setpoint: 0.0,
                rate: 0.5,
            })
            .eta(0.1)
            .lambda(0.0)
            .build();
        let mut fabric = GravityFabric::new(config).unwrap();
        fabric.set_pillar_value("hope", 1.0).unwrap();

        // After interactions, hope = 0.5; update uses the same 0.5
        fabric.apply_gravity("flux", 0.0, Some(1.0)).unwrap();
        let expected = 0.1 * 1.0 * 0.5;
        assert!((fabric.engine().get_weight("hope") - expected).abs() < 1e-6);
    }

    #[test]
    fn test_world_overlays_are_pulled_into_pillars() {
        let mut fabric = fabric_with(&["hope", "dread"]);
        let mut world = InMemoryWorldState::new().with("hope", 0.9);

        fabric
            .apply_gravity_with_world(&mut world, "flux", 1.0, None)
            .unwrap();
        assert!((fabric.get_pillar_value("hope").unwrap() - 0.9).abs() < 1e-6);
        // Absent overlay keeps the default
        assert!((fabric.get_pillar_value("dread").unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_world_write_back_publishes_pillar_values() {
        let mut fabric = fabric_with(&["hope"]);
        let mut world = InMemoryWorldState::new();
        fabric.set_pillar_value("hope", 0.7).unwrap();

        fabric
            .apply_gravity_with_world(&mut world, "flux", 1.0, None)
            .unwrap();
        assert_eq!(world.get("hope"), Some(0.7));
    }

    #[test]
    fn test_write_back_can_be_disabled() {
        let config = GravityConfig::builder().pillar("hope").write_back(false).build();
        let mut fabric = GravityFabric::new(config).unwrap();
        let mut world = InMemoryWorldState::new();

        fabric
            .apply_gravity_with_world(&mut world, "flux", 1.0, None)
            .unwrap();
        assert!(world.get("hope").is_none());
    }

    #[test]
    fn test_non_finite_world_overlay_is_ignored() {
        let mut fabric = fabric_with(&["hope"]);
        fabric.set_pillar_value("hope", 0.6).unwrap();
        let mut world = InMemoryWorldState::new().with("hope", f32::NAN);

        let result = fabric.apply_gravity_with_world(&mut world, "flux", 1.0, None);
        assert!(result.is_ok());
        assert!((fabric.get_pillar_value("hope").unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_record_residual_independent_of_correction() {
        let mut fabric = fabric_with(&["hope"]);
        fabric.set_pillar_value("hope", 0.8).unwrap();

        let point = fabric.record_residual("flux", 10.0, 13.0).unwrap();
        assert!((point.residual() - 3.0).abs() < f32::EPSILON);
        assert!(point.corrected.is_none());
        assert_eq!(fabric.residual_history().len(), 1);
        assert!(fabric.engine().get_weight("hope") > 0.0);
    }

    #[test]
    fn test_residual_history_is_capped() {
        let config = GravityConfig::builder().pillar("hope").max_history(5).build();
        let mut fabric = GravityFabric::new(config).unwrap();

        for i in 0..12 {
            fabric.record_residual("flux", 0.0, i as f32).unwrap();
        }
        assert_eq!(fabric.residual_history().len(), 5);
        // Most recent retained
        assert!((fabric.residual_history()[4].actual - 11.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_add_pillar_rejects_bad_inputs() {
        let mut fabric = fabric_with(&[]);
        assert!(fabric.add_pillar("hope", f32::NAN, None).is_err());
        assert!(fabric
            .add_pillar("hope", 0.5, Some(PillarBounds::new(1.0, 0.0)))
            .is_err());
        assert!(fabric.add_pillar("hope", 0.5, None).is_ok());
    }

    #[test]
    fn test_reset_weights_recovers_neutral_correction() {
        let mut fabric = fabric_with(&["hope"]);
        fabric.set_pillar_value("hope", 0.8).unwrap();
        for _ in 0..10 {
            fabric.apply_gravity("flux", 10.0, Some(15.0)).unwrap();
        }
        let (corrected, _) = fabric.apply_gravity("flux", 10.0, None).unwrap();
        assert!(corrected > 10.0);

        fabric.reset_weights();
        let (corrected, _) = fabric.apply_gravity("flux", 10.0, None).unwrap();
        assert!((corrected - 10.0).abs() < f32::EPSILON);
    }
}
