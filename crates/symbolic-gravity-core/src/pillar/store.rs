//! Pillar store: owns the pillar map and executes interaction rules.

use std::collections::HashMap;

use crate::config::constants::pillar::DEFAULT_VALUE;
use crate::config::{GravityConfig, InteractionRule, PillarBounds};
use crate::error::{GravityError, Result};

use super::Pillar;

/// Owns the mapping of pillar name to bounded value plus bounded history and
/// applies the configured inter-pillar interaction rules.
///
/// Pillars are created at store construction (from `pillar_names`) or lazily
/// on first write; they are never deleted individually. Reads of a pillar
/// that was never registered return the documented default
/// ([`DEFAULT_VALUE`]) in non-strict mode and fail with `UnknownPillar` in
/// strict mode.
#[derive(Debug, Clone)]
pub struct PillarStore {
    pillars: HashMap<String, Pillar>,
    configured_bounds: HashMap<String, PillarBounds>,
    rules: Vec<InteractionRule>,
    max_history: usize,
    strict: bool,
}

impl PillarStore {
    /// Build a store from validated configuration, registering every
    /// configured pillar at the documented default value.
    pub fn from_config(config: &GravityConfig) -> Self {
        let mut store = Self {
            pillars: HashMap::new(),
            configured_bounds: config.bounds.clone(),
            rules: config.interaction_rules.clone(),
            max_history: config.max_history,
            strict: config.strict_reads,
        };
        for name in &config.pillar_names {
            store.register(name, DEFAULT_VALUE, None);
        }
        store
    }

    /// Register a pillar, keeping the existing one untouched if the name is
    /// already present. Bounds fall back to the configured per-name bounds,
    /// then to the default `[0, 1]`.
    pub fn register(&mut self, name: &str, initial: f32, bounds: Option<PillarBounds>) {
        if self.pillars.contains_key(name) {
            return;
        }
        let bounds = bounds
            .or_else(|| self.configured_bounds.get(name).copied())
            .unwrap_or_default();
        self.pillars
            .insert(name.to_string(), Pillar::new(name, initial, bounds));
        tracing::debug!(pillar = name, initial, "registered pillar");
    }

    /// Set a pillar value, registering the pillar on first write.
    ///
    /// The value is clamped to the pillar's bounds before storing and the
    /// clamped value is appended to the pillar's history.
    ///
    /// # Errors
    ///
    /// `InvalidValue` when `value` is NaN or infinite; state is not mutated.
    pub fn set_value(&mut self, name: &str, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(GravityError::invalid_value(name, value));
        }
        match self.pillars.get_mut(name) {
            Some(pillar) => {
                pillar.assign(value, self.max_history);
                tracing::debug!(pillar = name, value = pillar.value(), "pillar set");
            }
            None => self.register(name, value, None),
        }
        Ok(())
    }

    /// Read a pillar value under the configured strictness.
    ///
    /// Non-strict mode returns [`DEFAULT_VALUE`] for pillars that were never
    /// registered; strict mode fails with `UnknownPillar`.
    pub fn get_value(&self, name: &str) -> Result<f32> {
        match self.pillars.get(name) {
            Some(pillar) => Ok(pillar.value()),
            None if self.strict => Err(GravityError::UnknownPillar(name.to_string())),
            None => Ok(DEFAULT_VALUE),
        }
    }

    /// Full pillar record, if registered.
    pub fn get(&self, name: &str) -> Option<&Pillar> {
        self.pillars.get(name)
    }

    /// Registered pillar names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pillars.keys().map(String::as_str)
    }

    /// Number of registered pillars.
    pub fn len(&self) -> usize {
        self.pillars.len()
    }

    /// True when no pillar has been registered.
    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty()
    }

    /// Symbolic state vector: an immutable snapshot of every registered
    /// pillar's current value. Produced on demand and consumed by exactly one
    /// correction/update step.
    pub fn snapshot(&self) -> HashMap<String, f32> {
        self.pillars
            .iter()
            .map(|(name, pillar)| (name.clone(), pillar.value()))
            .collect()
    }

    /// Execute the configured interaction rules in order.
    ///
    /// Each rule reads the current values (including the effects of earlier
    /// rules in the same pass), computes the target's new value and re-clamps
    /// it into the target's bounds. Rules never register pillars; a rule
    /// whose pillars are missing at execution time is skipped.
    pub fn apply_interactions(&mut self) {
        let rules = self.rules.clone();
        for rule in &rules {
            self.apply_rule(rule);
        }
    }

    fn apply_rule(&mut self, rule: &InteractionRule) {
        match rule {
            InteractionRule::Push {
                source,
                target,
                coupling,
            } => {
                let Some(source_value) = self.pillars.get(source).map(Pillar::value) else {
                    return;
                };
                self.nudge(target, |current| {
                    current + coupling * (source_value - current)
                });
            }
            InteractionRule::DriveToward {
                target,
                setpoint,
                rate,
            } => {
                self.nudge(target, |current| current + rate * (setpoint - current));
            }
            InteractionRule::Suppress {
                source,
                target,
                coupling,
            } => {
                let Some(source_value) = self.pillars.get(source).map(Pillar::value) else {
                    return;
                };
                let Some(floor) = self.pillars.get(target).map(|p| p.bounds().min) else {
                    return;
                };
                self.nudge(target, |current| {
                    current + coupling * source_value * (floor - current)
                });
            }
        }
    }

    /// Apply `f` to the target's current value, clamping and recording
    /// history only when the value actually moved.
    fn nudge(&mut self, target: &str, f: impl FnOnce(f32) -> f32) {
        let max_history = self.max_history;
        let Some(pillar) = self.pillars.get_mut(target) else {
            return;
        };
        let current = pillar.value();
        let next = pillar.bounds().clamp(f(current));
        if (next - current).abs() > f32::EPSILON {
            pillar.assign(next, max_history);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> PillarStore {
        let mut builder = GravityConfig::builder();
        for name in names {
            builder = builder.pillar(*name);
        }
        PillarStore::from_config(&builder.build())
    }

    #[test]
    fn test_configured_pillars_start_at_default() {
        let store = store_with(&["hope", "dread"]);
        assert_eq!(store.len(), 2);
        assert!((store.get_value("hope").unwrap() - DEFAULT_VALUE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_value_clamps_to_bounds() {
        let mut store = store_with(&["hope"]);
        store.set_value("hope", 7.5).unwrap();
        assert!((store.get_value("hope").unwrap() - 1.0).abs() < f32::EPSILON);

        store.set_value("hope", -7.5).unwrap();
        assert!((store.get_value("hope").unwrap() - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_set_value_rejects_non_finite_without_mutation() {
        let mut store = store_with(&["hope"]);
        store.set_value("hope", 0.8).unwrap();

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = store.set_value("hope", bad).unwrap_err();
            assert!(matches!(err, GravityError::InvalidValue { .. }));
        }
        assert!((store.get_value("hope").unwrap() - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn test_first_write_registers_pillar() {
        let mut store = store_with(&[]);
        store.set_value("hope", 0.3).unwrap();
        assert_eq!(store.len(), 1);
        assert!((store.get_value("hope").unwrap() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unregistered_read_returns_documented_default() {
        let store = store_with(&[]);
        assert!((store.get_value("never_set").unwrap() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_strict_mode_rejects_unregistered_read() {
        let config = GravityConfig::builder().strict_reads(true).build();
        let store = PillarStore::from_config(&config);
        let err = store.get_value("never_set").unwrap_err();
        assert!(matches!(err, GravityError::UnknownPillar(_)));
    }

    #[test]
    fn test_snapshot_reflects_current_values() {
        let mut store = store_with(&["hope", "dread"]);
        store.set_value("hope", 0.9).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!((snapshot["hope"] - 0.9).abs() < f32::EPSILON);
        assert!((snapshot["dread"] - DEFAULT_VALUE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_push_rule_moves_target_toward_source() {
        let config = GravityConfig::builder()
            .pillar("hope")
            .pillar("dread")
            .rule(InteractionRule::Push {
                source: "hope".to_string(),
                target: "dread".to_string(),
                coupling: 0.5,
            })
            .build();
        let mut store = PillarStore::from_config(&config);
        store.set_value("hope", 1.0).unwrap();
        store.set_value("dread", 0.0).unwrap();

        store.apply_interactions();
        assert!((store.get_value("dread").unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_drive_toward_relaxes_to_setpoint() {
        let config = GravityConfig::builder()
            .pillar("hope")
            .rule(InteractionRule::DriveToward {
                target: "hope".to_string(),
                setpoint: 0.5,
                rate: 0.1,
            })
            .build();
        let mut store = PillarStore::from_config(&config);
        store.set_value("hope", 1.0).unwrap();

        for _ in 0..200 {
            store.apply_interactions();
        }
        assert!((store.get_value("hope").unwrap() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_suppress_rule_pulls_target_toward_floor() {
        let config = GravityConfig::builder()
            .pillar("pressure")
            .pillar("hope")
            .rule(InteractionRule::Suppress {
                source: "pressure".to_string(),
                target: "hope".to_string(),
                coupling: 0.5,
            })
            .build();
        let mut store = PillarStore::from_config(&config);
        store.set_value("pressure", 1.0).unwrap();
        store.set_value("hope", 0.8).unwrap();

        store.apply_interactions();
        assert!((store.get_value("hope").unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_interactions_stay_within_bounds() {
        let config = GravityConfig::builder()
            .pillar("hope")
            .pillar("dread")
            .rule(InteractionRule::Push {
                source: "hope".to_string(),
                target: "dread".to_string(),
                coupling: 1.0,
            })
            .build();
        let mut store = PillarStore::from_config(&config);
        store.set_value("hope", 1.0).unwrap();

        for _ in 0..10 {
            store.apply_interactions();
            let value = store.get_value("dread").unwrap();
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_bounds_invariant_under_arbitrary_writes() {
        let mut store = store_with(&["hope"]);
        let inputs = [0.1, -3.0, 42.0, 0.99, 1e30, -1e30, 0.0];
        for value in inputs {
            store.set_value("hope", value).unwrap();
            let stored = store.get_value("hope").unwrap();
            assert!((0.0..=1.0).contains(&stored), "value {stored} escaped bounds");
        }
    }

    #[test]
    fn test_pillar_history_capped_to_most_recent() {
        let config = GravityConfig::builder().pillar("hope").max_history(5).build();
        let mut store = PillarStore::from_config(&config);
        for i in 0..12 {
            store.set_value("hope", i as f32 / 20.0).unwrap();
        }

        let history = store.get("hope").unwrap().history();
        assert_eq!(history.len(), 5);
        assert!((history[4] - 11.0 / 20.0).abs() < 1e-6);
        assert!((history[0] - 7.0 / 20.0).abs() < 1e-6);
    }
}
