//! Diagnostic reporting: the fabric's soft failure channel.
//!
//! Persistent high residual magnitude, pillar dominance and frequent numeric
//! guard skips are expected to surface here rather than as errors, since none
//! of them represent an invalid program state, only a degraded-quality
//! correction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DiagnosticThresholds;

use super::metrics::GravityFabricMetrics;

/// Snapshot of correction health plus actionable suggestions.
///
/// # Instability score
///
/// A summary statistic in `[0, 1]` indicating how unreliable the current
/// correction weights appear:
///
/// ```text
/// 0.5 * min(avg_residual / (2 * residual_threshold), 1)
///   + 0.3 * dominance_fraction
///   + 0.2 * guard_skip_rate
/// ```
///
/// Residual pressure carries the largest weight because persistent residual
/// error is the direct signal that the learned weights are not converging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Average `|corrected - predicted|` over the rolling window.
    pub avg_correction_magnitude: f32,
    /// Average `|actual - predicted|` over the rolling window.
    pub avg_residual_magnitude: f32,
    /// Modal dominant pillar of recent steps, when any step had one.
    pub dominant_pillar: Option<String>,
    /// Fraction of recent dominated steps accounted for by the modal pillar.
    pub dominance_fraction: f32,
    /// Fraction of attempted weight updates skipped by numeric guards.
    pub guard_skip_rate: f32,
    /// Overall instability score in `[0, 1]`.
    pub instability_score: f32,
    /// Number of weight-update events recorded so far.
    pub update_count: u64,
    /// Human-readable, actionable findings; empty when healthy.
    pub suggestions: Vec<String>,
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
}

impl DiagnosticReport {
    pub(crate) fn from_metrics(
        metrics: &GravityFabricMetrics,
        thresholds: &DiagnosticThresholds,
    ) -> Self {
        let avg_residual_magnitude = metrics.avg_residual_magnitude();
        let (dominant_pillar, dominance_fraction) = match metrics.dominance() {
            Some((name, fraction)) => (Some(name), fraction),
            None => (None, 0.0),
        };
        let guard_skip_rate = metrics.guard_skip_rate();

        let residual_pressure =
            (avg_residual_magnitude / (2.0 * thresholds.residual_magnitude)).min(1.0);
        let instability_score =
            0.5 * residual_pressure + 0.3 * dominance_fraction + 0.2 * guard_skip_rate;

        let mut suggestions = Vec::new();
        if avg_residual_magnitude > thresholds.residual_magnitude {
            suggestions.push(format!(
                "Average residual magnitude {avg_residual_magnitude:.2} exceeds {:.2}: review \
                 the underlying prediction model, not just the correction layer.",
                thresholds.residual_magnitude
            ));
        }
        if dominance_fraction > thresholds.dominance {
            if let Some(name) = &dominant_pillar {
                suggestions.push(format!(
                    "Pillar '{name}' dominates {:.0}% of recent corrections: check for a \
                     degenerate or overfit weight.",
                    dominance_fraction * 100.0
                ));
            }
        }
        if instability_score > thresholds.instability {
            suggestions.push(format!(
                "Instability score {instability_score:.2} exceeds {:.2}: consider resetting \
                 the learned weights.",
                thresholds.instability
            ));
        }

        Self {
            avg_correction_magnitude: metrics.avg_correction_magnitude(),
            avg_residual_magnitude,
            dominant_pillar,
            dominance_fraction,
            guard_skip_rate,
            instability_score,
            update_count: metrics.update_count(),
            suggestions,
            generated_at: Utc::now(),
        }
    }

    /// Structured metric-name -> value map for operator-facing consumers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "avg_correction_magnitude": self.avg_correction_magnitude,
            "avg_residual_magnitude": self.avg_residual_magnitude,
            "dominant_pillar": self.dominant_pillar,
            "dominance_fraction": self.dominance_fraction,
            "guard_skip_rate": self.guard_skip_rate,
            "instability_score": self.instability_score,
            "update_count": self.update_count,
            "suggestions": self.suggestions,
            "generated_at": self.generated_at.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UpdateOutcome;

    fn thresholds() -> DiagnosticThresholds {
        DiagnosticThresholds::default()
    }

    #[test]
    fn test_healthy_metrics_produce_no_suggestions() {
        let mut metrics = GravityFabricMetrics::new(100);
        metrics.record_correction(0.1, None);
        metrics.record_update(0.2, UpdateOutcome { applied: 1, skipped: 0 });

        let report = DiagnosticReport::from_metrics(&metrics, &thresholds());
        assert!(report.suggestions.is_empty());
        assert!(report.instability_score < 0.2);
    }

    #[test]
    fn test_elevated_residuals_trigger_model_review_suggestion() {
        let mut metrics = GravityFabricMetrics::new(100);
        for _ in 0..50 {
            metrics.record_update(3.0, UpdateOutcome { applied: 1, skipped: 0 });
        }

        let report = DiagnosticReport::from_metrics(&metrics, &thresholds());
        assert!((report.avg_residual_magnitude - 3.0).abs() < 1e-5);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.contains("residual magnitude")));
    }

    #[test]
    fn test_dominance_triggers_overfit_suggestion() {
        let mut metrics = GravityFabricMetrics::new(100);
        for _ in 0..9 {
            metrics.record_correction(0.5, Some("hope"));
        }
        metrics.record_correction(0.5, Some("dread"));

        let report = DiagnosticReport::from_metrics(&metrics, &thresholds());
        assert_eq!(report.dominant_pillar.as_deref(), Some("hope"));
        assert!(report.suggestions.iter().any(|s| s.contains("'hope'")));
    }

    #[test]
    fn test_instability_triggers_reset_suggestion() {
        let mut metrics = GravityFabricMetrics::new(100);
        // Saturate residual pressure and dominance
        for _ in 0..20 {
            metrics.record_correction(2.0, Some("hope"));
            metrics.record_update(10.0, UpdateOutcome { applied: 1, skipped: 0 });
        }

        let report = DiagnosticReport::from_metrics(&metrics, &thresholds());
        assert!(report.instability_score > 0.7);
        assert!(report.suggestions.iter().any(|s| s.contains("resetting")));
    }

    #[test]
    fn test_report_serializes_with_preserved_field_names() {
        let metrics = GravityFabricMetrics::new(10);
        let report = DiagnosticReport::from_metrics(&metrics, &thresholds());
        let json = report.to_json();
        assert!(json.get("avg_correction_magnitude").is_some());
        assert!(json.get("avg_residual_magnitude").is_some());
        assert!(json.get("dominance_fraction").is_some());
        assert!(json.get("instability_score").is_some());
        assert!(json.get("suggestions").is_some());
    }
}
