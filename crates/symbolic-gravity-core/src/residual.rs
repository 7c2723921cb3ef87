//! Residual observations: one record per correction/residual event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::constants::diagnostics::IMPROVEMENT_EPSILON;

/// One observed prediction/truth pair with the symbolic state captured at
/// observation time.
///
/// Created once per correction/residual event, appended to the fabric's
/// bounded rolling history (oldest evicted on overflow) and never mutated
/// afterwards except for filling in `corrected` when the correction is
/// computed in the same step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualPoint {
    /// Record identifier.
    pub id: Uuid,
    /// Variable this observation belongs to.
    pub variable_name: String,
    /// Raw model prediction.
    pub predicted: f32,
    /// Observed true value.
    pub actual: f32,
    /// Corrected prediction, when a correction was computed for this step.
    pub corrected: Option<f32>,
    /// Symbolic state vector at observation time.
    pub symbolic_state: HashMap<String, f32>,
    /// Observation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ResidualPoint {
    /// Create a point stamped now.
    pub fn new(
        variable_name: impl Into<String>,
        predicted: f32,
        actual: f32,
        corrected: Option<f32>,
        symbolic_state: HashMap<String, f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            variable_name: variable_name.into(),
            predicted,
            actual,
            corrected,
            symbolic_state,
            timestamp: Utc::now(),
        }
    }

    /// Residual of the raw prediction: `actual - predicted`.
    #[inline]
    pub fn residual(&self) -> f32 {
        self.actual - self.predicted
    }

    /// How much closer the corrected value is to the truth than the raw
    /// prediction was, in percent of the original error.
    ///
    /// Reports 0.0 when no correction was recorded or when the original
    /// error magnitude is below [`IMPROVEMENT_EPSILON`] (nothing meaningful
    /// to improve on; avoids dividing by a near-zero error).
    pub fn improvement_pct(&self) -> f32 {
        let Some(corrected) = self.corrected else {
            return 0.0;
        };
        let original_error = (self.actual - self.predicted).abs();
        if original_error < IMPROVEMENT_EPSILON {
            return 0.0;
        }
        let corrected_error = (self.actual - corrected).abs();
        (original_error - corrected_error) / original_error * 100.0
    }
}
