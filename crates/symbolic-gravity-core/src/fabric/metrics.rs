//! Rolling metrics accumulated across correction and residual events.
//!
//! All rolling histories share the fabric's `max_history` cap, configured
//! once at construction. Metrics are mutated on every correction/residual
//! event and read-only accessed by diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::engine::UpdateOutcome;

// ============================================================================
// ROLLING WINDOW
// ============================================================================

/// Bounded most-recent-last window of scalar samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    values: Vec<f32>,
    cap: usize,
}

impl RollingWindow {
    /// Create an empty window with the given cap.
    pub fn new(cap: usize) -> Self {
        Self {
            values: Vec::new(),
            cap,
        }
    }

    /// Append a sample, evicting the oldest when over the cap.
    pub fn push(&mut self, value: f32) {
        self.values.push(value);
        while self.values.len() > self.cap {
            self.values.remove(0);
        }
    }

    /// Samples currently retained, most-recent-last.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no sample has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arithmetic mean of the retained samples, 0.0 when empty.
    pub fn mean(&self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f32>() / self.values.len() as f32
    }
}

// ============================================================================
// FABRIC METRICS
// ============================================================================

/// Rolling counters and averages for one fabric instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityFabricMetrics {
    /// `|corrected - predicted|` per correction step.
    correction_magnitudes: RollingWindow,
    /// `|actual - predicted|` per residual event.
    residual_magnitudes: RollingWindow,
    /// Dominant pillar per correction step that had one, most-recent-last,
    /// capped like every other rolling history.
    dominant_pillars: Vec<String>,
    cap: usize,
    /// Number of weight-update events.
    update_count: u64,
    /// Per-pillar weight updates applied across all events.
    weight_updates_applied: u64,
    /// Per-pillar updates skipped by a numeric guard across all events.
    guard_skip_count: u64,
}

impl GravityFabricMetrics {
    /// Create empty metrics sharing the fabric's history cap.
    pub fn new(max_history: usize) -> Self {
        Self {
            correction_magnitudes: RollingWindow::new(max_history),
            residual_magnitudes: RollingWindow::new(max_history),
            dominant_pillars: Vec::new(),
            cap: max_history,
            update_count: 0,
            weight_updates_applied: 0,
            guard_skip_count: 0,
        }
    }

    /// Record one correction step. A non-finite magnitude is not admitted
    /// into the rolling window so one bad sample cannot poison the averages.
    pub fn record_correction(&mut self, magnitude: f32, dominant_pillar: Option<&str>) {
        if magnitude.is_finite() {
            self.correction_magnitudes.push(magnitude);
        }
        if let Some(name) = dominant_pillar {
            self.dominant_pillars.push(name.to_string());
            while self.dominant_pillars.len() > self.cap {
                self.dominant_pillars.remove(0);
            }
        }
    }

    /// Record one residual/weight-update event. A non-finite residual
    /// magnitude still counts the event and its guard skips but is kept out
    /// of the rolling window.
    pub fn record_update(&mut self, residual_magnitude: f32, outcome: UpdateOutcome) {
        if residual_magnitude.is_finite() {
            self.residual_magnitudes.push(residual_magnitude);
        }
        self.update_count += 1;
        self.weight_updates_applied += outcome.applied as u64;
        self.guard_skip_count += outcome.skipped as u64;
    }

    /// Rolling correction magnitudes.
    pub fn correction_magnitudes(&self) -> &RollingWindow {
        &self.correction_magnitudes
    }

    /// Rolling residual magnitudes.
    pub fn residual_magnitudes(&self) -> &RollingWindow {
        &self.residual_magnitudes
    }

    /// Average correction magnitude over the window, 0.0 when empty.
    pub fn avg_correction_magnitude(&self) -> f32 {
        self.correction_magnitudes.mean()
    }

    /// Average residual magnitude over the window, 0.0 when empty.
    pub fn avg_residual_magnitude(&self) -> f32 {
        self.residual_magnitudes.mean()
    }

    /// Number of weight-update events recorded.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Per-pillar updates skipped by numeric guards.
    pub fn guard_skip_count(&self) -> u64 {
        self.guard_skip_count
    }

    /// Fraction of attempted per-pillar updates skipped by a guard, in
    /// `[0, 1]`; 0.0 before any update was attempted.
    pub fn guard_skip_rate(&self) -> f32 {
        let attempted = self.weight_updates_applied + self.guard_skip_count;
        if attempted == 0 {
            return 0.0;
        }
        self.guard_skip_count as f32 / attempted as f32
    }

    /// How often each pillar was dominant within the rolling window.
    pub fn dominant_pillar_frequency(&self) -> HashMap<String, usize> {
        let mut frequency: HashMap<String, usize> = HashMap::new();
        for name in &self.dominant_pillars {
            *frequency.entry(name.clone()).or_insert(0) += 1;
        }
        frequency
    }

    /// The modal dominant pillar and the fraction of recent dominated steps
    /// it accounts for. `None` before any step produced a dominant pillar.
    pub fn dominance(&self) -> Option<(String, f32)> {
        if self.dominant_pillars.is_empty() {
            return None;
        }
        let frequency = self.dominant_pillar_frequency();
        let (name, count) = frequency.into_iter().max_by_key(|(_, count)| *count)?;
        Some((name, count as f32 / self.dominant_pillars.len() as f32))
    }
}
