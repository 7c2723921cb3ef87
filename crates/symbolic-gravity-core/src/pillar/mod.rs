//! Pillars: named, bounded scalar latent factors.
//!
//! A pillar holds one bounded scalar value plus a capped history of past
//! values (most-recent-last). The [`PillarStore`] owns the full set of
//! pillars for one fabric, produces symbolic state vector snapshots and
//! executes the configured inter-pillar interaction rules.

mod store;

pub use store::PillarStore;

use serde::{Deserialize, Serialize};

use crate::config::PillarBounds;

/// One named, bounded scalar latent factor.
///
/// The value is clamped to the configured bounds after every mutation; the
/// history is capped at the store's `max_history` with oldest entries evicted
/// on overflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pillar {
    /// Unique name of this pillar.
    name: String,
    /// Current value, always within `bounds`.
    value: f32,
    /// Inclusive value bounds.
    bounds: PillarBounds,
    /// Past values, most-recent-last, capped at the store's history limit.
    history: Vec<f32>,
}

impl Pillar {
    pub(crate) fn new(name: impl Into<String>, initial: f32, bounds: PillarBounds) -> Self {
        let value = bounds.clamp(initial);
        Self {
            name: name.into(),
            value,
            bounds,
            history: vec![value],
        }
    }

    /// Pillar name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Configured bounds.
    pub fn bounds(&self) -> PillarBounds {
        self.bounds
    }

    /// Past values, most-recent-last.
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    /// Clamp `value` into bounds, store it and append to history, evicting
    /// the oldest entry when the cap is exceeded.
    pub(crate) fn assign(&mut self, value: f32, max_history: usize) {
        self.value = self.bounds.clamp(value);
        self.history.push(self.value);
        while self.history.len() > max_history {
            self.history.remove(0);
        }
    }
}
