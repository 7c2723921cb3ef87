//! World-state view: the boundary to the external simulation's key-value
//! overlay state.
//!
//! The fabric reads named overlay values into pillars through this trait and
//! may write updated pillar values back. The simulation loop owning the world
//! state is an external collaborator; this crate only defines the seam plus
//! an in-memory implementation used by tests and examples.

use std::collections::HashMap;

/// Read/write access to scalar overlay values keyed by pillar name.
///
/// Absence of a key means "use the pillar default"; implementations must not
/// invent values for unknown names.
pub trait WorldStateView {
    /// Current overlay value for `name`, if present.
    fn get(&self, name: &str) -> Option<f32>;

    /// Write an overlay value for `name`.
    fn set(&mut self, name: &str, value: f32);
}

/// HashMap-backed world state for tests and examples.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorldState {
    values: HashMap<String, f32>,
}

impl InMemoryWorldState {
    /// Create an empty world state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an overlay value, chainable for test setup.
    pub fn with(mut self, name: impl Into<String>, value: f32) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl WorldStateView for InMemoryWorldState {
    fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    fn set(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_string(), value);
    }
}
