//! Symbolic Gravity Core Library
//!
//! Adjusts a simulation's numeric predictions with a learned, online-updated
//! correction derived from a small set of named latent factors ("pillars").
//!
//! # Architecture
//!
//! This crate defines three components, leaves first:
//!
//! - [`pillar::PillarStore`]: named bounded scalar values with capped history
//!   and configured inter-pillar interaction rules
//! - [`engine::ResidualCorrectionEngine`]: a generic online-learning unit that
//!   corrects a predicted scalar from a symbolic state vector and updates its
//!   per-pillar weights from observed residuals
//! - [`fabric::GravityFabric`]: the orchestrator owning one store and one
//!   engine, exposing correction, residual recording, rolling metrics and
//!   diagnostic reporting to the surrounding simulation loop
//!
//! The surrounding simulation loop, trust scoring and rule mutation are
//! external collaborators; they interact with this crate only through
//! [`fabric::GravityFabric`] and the [`world::WorldStateView`] boundary.
//!
//! # Concurrency
//!
//! All operations are synchronous, call-and-return, and bounded in-memory
//! computations. One fabric instance per simulation worker; there is no
//! internal locking. Callers that must share a fabric across threads wrap
//! every public method in their own mutual-exclusion boundary.
//!
//! # Example
//!
//! ```
//! use symbolic_gravity_core::config::GravityConfig;
//! use symbolic_gravity_core::fabric::GravityFabric;
//!
//! let config = GravityConfig::builder()
//!     .pillar("hope")
//!     .pillar("entropy")
//!     .build();
//! let mut fabric = GravityFabric::new(config).unwrap();
//!
//! fabric.set_pillar_value("hope", 0.8).unwrap();
//! let (corrected, info) = fabric.apply_gravity("flux", 10.0, Some(10.6)).unwrap();
//! assert!(info.updated);
//! let _ = corrected;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fabric;
pub mod pillar;
pub mod residual;
pub mod world;

// Re-exports for convenience
pub use config::GravityConfig;
pub use engine::ResidualCorrectionEngine;
pub use error::{GravityError, Result};
pub use fabric::{GravityFabric, StepInfo};
pub use pillar::PillarStore;
pub use residual::ResidualPoint;
pub use world::WorldStateView;
