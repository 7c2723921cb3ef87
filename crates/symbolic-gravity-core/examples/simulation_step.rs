//! Minimal simulation-loop walkthrough: pull overlays from a world state,
//! correct a prediction, feed the truth back and print the diagnostic report.
//!
//! Run with:
//! - `cargo run -p symbolic-gravity-core --example simulation_step`

use symbolic_gravity_core::config::{GravityConfig, InteractionRule};
use symbolic_gravity_core::fabric::GravityFabric;
use symbolic_gravity_core::world::InMemoryWorldState;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = GravityConfig::builder()
        .pillar("hope")
        .pillar("entropy")
        .pillar("pressure")
        .rule(InteractionRule::Suppress {
            source: "pressure".to_string(),
            target: "hope".to_string(),
            coupling: 0.1,
        })
        .rule(InteractionRule::DriveToward {
            target: "entropy".to_string(),
            setpoint: 0.5,
            rate: 0.02,
        })
        .eta(0.1)
        .lambda(0.01)
        .build();
    let mut fabric = GravityFabric::new(config)?;

    let mut world = InMemoryWorldState::new()
        .with("hope", 0.8)
        .with("entropy", 0.9)
        .with("pressure", 0.3);

    // A model that persistently under-predicts by ~1.5; the correction layer
    // learns the bias from the residuals.
    for step in 0..60 {
        let predicted = 10.0 + (step as f32 * 0.1).sin();
        let truth = predicted + 1.5;
        let (corrected, info) = fabric.apply_gravity_with_world(&mut world, "flux", predicted, Some(truth))?;
        if step % 20 == 0 {
            println!(
                "step {step:>2}: predicted {predicted:.3} corrected {corrected:.3} truth {truth:.3} \
                 (dominant: {:?})",
                info.dominant_pillar
            );
        }
    }

    let report = fabric.generate_diagnostic_report();
    println!("\ndiagnostics: {}", serde_json::to_string_pretty(&report.to_json())?);

    Ok(())
}
