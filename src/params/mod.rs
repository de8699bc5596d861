//! Parameter definitions with units and documented semantics.
//!
//! Magic numbers live here rather than in the simulation code:
//! - Units (pixels, seconds, BPM)
//! - Documented ranges and meanings
//! - Derived parameters as pure functions of the audio features

mod render;
mod simulation;
mod spectrum;

// Re-export all types
pub use render::{RecordingConfig, RenderConfig};
pub use simulation::{
    target_node_count, BehaviorTag, SimulationParameters, SimulationTuning, MAX_NODES, MIN_NODES,
};
pub use spectrum::SpectrumConfig;
