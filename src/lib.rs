//! Coverwave library - album-cover themed, audio-reactive visualizers

pub mod cli;
pub mod color;
pub mod error;
pub mod features;
pub mod params;
pub mod render_loop;
pub mod rendering;
pub mod sim;
pub mod surface;
pub mod viz;

pub use error::{Result, VisualizerError};
