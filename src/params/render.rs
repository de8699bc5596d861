//! Window and recording configuration.

use std::path::{Path, PathBuf};

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Base window title; the mode name is appended
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            title: "Coverwave".to_string(),
        }
    }
}

/// Headless recording configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Number of frames to render
    pub frames: usize,

    /// Output directory for PNG frames
    pub output_dir: PathBuf,

    /// Frame rate (FPS); fixes the simulation step
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(frames: usize, output_dir: impl AsRef<Path>) -> Self {
        Self {
            frames,
            output_dir: output_dir.as_ref().to_path_buf(),
            fps: 60,
        }
    }

    /// Fixed step between frames (seconds)
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    /// Path of frame `n`: `<out>/frame_00012.png`
    pub fn frame_path(&self, n: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{:05}.png", n))
    }
}
