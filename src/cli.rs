//! Command-line argument parsing.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use image::DynamicImage;
use log::{info, warn};

use crate::features::TrackState;
use crate::params::{RecordingConfig, RenderConfig};
use crate::viz::VisualizerMode;
use crate::Result;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Coverwave")]
#[command(about = "Album-cover themed, audio-reactive visualizer", long_about = None)]
pub struct Args {
    /// Visualizer mode: creative_nodes (default), particles, spectrum
    #[arg(long, value_name = "MODE", default_value = "creative_nodes")]
    pub mode: String,

    /// Track state JSON (audio features, playback, optional palette and rules)
    #[arg(long, value_name = "FILE")]
    pub track: Option<PathBuf>,

    /// Album cover image used to derive the palette
    #[arg(long, value_name = "FILE")]
    pub cover: Option<PathBuf>,

    /// Window or frame width (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Window or frame height (pixels)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Seed for the simulation RNG
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u64,

    /// Render this many frames headlessly instead of opening a window
    #[arg(long, value_name = "FRAMES")]
    pub record: Option<usize>,

    /// Output directory for recorded frames
    #[arg(long, value_name = "DIR", default_value = "frames")]
    pub out: PathBuf,
}

impl Args {
    /// Parse the mode argument; unknown names fall back to creative_nodes.
    pub fn parse_mode(&self) -> VisualizerMode {
        match self.mode.parse::<VisualizerMode>() {
            Ok(mode) => {
                info!("Mode: {}", mode);
                mode
            }
            Err(e) => {
                warn!("{}, using creative_nodes", e);
                VisualizerMode::CreativeNodes
            }
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(width) = self.width.filter(|w| *w > 0) {
            config.window_width = width;
        }
        if let Some(height) = self.height.filter(|h| *h > 0) {
            config.window_height = height;
        }
        config
    }

    /// Track state from `--track`. Without one, or when the file cannot be
    /// read or parsed, a playing track with neutral features.
    pub fn load_track_state(&self) -> TrackState {
        let neutral = || TrackState {
            is_playing: true,
            ..Default::default()
        };
        let Some(path) = &self.track else {
            return neutral();
        };
        match read_track_state(path) {
            Ok(state) => {
                info!("Loaded track state from {:?}", path);
                state
            }
            Err(e) => {
                warn!("Failed to load track state {:?}: {}, using defaults", path, e);
                neutral()
            }
        }
    }

    /// Decode `--cover`. An unreadable cover is logged and ignored.
    pub fn load_cover(&self) -> Option<DynamicImage> {
        let path = self.cover.as_ref()?;
        match image::open(path) {
            Ok(img) => {
                info!("Loaded cover {:?} ({}x{})", path, img.width(), img.height());
                Some(img)
            }
            Err(e) => {
                warn!("Failed to load cover {:?}: {}", path, e);
                None
            }
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(frames) = self.record else {
            return Ok(None);
        };
        let config = RecordingConfig::new(frames, &self.out);
        fs::create_dir_all(&config.output_dir)?;
        Ok(Some(config))
    }
}

fn read_track_state(path: &Path) -> Result<TrackState> {
    TrackState::from_json(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mode_falls_back() {
        let args = Args::parse_from(["coverwave", "--mode", "kaleidoscope"]);
        assert_eq!(args.parse_mode(), VisualizerMode::CreativeNodes);

        let args = Args::parse_from(["coverwave", "--mode", "spectrum"]);
        assert_eq!(args.parse_mode(), VisualizerMode::Spectrum);
    }

    #[test]
    fn test_size_overrides() {
        let args = Args::parse_from(["coverwave", "--width", "640", "--height", "0"]);
        let config = args.render_config();
        assert_eq!(config.window_width, 640);
        assert_eq!(config.window_height, 720);
    }

    #[test]
    fn test_missing_track_defaults_to_playing() {
        let args = Args::parse_from(["coverwave"]);
        let state = args.load_track_state();
        assert!(state.is_playing);
        assert!(args.create_recording_config().unwrap().is_none());
    }

    #[test]
    fn test_unreadable_track_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("coverwave-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        fs::write(&path, "{ this is not json").unwrap();

        let args = Args::parse_from(["coverwave", "--track", path.to_str().unwrap()]);
        let state = args.load_track_state();
        assert!(state.is_playing);
        assert_eq!(state.audio_features, Default::default());

        let missing = Args::parse_from(["coverwave", "--track", "/nonexistent/track.json"]);
        assert!(missing.load_track_state().is_playing);

        fs::remove_dir_all(&dir).unwrap();
    }
}
