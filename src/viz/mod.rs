//! Visualizer interface, mode selection and the manager that owns the
//! active visualizer.

pub mod spectrum;

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use image::DynamicImage;
use log::{error, info, warn};

use crate::color::{Rgba, Theme, ThemeBuilder, ThemeRequest};
use crate::features::{AudioFeatures, TrackState};
use crate::sim::SimulationEngine;
use crate::surface::Surface;
use crate::VisualizerError;
use spectrum::SpectrumBars;

/// Anything that can be driven by the render loop.
pub trait Visualizer {
    fn name(&self) -> &'static str;

    /// Idempotent. Resumes from current state.
    fn start(&mut self);

    /// Idempotent. No tick happens until the next `start`.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    fn resize(&mut self, width: u32, height: u32);

    fn set_track_state(&mut self, state: &TrackState);

    fn set_theme(&mut self, theme: &Theme);

    /// Advance by `dt` seconds.
    fn tick(&mut self, dt: f32);

    fn draw(&mut self, surface: &mut dyn Surface);
}

/// Closed set of selectable modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualizerMode {
    Particles,
    CreativeNodes,
    Spectrum,
}

impl VisualizerMode {
    pub const ALL: [VisualizerMode; 3] = [
        VisualizerMode::Particles,
        VisualizerMode::CreativeNodes,
        VisualizerMode::Spectrum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VisualizerMode::Particles => "particles",
            VisualizerMode::CreativeNodes => "creative_nodes",
            VisualizerMode::Spectrum => "spectrum",
        }
    }

    /// `particles` and `creative_nodes` share the node simulation.
    pub fn uses_node_simulation(self) -> bool {
        matches!(self, VisualizerMode::Particles | VisualizerMode::CreativeNodes)
    }

    fn build(self, width: u32, height: u32, seed: u64) -> Box<dyn Visualizer> {
        if self.uses_node_simulation() {
            Box::new(SimulationEngine::new(width, height, seed))
        } else {
            Box::new(SpectrumBars::new(seed))
        }
    }
}

impl fmt::Display for VisualizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizerMode {
    type Err = VisualizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "particles" => Ok(VisualizerMode::Particles),
            "creative_nodes" | "creative-nodes" | "nodes" => Ok(VisualizerMode::CreativeNodes),
            "spectrum" => Ok(VisualizerMode::Spectrum),
            other => Err(VisualizerError::UnknownMode(other.to_string())),
        }
    }
}

/// Whether the manager can still drive its visualizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Ok,
    /// A required component failed; nothing ticks and a static frame is
    /// drawn instead
    Failed { reason: String },
}

type ThemeListener = Box<dyn FnMut(&Theme)>;

/// Owns the active visualizer, the current theme and the retained track
/// state, and switches modes on request.
pub struct VisualizerManager {
    mode: VisualizerMode,
    active: Box<dyn Visualizer>,
    theme_builder: ThemeBuilder,
    theme: Theme,
    features: AudioFeatures,
    last_state: Option<TrackState>,
    listeners: Vec<ThemeListener>,
    health: Health,
    size: (u32, u32),
    seed: u64,
}

impl VisualizerManager {
    pub fn new(mode: VisualizerMode, width: u32, height: u32, seed: u64) -> Self {
        let theme = Theme::idle();
        let mut active = mode.build(width, height, seed);
        active.set_theme(&theme);
        Self {
            mode,
            active,
            theme_builder: ThemeBuilder::default(),
            theme,
            features: AudioFeatures::default(),
            last_state: None,
            listeners: Vec::new(),
            health: Health::Ok,
            size: (width, height),
            seed,
        }
    }

    pub fn mode(&self) -> VisualizerMode {
        self.mode
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn features(&self) -> &AudioFeatures {
        &self.features
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn active(&self) -> &dyn Visualizer {
        self.active.as_ref()
    }

    /// Switch by name. Unknown names are logged and ignored.
    pub fn set_mode(&mut self, name: &str) {
        match name.parse::<VisualizerMode>() {
            Ok(mode) => self.switch_to(mode),
            Err(e) => warn!("Ignoring mode switch: {}", e),
        }
    }

    pub fn switch_to(&mut self, mode: VisualizerMode) {
        if mode == self.mode {
            return;
        }
        let same_engine = mode.uses_node_simulation() == self.mode.uses_node_simulation();
        self.mode = mode;
        if same_engine {
            info!("Mode: {} (same engine)", mode);
            return;
        }

        let was_running = self.active.is_running();
        self.active.stop();

        let (width, height) = self.size;
        let mut next = mode.build(width, height, self.seed);
        if let Some(state) = &self.last_state {
            next.set_track_state(state);
        }
        next.set_theme(&self.theme);
        if was_running {
            next.start();
        }
        self.active = next;
        info!("Mode: {}", mode);
    }

    /// Register a callback fired whenever the theme changes.
    pub fn on_theme_change(&mut self, listener: impl FnMut(&Theme) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Feed a new poll result: rebuild the theme, then hand the state to the
    /// active visualizer.
    pub fn update_from_track(&mut self, state: &TrackState, album_image: Option<&DynamicImage>) {
        self.features.merge(&state.audio_features);

        let request = ThemeRequest::new(self.features)
            .duration_ms(state.duration_ms.unwrap_or(180_000))
            .playing(state.is_playing)
            .album_image(album_image)
            .album_colors(state.album_colors.as_ref());
        let theme = self.theme_builder.build(request);

        self.active.set_track_state(state);
        self.last_state = Some(state.clone());
        self.apply_theme(theme);
    }

    fn apply_theme(&mut self, theme: Theme) {
        let changed = theme != self.theme;
        self.theme = theme;
        self.active.set_theme(&self.theme);
        if changed {
            info!(
                "Theme: mood={} primary={} vibrancy={}",
                self.theme.mood,
                self.theme.primary_hex(),
                self.theme.vibrancy.as_str()
            );
            for listener in &mut self.listeners {
                listener(&self.theme);
            }
        }
    }

    /// Put the manager into the failed state; it stops ticking for good.
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        error!("Visualizer failed: {}", reason);
        self.active.stop();
        self.health = Health::Failed { reason };
    }

    pub fn is_healthy(&self) -> bool {
        self.health == Health::Ok
    }
}

impl Visualizer for VisualizerManager {
    fn name(&self) -> &'static str {
        self.mode.as_str()
    }

    fn start(&mut self) {
        if self.is_healthy() {
            self.active.start();
        }
    }

    fn stop(&mut self) {
        self.active.stop();
    }

    fn is_running(&self) -> bool {
        self.is_healthy() && self.active.is_running()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.active.resize(width, height);
    }

    fn set_track_state(&mut self, state: &TrackState) {
        self.update_from_track(state, None);
    }

    fn set_theme(&mut self, theme: &Theme) {
        self.apply_theme(theme.clone());
    }

    fn tick(&mut self, dt: f32) {
        if self.is_healthy() {
            self.active.tick(dt);
        }
    }

    fn draw(&mut self, surface: &mut dyn Surface) {
        match self.health {
            Health::Ok => self.active.draw(surface),
            Health::Failed { .. } => draw_failure(surface),
        }
    }
}

/// Static "unavailable" frame: dark backdrop with a warning sign in the
/// middle. The reason itself goes to the log and the window title.
fn draw_failure(surface: &mut dyn Surface) {
    const WARNING: Rgba = Rgba::new(0.96, 0.62, 0.04, 0.9);

    surface.clear(Rgba::new(0.06, 0.09, 0.16, 1.0));

    let center = Vec2::new(surface.width(), surface.height()) * 0.5;
    let size = surface.width().min(surface.height()) * 0.12;
    surface.stroke_circle(center, size, (size * 0.12).max(1.0), WARNING);

    let bar = Vec2::new(size * 0.25, size * 0.9);
    surface.fill_bar(
        center - Vec2::new(bar.x * 0.5, size * 0.65),
        bar,
        WARNING,
        WARNING,
    );
    surface.fill_circle(center + Vec2::new(0.0, size * 0.55), bar.x * 0.6, WARNING);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PartialAudioFeatures;
    use crate::surface::Canvas;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn playing(energy: f32) -> TrackState {
        TrackState {
            audio_features: PartialAudioFeatures {
                energy: Some(energy),
                ..Default::default()
            },
            is_playing: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("spectrum".parse::<VisualizerMode>().unwrap(), VisualizerMode::Spectrum);
        assert_eq!(
            " Creative_Nodes ".parse::<VisualizerMode>().unwrap(),
            VisualizerMode::CreativeNodes
        );
        assert!(matches!(
            "kaleidoscope".parse::<VisualizerMode>(),
            Err(VisualizerError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_unknown_mode_is_a_no_op() {
        let mut manager = VisualizerManager::new(VisualizerMode::Spectrum, 320, 200, 1);
        manager.start();
        manager.set_mode("kaleidoscope");
        assert_eq!(manager.mode(), VisualizerMode::Spectrum);
        assert_eq!(manager.active().name(), "spectrum");
        assert!(manager.is_running());
    }

    #[test]
    fn test_switching_keeps_running_state_and_track() {
        let mut manager = VisualizerManager::new(VisualizerMode::CreativeNodes, 320, 200, 1);
        manager.update_from_track(&playing(0.9), None);
        manager.start();

        manager.set_mode("spectrum");
        assert_eq!(manager.active().name(), "spectrum");
        assert!(manager.is_running());

        manager.set_mode("particles");
        assert_eq!(manager.mode(), VisualizerMode::Particles);
        assert_eq!(manager.active().name(), "creative_nodes");
        assert!(manager.is_running());
    }

    #[test]
    fn test_theme_listeners_fire_on_change_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut manager = VisualizerManager::new(VisualizerMode::CreativeNodes, 320, 200, 1);
        let sink = Rc::clone(&seen);
        manager.on_theme_change(move |theme| sink.borrow_mut().push(theme.mood));

        manager.update_from_track(&playing(0.9), None);
        manager.update_from_track(&playing(0.9), None);
        assert_eq!(seen.borrow().len(), 1);

        manager.update_from_track(&TrackState::default(), None);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(manager.theme().mood_label(), "idle");
    }

    #[test]
    fn test_failed_manager_stops_ticking_and_draws_static_frame() {
        let mut manager = VisualizerManager::new(VisualizerMode::CreativeNodes, 64, 64, 1);
        manager.start();
        manager.fail("surface lost");

        assert!(!manager.is_running());
        manager.start();
        assert!(!manager.is_running());

        let mut canvas = Canvas::new(64, 64).unwrap();
        manager.tick(0.016);
        manager.draw(&mut canvas);
        let first = canvas.as_raw().to_vec();
        manager.tick(0.016);
        manager.draw(&mut canvas);
        assert_eq!(first, canvas.as_raw());
        assert!(matches!(manager.health(), Health::Failed { .. }));

        // Warning sign in the middle, dark backdrop in the corner.
        let mark = canvas.pixel(32, 30);
        assert!(mark.r > 0.5 && mark.b < 0.3);
        let corner = canvas.pixel(2, 2);
        assert!(corner.r < 0.1 && corner.b < 0.2);
    }
}
