//! Synthetic equalizer bars driven by the track descriptors.

use glam::Vec2;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Visualizer;
use crate::color::{Rgb, Rgba, Theme};
use crate::features::{AudioFeatures, TrackState};
use crate::params::SpectrumConfig;
use crate::surface::Surface;

pub struct SpectrumBars {
    config: SpectrumConfig,
    bars: Vec<f32>,

    features: AudioFeatures,
    intensity: f32,
    speed: f32,

    primary: Rgb,
    accent: Rgb,

    phase_time: f32,
    running: bool,
    is_playing: bool,
    rng: StdRng,
}

impl SpectrumBars {
    /// Layout is derived from the surface on every draw.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, SpectrumConfig::default())
    }

    pub fn with_config(seed: u64, config: SpectrumConfig) -> Self {
        let theme = Theme::idle();
        let mut bars = Self {
            bars: Vec::new(),
            config,
            features: AudioFeatures::default(),
            intensity: 0.0,
            speed: 0.0,
            primary: theme.primary,
            accent: theme.accent,
            phase_time: 0.0,
            running: false,
            is_playing: false,
            rng: StdRng::seed_from_u64(seed),
        };
        bars.apply_features();
        bars
    }

    /// Current bar heights as fractions of the tallest bar.
    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    fn apply_features(&mut self) {
        let f = &self.features;
        self.intensity = 0.3 + f.energy;
        self.speed = 0.7 + f.danceability * 0.9 + f.energy * 0.4;

        let base = self.config.base_bars;
        let count = base + (f.energy.clamp(0.0, 1.0) * base as f32).round() as usize;
        if count != self.bars.len() {
            debug!("Spectrum bars: {} -> {}", self.bars.len(), count);
            self.bars = vec![0.0; count];
        }
    }
}

impl Visualizer for SpectrumBars {
    fn name(&self) -> &'static str {
        "spectrum"
    }

    fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!("Spectrum started ({} bars)", self.bars.len());
        }
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("Spectrum stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resize(&mut self, width: u32, height: u32) {
        debug!("Spectrum resized to {}x{}", width, height);
    }

    fn set_track_state(&mut self, state: &TrackState) {
        self.features.merge(&state.audio_features);
        self.is_playing = state.is_playing;
        self.apply_features();
    }

    fn set_theme(&mut self, theme: &Theme) {
        self.primary = theme.primary;
        self.accent = theme.accent;
    }

    /// Ease every bar toward its wave target. While nothing plays the
    /// targets are zero and the bars settle.
    fn tick(&mut self, dt: f32) {
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.phase_time += dt * self.speed * (self.features.tempo / 120.0);
        let easing = (self.config.easing * dt * 60.0).min(1.0);

        for (i, bar) in self.bars.iter_mut().enumerate() {
            let target = if self.is_playing {
                let phase = self.phase_time * 2.0 + i as f32 * 0.27;
                let wave = (phase.sin() + 1.0) * 0.5;
                let jitter = self.rng.gen_range(0.0..self.config.jitter);
                self.intensity * (0.35 + 0.65 * wave) + jitter * 0.4
            } else {
                0.0
            };
            *bar += (target - *bar) * easing;
        }
    }

    fn draw(&mut self, surface: &mut dyn Surface) {
        let (w, h) = (surface.width(), surface.height());
        let [r, g, b, a] = self.config.wash;
        surface.fill(Rgba::new(r / 255.0, g / 255.0, b / 255.0, a));

        if self.bars.is_empty() {
            return;
        }

        let slot = w / self.bars.len() as f32;
        let width = slot * 0.6;
        let base = self.primary.with_alpha(0.15);

        for (i, value) in self.bars.iter().enumerate() {
            let height = value * h * self.config.max_height_fraction;
            if height <= 0.0 {
                continue;
            }
            let x = i as f32 * slot + slot * 0.2;
            let y = h - height - self.config.bottom_margin;
            let top = Rgb::mix(self.primary, self.accent, value.clamp(0.0, 1.0)).with_alpha(0.9);

            surface.fill_bar(Vec2::new(x, y), Vec2::new(width, height), base, top);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PartialAudioFeatures;
    use crate::surface::Canvas;

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
    fn test_bar_count_follows_energy() {
        let mut spectrum = SpectrumBars::new(1);
        spectrum.set_track_state(&playing(0.0));
        assert_eq!(spectrum.bar_count(), 56);
        spectrum.set_track_state(&playing(1.0));
        assert_eq!(spectrum.bar_count(), 112);
        spectrum.set_track_state(&playing(0.5));
        assert_eq!(spectrum.bar_count(), 84);
    }

    #[test]
    fn test_bars_reset_when_count_changes() {
        let mut spectrum = SpectrumBars::new(2);
        spectrum.set_track_state(&playing(0.5));
        spectrum.start();
        for _ in 0..30 {
            spectrum.tick(1.0 / 60.0);
        }
        assert!(spectrum.bars().iter().any(|b| *b > 0.0));

        spectrum.set_track_state(&playing(0.9));
        assert!(spectrum.bars().iter().all(|b| *b == 0.0));
    }

    #[test]
    fn test_bars_stay_within_target_envelope() {
        let mut spectrum = SpectrumBars::new(3);
        spectrum.set_track_state(&playing(0.8));
        spectrum.start();
        let ceiling = spectrum.intensity() + 0.25 * 0.4;
        for _ in 0..600 {
            spectrum.tick(1.0 / 60.0);
            assert!(spectrum.bars().iter().all(|b| *b >= 0.0 && *b <= ceiling));
        }
    }

    #[test]
    fn test_bars_settle_when_paused_playback() {
        let mut spectrum = SpectrumBars::new(4);
        spectrum.set_track_state(&playing(0.8));
        spectrum.start();
        for _ in 0..60 {
            spectrum.tick(1.0 / 60.0);
        }
        spectrum.set_track_state(&TrackState {
            is_playing: false,
            ..playing(0.8)
        });
        for _ in 0..600 {
            spectrum.tick(1.0 / 60.0);
        }
        assert!(spectrum.bars().iter().all(|b| *b < 1e-3));
    }

    #[test]
    fn test_draw_lights_bottom_of_surface() {
        let mut spectrum = SpectrumBars::new(5);
        let mut theme = Theme::idle();
        theme.primary = Rgb::WHITE;
        spectrum.set_theme(&theme);
        spectrum.set_track_state(&playing(1.0));
        spectrum.start();
        for _ in 0..120 {
            spectrum.tick(1.0 / 60.0);
        }

        let mut canvas = Canvas::new(200, 100).unwrap();
        spectrum.draw(&mut canvas);
        let lit = (0..200).filter(|x| canvas.pixel(*x, 85).r > 0.03).count();
        assert!(lit > 20, "only {} lit pixels", lit);
    }
}
