//! Theme synthesis: album colours + mood + audio features.

use image::DynamicImage;
use log::debug;

use super::math::Rgb;
use super::mood::{Mood, MoodClassifier};
use super::palette::{AlbumPalette, ColorMood, PaletteExtractor, PrecomputedPalette};
use crate::features::AudioFeatures;

/// Cold end of the valence axis (sky blue)
const COLD: Rgb = Rgb::new(56.0, 189.0, 248.0);
/// Warm end of the valence axis (pink)
const WARM: Rgb = Rgb::new(244.0, 114.0, 182.0);

/// Node colours used when no album palette is available.
pub const DEFAULT_NODE_PALETTE: [Rgb; 3] = [
    Rgb::new(34.0, 197.0, 94.0),
    Rgb::new(59.0, 130.0, 246.0),
    Rgb::new(168.0, 85.0, 247.0),
];

const IDLE_BACKGROUND: [Rgb; 3] = [
    Rgb::new(15.0, 23.0, 42.0),
    Rgb::new(2.0, 6.0, 23.0),
    Rgb::new(2.0, 6.0, 23.0),
];

/// Energy bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vibrancy {
    Low,
    Medium,
    High,
}

impl Vibrancy {
    pub fn from_energy(energy: f32) -> Self {
        if energy > 0.7 {
            Vibrancy::High
        } else if energy > 0.4 {
            Vibrancy::Medium
        } else {
            Vibrancy::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Vibrancy::Low => "low",
            Vibrancy::Medium => "medium",
            Vibrancy::High => "high",
        }
    }
}

/// Fully populated colour theme for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub background_gradient: [Rgb; 3],
    pub text: Rgb,
    pub connection: Rgb,
    pub glow: Rgb,
    pub complementary: Rgb,
    pub analogous: [Rgb; 2],
    /// Colours handed out to simulated nodes
    pub palette: Vec<Rgb>,

    pub energy_intensity: f32,
    pub vibrancy: Vibrancy,
    pub visual_intensity: f32,
    pub speed_factor: f32,
    pub pulse_factor: f32,
    pub tempo: f32,

    pub mood: Mood,
    pub color_mood: ColorMood,
}

impl Theme {
    /// Theme shown while nothing is playing: fallback colours over a fixed
    /// dark background.
    pub fn idle() -> Self {
        let palette = AlbumPalette::fallback();
        Self {
            primary: palette.dominant,
            secondary: palette.secondary,
            accent: palette.accent,
            background_gradient: IDLE_BACKGROUND,
            text: Rgb::WHITE,
            connection: Rgb::mix(palette.secondary, palette.accent, 0.5),
            glow: palette.accent,
            complementary: palette.harmony.complementary,
            analogous: palette.harmony.analogous,
            palette: DEFAULT_NODE_PALETTE.to_vec(),
            energy_intensity: 0.0,
            vibrancy: Vibrancy::Low,
            visual_intensity: 0.0,
            speed_factor: 0.5,
            pulse_factor: 0.6,
            tempo: 0.0,
            mood: Mood::Idle,
            color_mood: ColorMood::Noir,
        }
    }

    pub fn mood_label(&self) -> &'static str {
        self.mood.label()
    }

    pub fn primary_hex(&self) -> String {
        self.primary.to_hex()
    }

    pub fn secondary_hex(&self) -> String {
        self.secondary.to_hex()
    }

    pub fn accent_hex(&self) -> String {
        self.accent.to_hex()
    }

    pub fn text_hex(&self) -> String {
        self.text.to_hex()
    }

    pub fn background_hex(&self) -> [String; 3] {
        self.background_gradient.map(|c| c.to_hex())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::idle()
    }
}

/// Inputs to [`ThemeBuilder::build`].
#[derive(Debug, Clone, Copy)]
pub struct ThemeRequest<'a> {
    pub features: AudioFeatures,
    pub duration_ms: u64,
    pub is_playing: bool,
    pub album_image: Option<&'a DynamicImage>,
    /// Takes precedence over `album_image` when present
    pub album_colors: Option<&'a PrecomputedPalette>,
}

impl<'a> ThemeRequest<'a> {
    pub fn new(features: AudioFeatures) -> Self {
        Self {
            features,
            duration_ms: 180_000,
            is_playing: true,
            album_image: None,
            album_colors: None,
        }
    }

    pub fn duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn playing(mut self, is_playing: bool) -> Self {
        self.is_playing = is_playing;
        self
    }

    pub fn album_image(mut self, image: Option<&'a DynamicImage>) -> Self {
        self.album_image = image;
        self
    }

    pub fn album_colors(mut self, colors: Option<&'a PrecomputedPalette>) -> Self {
        self.album_colors = colors;
        self
    }
}

/// Combines palette extraction, mood classification and feature mapping.
#[derive(Debug, Clone, Default)]
pub struct ThemeBuilder {
    extractor: PaletteExtractor,
    classifier: MoodClassifier,
}

impl ThemeBuilder {
    /// Always returns a complete theme; every failure along the way has
    /// already been replaced by a default.
    pub fn build(&self, request: ThemeRequest<'_>) -> Theme {
        if !request.is_playing {
            return Theme::idle();
        }

        let palette = match request.album_colors {
            Some(pre) => pre.to_album_palette(),
            None => self.extractor.extract(request.album_image),
        };
        let mood = self.classifier.classify(&request.features, request.duration_ms);

        let theme = self.map_features(&request.features, &palette, mood);
        debug!(
            "Theme built: mood={} vibrancy={} primary={}",
            theme.mood,
            theme.vibrancy.as_str(),
            theme.primary_hex()
        );
        theme
    }

    /// Tint the album colours toward the valence colour and derive the
    /// scalar intensities.
    pub fn map_features(&self, f: &AudioFeatures, palette: &AlbumPalette, mood: Mood) -> Theme {
        let energy = f.energy.clamp(0.0, 1.0);
        let valence = f.valence.clamp(0.0, 1.0);
        let danceability = f.danceability.clamp(0.0, 1.0);
        let tempo = f.tempo.max(0.0);

        let mood_color = Rgb::mix(COLD, WARM, valence);

        let primary = Rgb::mix(palette.dominant, mood_color, 0.35);
        let secondary = Rgb::mix(palette.secondary, mood_color, 0.25);
        let accent = Rgb::mix(mood_color, palette.accent, 0.6);

        let bg_base = primary.scale_luminance(0.3 + (1.0 - energy) * 0.4);
        let background = Rgb::mix(bg_base, mood_color, 0.25);
        let background_gradient = palette.background_gradient.unwrap_or([
            background,
            background.scale_luminance(0.6),
            background.scale_luminance(0.35),
        ]);

        let node_palette = if palette.is_default {
            DEFAULT_NODE_PALETTE.to_vec()
        } else {
            palette.colors.clone()
        };

        Theme {
            primary,
            secondary,
            accent,
            background_gradient,
            text: palette.text,
            connection: Rgb::mix(primary, secondary, 0.5),
            glow: accent.brighten(1.3),
            complementary: palette.harmony.complementary,
            analogous: palette.harmony.analogous,
            palette: node_palette,
            energy_intensity: energy,
            vibrancy: Vibrancy::from_energy(energy),
            visual_intensity: (energy * 0.8 + tempo / 200.0).clamp(0.0, 1.0),
            speed_factor: (0.5 + energy).clamp(0.5, 1.8),
            pulse_factor: (0.6 + danceability * 0.8).clamp(0.6, 1.6),
            tempo,
            mood,
            color_mood: palette.mood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PartialAudioFeatures;

    fn features(partial: PartialAudioFeatures) -> AudioFeatures {
        AudioFeatures::from_partial(&partial)
    }

    #[test]
    fn test_energetic_theme() {
        let f = features(PartialAudioFeatures {
            energy: Some(0.9),
            tempo: Some(140.0),
            danceability: Some(0.8),
            valence: Some(0.9),
            ..Default::default()
        });
        let theme = ThemeBuilder::default().build(ThemeRequest::new(f));

        assert_eq!(theme.vibrancy, Vibrancy::High);
        assert_eq!(theme.mood, Mood::Party);
        assert!((theme.energy_intensity - 0.9).abs() < 1e-6);
        assert_eq!(theme.visual_intensity, 1.0);
    }

    #[test]
    fn test_vibrancy_thresholds() {
        assert_eq!(Vibrancy::from_energy(0.71), Vibrancy::High);
        assert_eq!(Vibrancy::from_energy(0.7), Vibrancy::Medium);
        assert_eq!(Vibrancy::from_energy(0.41), Vibrancy::Medium);
        assert_eq!(Vibrancy::from_energy(0.4), Vibrancy::Low);
    }

    #[test]
    fn test_not_playing_gives_idle_theme() {
        let f = features(PartialAudioFeatures {
            energy: Some(0.0),
            tempo: Some(0.0),
            ..Default::default()
        });
        let theme = ThemeBuilder::default().build(ThemeRequest::new(f).playing(false));

        assert_eq!(theme.mood_label(), "idle");
        assert_eq!(theme.background_hex()[0], "#0f172a");
        assert!(theme.background_gradient.iter().all(|c| c.luminance() < 0.2));
    }

    #[test]
    fn test_precomputed_palette_bypasses_image() {
        let pre = PrecomputedPalette {
            dominant_hex: "#ff0000".into(),
            palette_hex: vec!["#00ff00".into(), "#0000ff".into()],
            ..Default::default()
        };
        let theme = ThemeBuilder::default()
            .build(ThemeRequest::new(AudioFeatures::default()).album_colors(Some(&pre)));

        assert_eq!(theme.palette.len(), 3);
        assert_eq!(theme.palette[0].to_hex(), "#ff0000");
        // Primary is the dominant tinted 35% toward the mood colour.
        assert!(theme.primary.r > theme.primary.g);
    }

    #[test]
    fn test_theme_is_always_populated() {
        let theme = ThemeBuilder::default().build(ThemeRequest::new(AudioFeatures::default()));
        assert_eq!(theme.primary_hex().len(), 7);
        assert_eq!(theme.text_hex(), "#ffffff");
        assert!(!theme.palette.is_empty());
        assert!(theme.visual_intensity >= 0.0 && theme.visual_intensity <= 1.0);
    }

    #[test]
    fn test_valence_moves_accent_along_cold_warm_axis() {
        let builder = ThemeBuilder::default();
        let palette = AlbumPalette::fallback();
        let mut sad = AudioFeatures::default();
        sad.valence = 0.0;
        let mut happy = AudioFeatures::default();
        happy.valence = 1.0;

        let cold = builder.map_features(&sad, &palette, Mood::Balanced).accent;
        let warm = builder.map_features(&happy, &palette, Mood::Balanced).accent;
        assert!(warm.r > cold.r);
    }
}
