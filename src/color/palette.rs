//! Dominant colour extraction from album artwork.

use std::collections::HashMap;
use std::path::Path;

use image::{imageops, DynamicImage, RgbaImage};
use log::{debug, warn};
use serde::Deserialize;

use super::math::{Hsl, Rgb};

/// Sampling parameters for the cover histogram.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Side of the square raster the cover is fitted into (pixels)
    pub raster_size: u32,

    /// Only every `stride`-th pixel of the raster is counted
    pub stride: usize,

    /// Pixels with alpha below this are ignored (letterbox padding, cut-outs)
    pub alpha_threshold: u8,

    /// Number of colours kept from the histogram
    pub top_k: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            raster_size: 64,
            stride: 4,
            alpha_threshold: 128,
            top_k: 6,
        }
    }
}

/// Coarse character of a palette, judged from its average HSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMood {
    Ethereal,
    Noir,
    Monochrome,
    Fiery,
    Sunny,
    Verdant,
    Oceanic,
    DeepBlue,
    Mystic,
    #[serde(other)]
    Balanced,
}

impl ColorMood {
    /// Classify a set of colours by mean saturation, lightness and hue.
    pub fn from_colors(colors: &[Rgb]) -> ColorMood {
        if colors.is_empty() {
            return ColorMood::Balanced;
        }
        let n = colors.len() as f32;
        let hsl: Vec<Hsl> = colors.iter().map(|c| c.to_hsl()).collect();
        let sat = hsl.iter().map(|c| c.s).sum::<f32>() / n;
        let light = hsl.iter().map(|c| c.l).sum::<f32>() / n;
        let hue = hsl.iter().map(|c| c.h).sum::<f32>() / n;

        if sat < 30.0 {
            return if light > 70.0 {
                ColorMood::Ethereal
            } else if light < 30.0 {
                ColorMood::Noir
            } else {
                ColorMood::Monochrome
            };
        }

        match hue {
            h if !(30.0..330.0).contains(&h) => ColorMood::Fiery,
            h if h < 90.0 => ColorMood::Sunny,
            h if h < 150.0 => ColorMood::Verdant,
            h if h < 210.0 => ColorMood::Oceanic,
            h if h < 270.0 => ColorMood::DeepBlue,
            _ => ColorMood::Mystic,
        }
    }
}

/// Colour-wheel relatives of the dominant colour.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteHarmony {
    pub complementary: Rgb,
    pub analogous: [Rgb; 2],
    pub triadic: [Rgb; 2],
    pub monochromatic: [Rgb; 4],
    pub backgrounds: [Rgb; 2],
}

impl PaletteHarmony {
    pub fn from_base(base: Rgb) -> Self {
        let hsl = base.to_hsl();
        let mono = |l: f32| Hsl::new(hsl.h, hsl.s, l).to_rgb();

        Self {
            complementary: hsl.rotate(180.0).to_rgb(),
            analogous: [hsl.rotate(30.0).to_rgb(), hsl.rotate(-30.0).to_rgb()],
            triadic: [hsl.rotate(120.0).to_rgb(), hsl.rotate(-120.0).to_rgb()],
            monochromatic: [mono(20.0), mono(40.0), mono(60.0), mono(80.0)],
            backgrounds: [
                Hsl::new(hsl.h, hsl.s * 0.3, hsl.l * 0.2).to_rgb(),
                Hsl::new(hsl.h, hsl.s * 0.5, hsl.l * 0.3).to_rgb(),
            ],
        }
    }
}

/// Colours taken from (or substituted for) an album cover.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumPalette {
    pub dominant: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    /// Most frequent colours first, at least three entries
    pub colors: Vec<Rgb>,
    pub text: Rgb,
    pub harmony: PaletteHarmony,
    pub mood: ColorMood,
    /// WCAG contrast ratio between dominant and accent
    pub contrast_ratio: f32,
    /// Background gradient supplied by a precomputed palette, if any
    pub background_gradient: Option<[Rgb; 3]>,
    /// True when this is the fixed fallback palette
    pub is_default: bool,
}

impl AlbumPalette {
    /// Build a palette from colours sorted by frequency. Missing secondary
    /// and accent entries are derived from the dominant colour.
    pub fn from_ranked(colors: Vec<Rgb>) -> Option<Self> {
        let dominant = *colors.first()?;
        let secondary = colors
            .get(1)
            .copied()
            .unwrap_or_else(|| dominant.scale_luminance(1.2));
        let accent = colors
            .get(2)
            .copied()
            .unwrap_or_else(|| dominant.scale_luminance(0.7));

        let mut ranked = colors;
        if ranked.len() < 3 {
            ranked = vec![dominant, secondary, accent];
        }

        Some(Self::assemble(dominant, secondary, accent, ranked, false))
    }

    /// Fixed palette used whenever no usable artwork is available: dark
    /// slate background with green and sky-blue highlights.
    pub fn fallback() -> Self {
        let dominant = Rgb::new(15.0, 23.0, 42.0);
        let secondary = Rgb::new(34.0, 197.0, 94.0);
        let accent = Rgb::new(56.0, 189.0, 248.0);
        Self::assemble(
            dominant,
            secondary,
            accent,
            vec![dominant, secondary, accent],
            true,
        )
    }

    fn assemble(
        dominant: Rgb,
        secondary: Rgb,
        accent: Rgb,
        colors: Vec<Rgb>,
        is_default: bool,
    ) -> Self {
        let contrast_ratio = contrast_ratio(dominant, accent);
        Self {
            dominant,
            secondary,
            accent,
            text: dominant.contrast_text(),
            harmony: PaletteHarmony::from_base(dominant),
            mood: if is_default {
                ColorMood::Balanced
            } else {
                ColorMood::from_colors(&colors[..colors.len().min(5)])
            },
            contrast_ratio,
            background_gradient: None,
            colors,
            is_default,
        }
    }
}

/// WCAG contrast ratio in [1, 21].
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f32 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

/// Palette computed ahead of time by the data collaborator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrecomputedPalette {
    pub dominant_hex: String,
    pub palette_hex: Vec<String>,
    pub accent_hex: Option<String>,
    pub background_gradient: Option<Vec<String>>,
    pub text_color: Option<String>,
    pub color_mood: Option<ColorMood>,
}

impl PrecomputedPalette {
    /// Convert into an [`AlbumPalette`]. Entries that fail to parse are
    /// dropped; an unusable dominant colour yields the fallback palette.
    pub fn to_album_palette(&self) -> AlbumPalette {
        let Some(dominant) = Rgb::from_hex(&self.dominant_hex) else {
            warn!(
                "Precomputed palette has invalid dominant colour '{}', using default",
                self.dominant_hex
            );
            return AlbumPalette::fallback();
        };

        let mut colors = vec![dominant];
        for hex in &self.palette_hex {
            match Rgb::from_hex(hex) {
                Some(c) if c != dominant => colors.push(c),
                Some(_) => {}
                None => warn!("Skipping invalid palette colour '{}'", hex),
            }
        }

        let Some(mut palette) = AlbumPalette::from_ranked(colors) else {
            return AlbumPalette::fallback();
        };

        if let Some(accent) = self.accent_hex.as_deref().and_then(Rgb::from_hex) {
            palette.accent = accent;
            palette.contrast_ratio = contrast_ratio(palette.dominant, accent);
        }
        if let Some(text) = self.text_color.as_deref().and_then(Rgb::from_hex) {
            palette.text = text;
        }
        if let Some(mood) = self.color_mood {
            palette.mood = mood;
        }
        palette.background_gradient = self.background_gradient.as_ref().and_then(|stops| {
            let parsed: Vec<Rgb> = stops.iter().filter_map(|s| Rgb::from_hex(s)).collect();
            match parsed.as_slice() {
                [a, b, c, ..] => Some([*a, *b, *c]),
                [a, b] => Some([*a, *b, *b]),
                _ => None,
            }
        });

        palette
    }
}

/// Histogram-based dominant colour extractor.
#[derive(Debug, Clone, Default)]
pub struct PaletteExtractor {
    config: ExtractorConfig,
}

impl PaletteExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract from an already decoded image. `None`, empty images and
    /// fully transparent images all resolve to [`AlbumPalette::fallback`].
    pub fn extract(&self, image: Option<&DynamicImage>) -> AlbumPalette {
        let Some(image) = image else {
            debug!("No cover image, using default palette");
            return AlbumPalette::fallback();
        };

        let ranked = self.ranked_colors(image);
        match AlbumPalette::from_ranked(ranked) {
            Some(palette) => palette,
            None => {
                warn!("Cover has no opaque pixels, using default palette");
                AlbumPalette::fallback()
            }
        }
    }

    /// Decode and extract from encoded bytes (PNG, JPEG, ...).
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> AlbumPalette {
        match image::load_from_memory(bytes) {
            Ok(img) => self.extract(Some(&img)),
            Err(e) => {
                warn!("Failed to decode cover image: {}", e);
                AlbumPalette::fallback()
            }
        }
    }

    /// Decode and extract from a file on disk.
    pub fn extract_from_path(&self, path: Option<&Path>) -> AlbumPalette {
        let Some(path) = path else {
            return AlbumPalette::fallback();
        };
        match image::open(path) {
            Ok(img) => self.extract(Some(&img)),
            Err(e) => {
                warn!("Failed to load cover {:?}: {}", path, e);
                AlbumPalette::fallback()
            }
        }
    }

    /// Fit the image into the sampling raster, centred, keeping its aspect
    /// ratio. Uncovered raster pixels stay transparent.
    fn rasterize(&self, image: &DynamicImage) -> Option<RgbaImage> {
        let (w, h) = (image.width(), image.height());
        if w == 0 || h == 0 {
            return None;
        }

        let size = self.config.raster_size.max(1);
        let scale = (size as f32 / w as f32).min(size as f32 / h as f32);
        let draw_w = ((w as f32 * scale).round() as u32).clamp(1, size);
        let draw_h = ((h as f32 * scale).round() as u32).clamp(1, size);

        let scaled = imageops::resize(
            &image.to_rgba8(),
            draw_w,
            draw_h,
            imageops::FilterType::Triangle,
        );

        let mut raster = RgbaImage::new(size, size);
        let dx = ((size - draw_w) / 2) as i64;
        let dy = ((size - draw_h) / 2) as i64;
        imageops::overlay(&mut raster, &scaled, dx, dy);
        Some(raster)
    }

    /// Exact-RGB histogram over every `stride`-th raster pixel, most
    /// frequent first. Equal counts keep first-seen order.
    fn ranked_colors(&self, image: &DynamicImage) -> Vec<Rgb> {
        let Some(raster) = self.rasterize(image) else {
            return Vec::new();
        };

        let mut index: HashMap<[u8; 3], usize> = HashMap::new();
        let mut counts: Vec<([u8; 3], u32)> = Vec::new();

        for pixel in raster.pixels().step_by(self.config.stride.max(1)) {
            let [r, g, b, a] = pixel.0;
            if a < self.config.alpha_threshold {
                continue;
            }
            let key = [r, g, b];
            match index.get(&key) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    index.insert(key, counts.len());
                    counts.push((key, 1));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        counts
            .into_iter()
            .take(self.config.top_k)
            .map(|([r, g, b], _)| Rgb::new(r as f32, g as f32, b as f32))
            .collect()
    }
}
