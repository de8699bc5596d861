//! Colour maths, album palette extraction and theme synthesis.

pub mod math;
pub mod mood;
pub mod palette;
pub mod theme;

// Re-export public types
pub use self::math::{Hsl, Rgb, Rgba};
pub use self::mood::{Mood, MoodClassifier};
pub use self::palette::{AlbumPalette, ColorMood, ExtractorConfig, PaletteExtractor, PrecomputedPalette};
pub use self::theme::{Theme, ThemeBuilder, ThemeRequest, Vibrancy};
