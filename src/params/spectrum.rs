//! Spectrum bar field configuration.

/// Spectrum bar field tuning
#[derive(Debug, Clone)]
pub struct SpectrumConfig {
    /// Bars at zero energy; full energy doubles this
    pub base_bars: usize,

    /// Fraction of the remaining gap closed per 60 Hz frame
    pub easing: f32,

    /// Tallest bar as a fraction of the surface height
    pub max_height_fraction: f32,

    /// Gap between the bars and the bottom edge (pixels)
    pub bottom_margin: f32,

    /// Wash drawn over the previous frame: RGB 0-255 and alpha
    pub wash: [f32; 4],

    /// Upper bound of the random jitter added to each target
    pub jitter: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            base_bars: 56,
            easing: 0.15,
            max_height_fraction: 0.7,
            bottom_margin: 10.0,
            wash: [3.0, 7.0, 18.0, 0.45],
            jitter: 0.25,
        }
    }
}
