//! Colour conversions and blending helpers on top of `palette`.
//!
//! Channels of [`Rgb`] are kept as `f32` in [0, 255] so repeated mixing does
//! not accumulate rounding error; rounding only happens when formatting hex.

use palette::{IntoColor, LinSrgb, Mix, Srgb, Srgba};

/// RGB colour with channels in [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// HSL colour: hue in degrees [0, 360), saturation and lightness in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Straight (non-premultiplied) RGBA with all channels in [0, 1], used for
/// drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`. Returns `None` for
    /// anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return None,
        };
        let value = u32::from_str_radix(&expanded, 16).ok()?;

        Some(Self::new(
            ((value >> 16) & 0xff) as f32,
            ((value >> 8) & 0xff) as f32,
            (value & 0xff) as f32,
        ))
    }

    /// Lowercase `#rrggbb`, each channel clamped to [0, 255] and rounded.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    pub fn to_u8(self) -> [u8; 3] {
        let q = |v: f32| v.clamp(0.0, 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Channel-wise linear mix; `t = 0` yields `a`, `t = 1` yields `b`.
    /// `t` is clamped to [0, 1].
    pub fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
        // Mixing is scale-free, so the [0, 255] channels go in as they are.
        let t = t.clamp(0.0, 1.0);
        let mixed = Srgb::new(a.r, a.g, a.b).mix(Srgb::new(b.r, b.g, b.b), t);
        Rgb::new(mixed.red, mixed.green, mixed.blue)
    }

    /// Normalized sRGB, channels clamped to [0, 1].
    pub fn to_srgb(self) -> Srgb {
        let n = |v: f32| (v / 255.0).clamp(0.0, 1.0);
        Srgb::new(n(self.r), n(self.g), n(self.b))
    }

    pub fn from_srgb(c: Srgb) -> Rgb {
        Rgb::new(c.red * 255.0, c.green * 255.0, c.blue * 255.0)
    }

    /// Multiply every channel by `factor`, clamping to [0, 255].
    pub fn scale_luminance(self, factor: f32) -> Rgb {
        let f = |v: f32| (v * factor).clamp(0.0, 255.0);
        Rgb::new(f(self.r), f(self.g), f(self.b))
    }

    /// Perceived brightness in [0, 1] (Rec. 601 weights).
    pub fn luminance(self) -> f32 {
        (0.299 * self.r + 0.587 * self.g + 0.114 * self.b) / 255.0
    }

    /// WCAG relative luminance in [0, 1].
    pub fn relative_luminance(self) -> f32 {
        let lin: LinSrgb = self.to_srgb().into_linear();
        0.2126 * lin.red + 0.7152 * lin.green + 0.0722 * lin.blue
    }

    /// Black text on light colours, white on dark ones.
    pub fn contrast_text(self) -> Rgb {
        if self.luminance() > 0.5 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }

    /// Multiply HSL saturation by `factor`.
    pub fn saturate(self, factor: f32) -> Rgb {
        let mut hsl = self.to_hsl();
        hsl.s = (hsl.s * factor).clamp(0.0, 100.0);
        hsl.to_rgb()
    }

    /// Multiply HSL lightness by `factor`.
    pub fn brighten(self, factor: f32) -> Rgb {
        let mut hsl = self.to_hsl();
        hsl.l = (hsl.l * factor).clamp(0.0, 100.0);
        hsl.to_rgb()
    }

    pub fn to_hsl(self) -> Hsl {
        let hsl: palette::Hsl = self.to_srgb().into_color();
        let mut h = hsl.hue.into_positive_degrees();
        if !(0.0..360.0).contains(&h) {
            h = 0.0;
        }
        Hsl::new(h, hsl.saturation * 100.0, hsl.lightness * 100.0)
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        let c = self.to_srgb();
        Rgba::new(c.red, c.green, c.blue, a.clamp(0.0, 1.0))
    }
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        let hsl = palette::Hsl::new(
            self.h.rem_euclid(360.0),
            (self.s / 100.0).clamp(0.0, 1.0),
            (self.l / 100.0).clamp(0.0, 1.0),
        );
        let rgb: Srgb = hsl.into_color();
        Rgb::from_srgb(rgb)
    }

    /// Same colour with the hue turned by `degrees` around the wheel.
    pub fn rotate(self, degrees: f32) -> Hsl {
        Hsl::new((self.h + degrees).rem_euclid(360.0), self.s, self.l)
    }

    /// Shortest angular distance between two hues, in [0, 180].
    pub fn hue_distance(a: f32, b: f32) -> f32 {
        let diff = (a - b).rem_euclid(360.0);
        diff.min(360.0 - diff)
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        self.to_rgb().with_alpha(a)
    }
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same colour with alpha replaced.
    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Same colour with alpha multiplied by `factor`.
    pub fn fade(self, factor: f32) -> Rgba {
        Rgba {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Mix colour and alpha together; `t` is clamped to [0, 1].
    pub fn mix(a: Rgba, b: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mixed = Srgba::new(a.r, a.g, a.b, a.a).mix(Srgba::new(b.r, b.g, b.b, b.a), t);
        Rgba::new(mixed.red, mixed.green, mixed.blue, mixed.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#22c55e"), Some(Rgb::new(34.0, 197.0, 94.0)));
        assert_eq!(Rgb::from_hex("fff"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#+12345"), None);
        assert_eq!(Rgb::from_hex("+fff"), None);
        assert_eq!(Rgb::from_hex("#-1-1-1"), None);
        assert_eq!(Rgb::from_hex(""), None);
    }

    #[test]
    fn test_hex_output_is_clamped_and_padded() {
        assert_eq!(Rgb::new(300.0, -4.0, 7.0).to_hex(), "#ff0007");
        assert_eq!(Rgb::new(15.0, 23.0, 42.0).to_hex(), "#0f172a");
    }

    #[test]
    fn test_hsl_round_trip_within_one_unit() {
        // Walk a coarse lattice of the RGB cube.
        for r in (0..=255).step_by(17) {
            for g in (0..=255).step_by(17) {
                for b in (0..=255).step_by(51) {
                    let hex = Rgb::new(r as f32, g as f32, b as f32).to_hex();
                    let hsl = Rgb::from_hex(&hex).unwrap().to_hsl();
                    let back = hsl.to_rgb().to_hex();
                    let again = Rgb::from_hex(&back).unwrap().to_hsl();

                    let original = Rgb::from_hex(&hex).unwrap().to_u8();
                    let result = Rgb::from_hex(&back).unwrap().to_u8();
                    for c in 0..3 {
                        assert!(
                            (original[c] as i16 - result[c] as i16).abs() <= 1,
                            "{hex} -> {back}"
                        );
                    }
                    assert!((hsl.s - again.s).abs() <= 1.0);
                    assert!((hsl.l - again.l).abs() <= 1.0);
                }
            }
        }
    }

    #[test]
    fn test_known_hsl_values() {
        let red = Rgb::from_hex("#ff0000").unwrap().to_hsl();
        assert!((red.h - 0.0).abs() < 0.01);
        assert!((red.s - 100.0).abs() < 0.01);
        assert!((red.l - 50.0).abs() < 0.01);

        let grey = Rgb::new(128.0, 128.0, 128.0).to_hsl();
        assert_eq!(grey.s, 0.0);
    }

    #[test]
    fn test_mix_endpoints() {
        let a = Rgb::new(0.0, 100.0, 200.0);
        let b = Rgb::new(200.0, 100.0, 0.0);
        assert_eq!(Rgb::mix(a, b, 0.0), a);
        assert_eq!(Rgb::mix(a, b, 1.0), b);
        assert_eq!(Rgb::mix(a, b, 0.5), Rgb::new(100.0, 100.0, 100.0));
        assert_eq!(Rgb::mix(a, b, 2.0), b);
    }

    #[test]
    fn test_rgba_mix_blends_alpha() {
        let clear = Rgba::new(1.0, 0.0, 0.0, 0.0);
        let solid = Rgba::new(0.0, 0.0, 1.0, 1.0);
        let half = Rgba::mix(clear, solid, 0.5);
        assert!((half.a - 0.5).abs() < 1e-6);
        assert!((half.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_hsl_to_rgb_primaries() {
        assert_eq!(Hsl::new(120.0, 100.0, 50.0).to_rgb().to_hex(), "#00ff00");
        assert_eq!(Hsl::new(240.0, 100.0, 50.0).to_rgb().to_hex(), "#0000ff");
        assert_eq!(Hsl::new(-120.0, 100.0, 50.0).to_rgb().to_hex(), "#0000ff");
        assert_eq!(Hsl::new(0.0, 0.0, 100.0).to_rgb().to_hex(), "#ffffff");
    }

    #[test]
    fn test_contrast_text() {
        assert_eq!(Rgb::WHITE.contrast_text(), Rgb::BLACK);
        assert_eq!(Rgb::from_hex("#0f172a").unwrap().contrast_text(), Rgb::WHITE);
    }

    #[test]
    fn test_hue_distance_wraps() {
        assert_eq!(Hsl::hue_distance(350.0, 10.0), 20.0);
        assert_eq!(Hsl::hue_distance(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_relative_luminance_extremes() {
        assert!(Rgb::BLACK.relative_luminance() < 1e-6);
        assert!((Rgb::WHITE.relative_luminance() - 1.0).abs() < 1e-4);
    }
}
