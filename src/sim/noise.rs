//! Smooth pseudo-random drift for organic motion.

use noise::{NoiseFn, Perlin};

/// 2D Perlin field sampled as a function of (time, node id).
pub struct DriftNoise {
    perlin: Perlin,
}

impl DriftNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
        }
    }

    /// Sample in roughly [-1, 1]; continuous in both arguments.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.perlin.get([x as f64, y as f64]) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_is_deterministic_and_smooth() {
        let a = DriftNoise::new(42);
        let b = DriftNoise::new(42);
        assert_eq!(a.sample(1.3, 0.7), b.sample(1.3, 0.7));

        let step = (a.sample(1.3, 0.7) - a.sample(1.301, 0.7)).abs();
        assert!(step < 0.05);
        assert!(a.sample(12.34, 5.67).abs() <= 1.5);
    }
}
