//! Wall handling for nodes leaving the surface.

use rand::Rng;

/// What happens when a node crosses a wall. Rolled afresh on every
/// crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeBehavior {
    Bounce,
    Wrap,
    Attract,
}

impl EdgeBehavior {
    const ALL: [EdgeBehavior; 3] = [EdgeBehavior::Bounce, EdgeBehavior::Wrap, EdgeBehavior::Attract];

    /// Weighted choice; `weights` are for bounce, wrap and attract and need
    /// not sum to one.
    pub fn choose<R: Rng + ?Sized>(rng: &mut R, weights: &[f32; 3]) -> EdgeBehavior {
        let total: f32 = weights.iter().map(|w| w.max(0.0)).sum();
        if total <= 0.0 {
            return EdgeBehavior::Bounce;
        }

        let roll = rng.gen_range(0.0..total);
        let mut acc = 0.0;
        for (behavior, weight) in Self::ALL.iter().zip(weights) {
            acc += weight.max(0.0);
            if roll < acc {
                return *behavior;
            }
        }
        EdgeBehavior::Bounce
    }
}

/// Wall response parameters shared by both axes.
#[derive(Debug, Clone, Copy)]
pub struct WallResponse {
    pub bounce_intensity: f32,
    pub energy: f32,
    pub weights: [f32; 3],
}

impl WallResponse {
    /// Constrain one axis to [0, extent]. Returns true if a wall was crossed.
    pub fn constrain<R: Rng + ?Sized>(
        &self,
        pos: &mut f32,
        vel: &mut f32,
        extent: f32,
        rng: &mut R,
    ) -> bool {
        let rebound = self.bounce_intensity * (0.8 + self.energy * 0.4);
        let shove = 5.0 * (1.0 + self.energy);

        if *pos < 0.0 {
            match EdgeBehavior::choose(rng, &self.weights) {
                EdgeBehavior::Bounce => *vel = vel.abs() * rebound,
                EdgeBehavior::Wrap => *pos = extent,
                EdgeBehavior::Attract => *vel += shove,
            }
            *pos = pos.max(0.0);
            true
        } else if *pos > extent {
            match EdgeBehavior::choose(rng, &self.weights) {
                EdgeBehavior::Bounce => *vel = -vel.abs() * rebound,
                EdgeBehavior::Wrap => *pos = 0.0,
                EdgeBehavior::Attract => *vel -= shove,
            }
            *pos = pos.min(extent);
            true
        } else {
            false
        }
    }
}
