//! Focal points that pull nearby nodes.

use glam::Vec2;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractorKind {
    Center,
    Corner,
    /// Also swells nodes within reach
    Beat,
    #[default]
    #[serde(other)]
    Custom,
}

/// Attraction point in normalized surface coordinates.
///
/// `x`, `y` and `radius` are fractions of the surface; the radius is
/// measured against the shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AttractionPoint {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
    pub radius: f32,
    #[serde(rename = "type", default)]
    pub kind: AttractorKind,
}

/// Result of one attractor acting on one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pull {
    pub velocity: Vec2,
    /// Falloff-weighted strength in [0, strength]
    pub force: f32,
}

impl AttractionPoint {
    pub const fn new(x: f32, y: f32, strength: f32, radius: f32, kind: AttractorKind) -> Self {
        Self {
            x,
            y,
            strength,
            radius,
            kind,
        }
    }

    /// Centre pull plus four weaker corner wells.
    pub fn defaults() -> Vec<AttractionPoint> {
        vec![
            AttractionPoint::new(0.5, 0.5, 0.3, 0.4, AttractorKind::Center),
            AttractionPoint::new(0.2, 0.2, 0.2, 0.2, AttractorKind::Corner),
            AttractionPoint::new(0.8, 0.2, 0.2, 0.2, AttractorKind::Corner),
            AttractionPoint::new(0.2, 0.8, 0.2, 0.2, AttractorKind::Corner),
            AttractionPoint::new(0.8, 0.8, 0.2, 0.2, AttractorKind::Corner),
        ]
    }

    /// Velocity change for a node at `pos`, or `None` outside the radius.
    ///
    /// Force falls off linearly to zero at the radius and is scaled by
    /// `gain` and the current track energy.
    pub fn pull(&self, pos: Vec2, bounds: Vec2, energy: f32, gain: f32) -> Option<Pull> {
        let anchor = Vec2::new(self.x, self.y) * bounds;
        let delta = anchor - pos;
        let distance = delta.length();
        let reach = self.radius * bounds.x.min(bounds.y);

        if distance.is_nan() || distance >= reach {
            return None;
        }

        let force = self.strength * (1.0 - distance / reach);
        Some(Pull {
            velocity: delta / (distance + 1.0) * force * gain * energy,
            force,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_points_toward_anchor() {
        let center = AttractionPoint::defaults()[0];
        let bounds = Vec2::new(800.0, 400.0);

        let pull = center.pull(Vec2::new(300.0, 200.0), bounds, 1.0, 0.1).unwrap();
        assert!(pull.velocity.x > 0.0);
        assert!(pull.velocity.y.abs() < 1e-6);
        assert!(pull.force > 0.0 && pull.force < center.strength);
    }

    #[test]
    fn test_no_pull_outside_radius() {
        let corner = AttractionPoint::defaults()[1];
        let bounds = Vec2::new(800.0, 400.0);
        assert!(corner.pull(Vec2::new(700.0, 350.0), bounds, 1.0, 0.1).is_none());
    }

    #[test]
    fn test_deserialize_with_type_field() {
        let json = r#"[{"x":0.5,"y":0.5,"strength":0.4,"radius":0.3,"type":"beat"},
                       {"x":0.1,"y":0.9,"strength":0.2,"radius":0.1,"type":"swirl"}]"#;
        let points: Vec<AttractionPoint> = serde_json::from_str(json).unwrap();
        assert_eq!(points[0].kind, AttractorKind::Beat);
        assert_eq!(points[1].kind, AttractorKind::Custom);
    }
}
