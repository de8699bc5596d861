//! Node simulation parameters derived from audio features, plus the fixed
//! tuning constants of the node engine.

use std::ops::Range;

use crate::features::{AudioFeatures, FlowType, MovementRules, RhythmicPattern};

/// Lower bound of the live population.
pub const MIN_NODES: usize = 40;

/// Upper bound of the live population.
pub const MAX_NODES: usize = 200;

/// Qualitative tags that bias which node kinds get spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorTag {
    Dancing,
    Energetic,
    Happy,
    Melancholic,
    Organic,
    Instrumental,
    Live,
    Vocal,
    Balanced,
}

impl BehaviorTag {
    /// Tags for a feature vector, in evaluation order. Never empty: with no
    /// matching rule the result is `[Balanced]`.
    pub fn from_features(f: &AudioFeatures) -> Vec<BehaviorTag> {
        let mut tags = Vec::new();
        if f.danceability > 0.7 {
            tags.push(BehaviorTag::Dancing);
        }
        if f.energy > 0.8 {
            tags.push(BehaviorTag::Energetic);
        }
        if f.valence > 0.7 {
            tags.push(BehaviorTag::Happy);
        } else if f.valence < 0.3 {
            tags.push(BehaviorTag::Melancholic);
        }
        if f.acousticness > 0.7 {
            tags.push(BehaviorTag::Organic);
        }
        if f.instrumentalness > 0.7 {
            tags.push(BehaviorTag::Instrumental);
        }
        if f.liveness > 0.5 {
            tags.push(BehaviorTag::Live);
        }
        if f.speechiness > 0.5 {
            tags.push(BehaviorTag::Vocal);
        }

        if tags.is_empty() {
            tags.push(BehaviorTag::Balanced);
        }
        tags
    }
}

/// Per-update motion parameters.
///
/// Always a pure function of the latest [`AudioFeatures`] and optional
/// [`MovementRules`]; nothing accumulates between updates.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    /// Displacement scale (pixels per second per unit velocity)
    pub movement_speed: f32,

    /// Mean node radius (pixels)
    pub base_size: f32,

    /// Maximum edge length (pixels)
    pub connection_distance: f32,

    /// Velocity retained on a wall bounce
    pub bounce_intensity: f32,

    /// Stroke width of a full-strength edge (pixels)
    pub connection_width: f32,

    /// Population the engine converges to, in [MIN_NODES, MAX_NODES]
    pub target_node_count: usize,

    pub behavior_tags: Vec<BehaviorTag>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::from_features(&AudioFeatures::default(), None)
    }
}

impl SimulationParameters {
    pub fn from_features(f: &AudioFeatures, rules: Option<&MovementRules>) -> Self {
        let mut movement_speed = 20.0 + f.energy * 60.0 + (f.tempo - 100.0) * 0.3;
        let mut connection_distance = 80.0 + f.valence * 80.0 - f.acousticness * 40.0;
        let mut bounce_intensity = 0.5 + f.liveness * 1.5;

        if let Some(rules) = rules {
            match rules.rhythmic_pattern {
                Some(RhythmicPattern::Dense) => movement_speed *= 1.3,
                Some(RhythmicPattern::Sparse) => movement_speed *= 0.7,
                Some(RhythmicPattern::Regular) | None => {}
            }
            match rules.flow_type {
                Some(FlowType::Staccato) => bounce_intensity *= 1.5,
                Some(FlowType::Bouncy) => connection_distance *= 1.2,
                Some(FlowType::Flowing) => movement_speed *= 0.8,
                Some(FlowType::Steady) | None => {}
            }
        }

        Self {
            movement_speed: movement_speed.clamp(10.0, 120.0),
            base_size: (2.0 + f.danceability * 3.0 + (f.loudness + 60.0) / 20.0).clamp(1.0, 12.0),
            connection_distance: connection_distance.max(20.0),
            bounce_intensity,
            connection_width: 0.5 + f.speechiness * 1.5,
            target_node_count: target_node_count(f),
            behavior_tags: BehaviorTag::from_features(f),
        }
    }

    pub fn has_tag(&self, tag: BehaviorTag) -> bool {
        self.behavior_tags.contains(&tag)
    }
}

/// Population size for a feature vector: 80 plus contributions from energy,
/// tempo offset from 100 BPM, instrumentalness and speechiness.
pub fn target_node_count(f: &AudioFeatures) -> usize {
    let raw = 80.0
        + f.energy * 40.0
        + (f.tempo - 100.0) * 0.5
        + f.instrumentalness * 30.0
        + f.speechiness * 20.0;

    if !raw.is_finite() {
        return MIN_NODES;
    }
    (raw.round() as i64).clamp(MIN_NODES as i64, MAX_NODES as i64) as usize
}

/// Fixed constants of the node engine.
#[derive(Debug, Clone)]
pub struct SimulationTuning {
    /// Life below this triggers an in-place respawn
    pub rebirth_threshold: f32,

    /// Per-update multiplicative life decay, rolled per node
    pub decay_rate: Range<f32>,

    /// Trail capacity, rolled per node
    pub trail_length: Range<usize>,

    /// Alpha retained by a trail point per update, rolled per node
    pub trail_decay: Range<f32>,

    /// Edge cap, rolled per node
    pub max_connections: Range<usize>,

    /// Minimum affinity for an edge
    pub affinity_threshold: f32,

    /// Affinity above which an edge gets a midpoint dot
    pub strong_affinity: f32,

    /// Track energy above which edges pulse
    pub edge_glow_energy: f32,

    /// Node vitality above which an aura is drawn
    pub aura_energy: f32,

    /// Relative weights of bounce / wrap / attract at a wall crossing
    pub edge_policy_weights: [f32; 3],

    /// Attraction force scale
    pub attraction_gain: f32,

    /// Rate at which node vitality follows the track energy (per second)
    pub vitality_follow_rate: f32,

    /// Perlin seed for organic drift
    pub noise_seed: u32,
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            rebirth_threshold: 0.2,
            decay_rate: 0.995..0.999,
            trail_length: 8..20,
            trail_decay: 0.85..0.95,
            max_connections: 3..7,
            affinity_threshold: 0.3,
            strong_affinity: 0.7,
            edge_glow_energy: 0.6,
            aura_energy: 0.5,
            edge_policy_weights: [0.6, 0.3, 0.1],
            attraction_gain: 0.1,
            vitality_follow_rate: 0.5,
            noise_seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_parameters() {
        let params = SimulationParameters::default();
        // 20 + 30 + 6
        assert!((params.movement_speed - 56.0).abs() < 1e-4);
        // 2 + 1.5 + 2.5
        assert!((params.base_size - 6.0).abs() < 1e-4);
        assert!((params.connection_distance - 100.0).abs() < 1e-4);
        assert_eq!(params.behavior_tags, vec![BehaviorTag::Balanced]);
        // 80 + 20 + 10 + 0 + 2
        assert_eq!(params.target_node_count, 112);
    }

    #[test]
    fn test_target_node_count_is_clamped() {
        let mut f = AudioFeatures::default();
        f.energy = 1.0;
        f.tempo = 400.0;
        f.instrumentalness = 1.0;
        assert_eq!(target_node_count(&f), MAX_NODES);

        f.energy = 0.0;
        f.tempo = 0.0;
        f.instrumentalness = 0.0;
        f.speechiness = 0.0;
        assert_eq!(target_node_count(&f), MIN_NODES);

        f.tempo = f32::NAN;
        assert_eq!(target_node_count(&f), MIN_NODES);
    }

    #[test]
    fn test_behavior_tags() {
        let mut f = AudioFeatures::default();
        f.danceability = 0.9;
        f.energy = 0.85;
        f.valence = 0.1;
        f.speechiness = 0.6;
        let tags = BehaviorTag::from_features(&f);
        assert_eq!(
            tags,
            vec![
                BehaviorTag::Dancing,
                BehaviorTag::Energetic,
                BehaviorTag::Melancholic,
                BehaviorTag::Vocal
            ]
        );
    }

    #[test]
    fn test_movement_rules_are_not_cumulative() {
        let f = AudioFeatures::default();
        let rules = MovementRules {
            rhythmic_pattern: Some(RhythmicPattern::Dense),
            flow_type: Some(FlowType::Bouncy),
            ..Default::default()
        };

        let first = SimulationParameters::from_features(&f, Some(&rules));
        let second = SimulationParameters::from_features(&f, Some(&rules));
        assert_eq!(first, second);
        assert!((first.movement_speed - 56.0 * 1.3).abs() < 1e-3);
        assert!((first.connection_distance - 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_slow_quiet_track_hits_speed_floor() {
        let mut f = AudioFeatures::default();
        f.energy = 0.1;
        f.tempo = 70.0;
        f.acousticness = 0.9;
        let params = SimulationParameters::from_features(&f, None);
        assert!(params.movement_speed < 20.0);
        assert!(params.movement_speed >= 10.0);
    }
}
