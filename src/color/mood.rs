//! Rule-based mood classification from audio descriptors.

use std::fmt;

use crate::features::AudioFeatures;

/// Coarse emotional character of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mood {
    Party,
    Chill,
    Dark,
    Epic,
    Mystic,
    Organic,
    Balanced,
    /// Nothing is playing; never produced by [`MoodClassifier`]
    Idle,
}

impl Mood {
    /// Candidates in tie-break order: the first label to reach the top
    /// score wins.
    pub const CANDIDATES: [Mood; 7] = [
        Mood::Party,
        Mood::Chill,
        Mood::Dark,
        Mood::Epic,
        Mood::Mystic,
        Mood::Organic,
        Mood::Balanced,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Party => "party",
            Mood::Chill => "chill",
            Mood::Dark => "dark",
            Mood::Epic => "epic",
            Mood::Mystic => "mystic",
            Mood::Organic => "organic",
            Mood::Balanced => "balanced",
            Mood::Idle => "idle",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Additive weighted heuristics over the feature vector.
#[derive(Debug, Clone)]
pub struct MoodClassifier {
    /// Winning score must reach this, otherwise the result is `Balanced`
    pub score_floor: u32,
}

impl Default for MoodClassifier {
    fn default() -> Self {
        Self { score_floor: 3 }
    }
}

impl MoodClassifier {
    /// Score every candidate label, in [`Mood::CANDIDATES`] order.
    pub fn scores(&self, f: &AudioFeatures, duration_ms: u64) -> [(Mood, u32); 7] {
        let rule = |cond: bool, points: u32| if cond { points } else { 0 };
        let minor = f.mode == 0;
        let long_track = duration_ms > 300_000;

        let party = rule(f.energy > 0.7, 3)
            + rule(f.danceability > 0.7, 3)
            + rule(f.valence > 0.6, 2)
            + rule(f.tempo > 115.0, 1)
            + rule(f.liveness > 0.6, 1);

        let chill = rule(f.energy < 0.4, 3)
            + rule(f.tempo < 100.0, 2)
            + rule(f.acousticness > 0.5, 1)
            + rule((0.3..=0.7).contains(&f.valence), 1)
            + rule(f.loudness < -12.0, 1);

        let dark = rule(f.valence < 0.3, 3) + rule(minor, 2) + rule(f.acousticness < 0.3, 1);

        let epic = rule(f.energy > 0.7, 2)
            + rule(long_track, 2)
            + rule(f.instrumentalness > 0.5, 2)
            + rule(f.loudness > -6.0, 1)
            + rule(f.tempo > 130.0, 1);

        let mystic = rule(f.instrumentalness > 0.6, 2)
            + rule(f.valence < 0.5, 1)
            + rule(f.acousticness > 0.4 && f.energy < 0.6, 1)
            + rule(f.speechiness < 0.05, 1)
            + rule(minor, 1);

        let organic = rule(f.acousticness > 0.7, 3)
            + rule(f.energy < 0.5, 1)
            + rule(f.instrumentalness > 0.3, 1)
            + rule(f.liveness > 0.5, 1);

        [
            (Mood::Party, party),
            (Mood::Chill, chill),
            (Mood::Dark, dark),
            (Mood::Epic, epic),
            (Mood::Mystic, mystic),
            (Mood::Organic, organic),
            (Mood::Balanced, 0),
        ]
    }

    /// Highest-scoring label, `Balanced` when nothing reaches the floor.
    pub fn classify(&self, features: &AudioFeatures, duration_ms: u64) -> Mood {
        let mut best = (Mood::Balanced, 0);
        for (mood, score) in self.scores(features, duration_ms) {
            if score > best.1 {
                best = (mood, score);
            }
        }

        if best.1 < self.score_floor {
            Mood::Balanced
        } else {
            best.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(f: impl FnOnce(&mut AudioFeatures)) -> AudioFeatures {
        let mut features = AudioFeatures::default();
        f(&mut features);
        features
    }

    #[test]
    fn test_party_track() {
        let f = features(|f| {
            f.energy = 0.9;
            f.tempo = 140.0;
            f.danceability = 0.8;
            f.valence = 0.9;
        });
        assert_eq!(MoodClassifier::default().classify(&f, 200_000), Mood::Party);
    }

    #[test]
    fn test_quiet_acoustic_track_is_chill() {
        let f = features(|f| {
            f.energy = 0.1;
            f.tempo = 70.0;
            f.acousticness = 0.9;
        });
        assert_eq!(MoodClassifier::default().classify(&f, 200_000), Mood::Chill);
    }

    #[test]
    fn test_neutral_features_are_balanced() {
        // Defaults score at most 2 anywhere.
        let f = AudioFeatures::default();
        let classifier = MoodClassifier::default();
        assert!(classifier.scores(&f, 180_000).iter().all(|(_, s)| *s < 3));
        assert_eq!(classifier.classify(&f, 180_000), Mood::Balanced);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        // party = 3 (energy), epic = 2 (energy) + 1 (loudness).
        let f = features(|f| {
            f.energy = 0.8;
            f.danceability = 0.5;
            f.valence = 0.5;
            f.tempo = 110.0;
            f.loudness = -5.0;
            f.acousticness = 0.5;
        });
        let classifier = MoodClassifier::default();
        let scores = classifier.scores(&f, 180_000);
        assert_eq!(scores[0], (Mood::Party, 3));
        assert_eq!(scores[3], (Mood::Epic, 3));
        assert_eq!(classifier.classify(&f, 180_000), Mood::Party);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = MoodClassifier::default();
        for step in 0..20 {
            let v = step as f32 / 19.0;
            let f = features(|f| {
                f.energy = v;
                f.valence = 1.0 - v;
                f.acousticness = v * 0.5;
                f.tempo = 60.0 + v * 120.0;
            });
            let first = classifier.classify(&f, 240_000);
            for _ in 0..5 {
                assert_eq!(classifier.classify(&f, 240_000), first);
            }
            assert_ne!(first, Mood::Idle);
        }
    }
}
