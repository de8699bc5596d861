//! Audio descriptor snapshots and the track state handed in by the host.

use serde::Deserialize;

use crate::color::PrecomputedPalette;
use crate::sim::attraction::AttractionPoint;

/// Numeric descriptor snapshot for the current track.
///
/// Values follow the usual streaming-service conventions: most descriptors
/// are in [0, 1], `tempo` is in BPM, `loudness` in dB (roughly -60..0),
/// `key` is a pitch class 0-11 and `mode` is 1 for major, 0 for minor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFeatures {
    pub energy: f32,
    pub danceability: f32,
    pub valence: f32,
    pub tempo: f32,
    pub acousticness: f32,
    pub instrumentalness: f32,
    pub speechiness: f32,
    pub liveness: f32,
    pub loudness: f32,
    pub key: u8,
    pub mode: u8,
    pub time_signature: u8,
}

impl Default for AudioFeatures {
    /// Neutral values used for any field the host never supplied.
    fn default() -> Self {
        Self {
            energy: 0.5,
            danceability: 0.5,
            valence: 0.5,
            tempo: 120.0,
            acousticness: 0.5,
            instrumentalness: 0.0,
            speechiness: 0.1,
            liveness: 0.2,
            loudness: -10.0,
            key: 0,
            mode: 1,
            time_signature: 4,
        }
    }
}

impl AudioFeatures {
    /// Overlay the fields present in `partial`; absent fields keep their
    /// current value.
    pub fn merge(&mut self, partial: &PartialAudioFeatures) {
        fn take(slot: &mut f32, value: Option<f32>) {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                *slot = v;
            }
        }

        take(&mut self.energy, partial.energy);
        take(&mut self.danceability, partial.danceability);
        take(&mut self.valence, partial.valence);
        take(&mut self.tempo, partial.tempo);
        take(&mut self.acousticness, partial.acousticness);
        take(&mut self.instrumentalness, partial.instrumentalness);
        take(&mut self.speechiness, partial.speechiness);
        take(&mut self.liveness, partial.liveness);
        take(&mut self.loudness, partial.loudness);

        if let Some(key) = partial.key {
            self.key = key.min(11);
        }
        if let Some(mode) = partial.mode {
            self.mode = mode.min(1);
        }
        if let Some(ts) = partial.time_signature {
            self.time_signature = ts;
        }
    }

    /// Neutral defaults overlaid with `partial`.
    pub fn from_partial(partial: &PartialAudioFeatures) -> Self {
        let mut features = Self::default();
        features.merge(partial);
        features
    }
}

/// Feature payload as received from the data collaborator; every field may
/// be missing.
///
/// Fields of the wrong type or out of range (`"key": -1`, `"energy": "high"`)
/// deserialize as `None` and fall back to the current value on merge.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialAudioFeatures {
    #[serde(deserialize_with = "lenient::float")]
    pub energy: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub danceability: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub valence: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub tempo: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub acousticness: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub instrumentalness: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub speechiness: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub liveness: Option<f32>,
    #[serde(deserialize_with = "lenient::float")]
    pub loudness: Option<f32>,
    #[serde(deserialize_with = "lenient::small_int")]
    pub key: Option<u8>,
    #[serde(deserialize_with = "lenient::small_int")]
    pub mode: Option<u8>,
    #[serde(deserialize_with = "lenient::small_int")]
    pub time_signature: Option<u8>,
}

/// How densely the rhythm is felt; scales movement speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmicPattern {
    Dense,
    Sparse,
    Regular,
}

/// Overall motion character requested by the data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Staccato,
    Bouncy,
    Flowing,
    Steady,
}

/// Optional choreography hints that override parts of the derived motion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementRules {
    pub attraction_points: Option<Vec<AttractionPoint>>,
    pub rhythmic_pattern: Option<RhythmicPattern>,
    pub flow_type: Option<FlowType>,
}

/// Everything the host hands to a visualizer on each poll.
///
/// Malformed members are dropped individually; only a payload that is not
/// a JSON object at all fails to parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackState {
    #[serde(deserialize_with = "lenient::or_default")]
    pub audio_features: PartialAudioFeatures,
    #[serde(deserialize_with = "lenient::millis")]
    pub duration_ms: Option<u64>,
    #[serde(deserialize_with = "lenient::millis")]
    pub progress_ms: Option<u64>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub is_playing: bool,
    #[serde(deserialize_with = "lenient::value")]
    pub album_colors: Option<PrecomputedPalette>,
    #[serde(deserialize_with = "lenient::value")]
    pub movement_rules: Option<MovementRules>,
}

impl TrackState {
    /// Parse a JSON track payload.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Field deserializers that map bad input to "absent" instead of failing.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(value: &Value) -> Option<f64> {
        value.as_f64().filter(|v| v.is_finite())
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(number(&value).map(|v| v as f32))
    }

    pub fn small_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u8>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(number(&value)
            .filter(|v| (0.0..=255.0).contains(v))
            .map(|v| v.round() as u8))
    }

    pub fn millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        let value = Value::deserialize(d)?;
        Ok(number(&value).filter(|v| *v >= 0.0).map(|v| v.round() as u64))
    }

    pub fn value<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(d)?;
        Ok(serde_json::from_value(value).ok())
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(value(d)?.unwrap_or_default())
    }
}
