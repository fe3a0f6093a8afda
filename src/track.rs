//! Track model shared by the corpus, the scoring factors and the engine.
//!
//! Categorical attributes (vibe, set position, groove, vocals, tempo feel)
//! are closed enums serialized as lowercase kebab-case strings, so a corpus
//! file reads `"groove_style": "four-on-floor"`.

use crate::camelot::{self, WheelKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Error returned when parsing a categorical value from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?} (expected one of: {expected})")]
pub struct UnknownCategory {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Declares a categorical enum with its wire names and a stable index
/// used by the transition matrices.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire and display name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Position in [`Self::ALL`].
            #[must_use]
            pub const fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownCategory;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| UnknownCategory {
                        kind: $kind,
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        /// Unknown names degrade to the default variant instead of failing
        /// the whole document.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(raw.parse().unwrap_or_else(|err: UnknownCategory| {
                    let fallback = Self::default();
                    log::warn!("{err}, using {fallback}");
                    fallback
                }))
            }
        }
    };
}

categorical! {
    /// Overall mood of a track.
    #[derive(Default)]
    Vibe("vibe") {
        Dark => "dark",
        Bright => "bright",
        #[default]
        Hypnotic => "hypnotic",
        Euphoric => "euphoric",
        Chill => "chill",
        Aggressive => "aggressive",
    }
}

categorical! {
    /// Where a track naturally sits in a set.
    #[derive(Default)]
    Intensity("intensity") {
        Opener => "opener",
        #[default]
        Journey => "journey",
        Peak => "peak",
        Closer => "closer",
    }
}

categorical! {
    /// Rhythmic feel of the drums.
    #[derive(Default)]
    GrooveStyle("groove style") {
        #[default]
        FourOnFloor => "four-on-floor",
        Broken => "broken",
        Swung => "swung",
        Syncopated => "syncopated",
        Linear => "linear",
    }
}

categorical! {
    #[derive(Default)]
    VocalPresence("vocal presence") {
        #[default]
        Instrumental => "instrumental",
        Male => "male",
        Female => "female",
        Mixed => "mixed",
        Group => "group",
    }
}

categorical! {
    #[derive(Default)]
    VocalStyle("vocal style") {
        Rap => "rap",
        Singing => "singing",
        Both => "both",
        Chant => "chant",
        #[default]
        None => "none",
    }
}

categorical! {
    /// Perceived tempo relative to the measured BPM.
    #[derive(Default)]
    TempoFeel("tempo feel") {
        #[default]
        Straight => "straight",
        DoubleTime => "double-time",
        HalfTime => "half-time",
    }
}

/// A fully analysed track.
///
/// Scores on a ten-point scale (energy, danceability, mix ease, quality,
/// fidelity) are expected in `1..=10`; [`Track::validate`] reports values
/// outside that range. Missing categorical fields fall back to their enum
/// defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    // Identity
    #[serde(rename = "track_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rekordbox_id: Option<String>,

    // Core audio
    pub bpm: f64,
    /// Key as tagged; wheel notation (`8A`) or a conventional name (`Am`).
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub duration_seconds: f64,

    // Energy
    pub energy: u8,
    pub danceability: u8,

    // Character
    #[serde(default)]
    pub vibe: Vibe,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub mood_tags: Vec<String>,

    // Rhythm
    #[serde(default)]
    pub groove_style: GrooveStyle,
    #[serde(default)]
    pub tempo_feel: TempoFeel,

    // Mixability
    pub mix_in_ease: u8,
    pub mix_out_ease: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixability_notes: Option<String>,

    // Vocals
    #[serde(default)]
    pub vocal_presence: VocalPresence,
    #[serde(default)]
    pub vocal_style: VocalStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    // Structure and production
    #[serde(default)]
    pub structure: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_intensity: Option<u8>,
    #[serde(default)]
    pub instrumentation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_style: Option<String>,

    // Quality
    #[serde(default = "default_score")]
    pub production_quality: u8,
    #[serde(default = "default_score")]
    pub audio_fidelity: u8,

    // Genre
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgenre: Option<String>,
    #[serde(default)]
    pub similar_artists: Vec<String>,

    #[serde(default)]
    pub description: String,

    // User overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const fn default_score() -> u8 {
    5
}

impl Default for Track {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            artist: String::new(),
            file_path: PathBuf::new(),
            rekordbox_id: None,
            bpm: 120.0,
            key: None,
            duration_seconds: 0.0,
            energy: 5,
            danceability: 5,
            vibe: Vibe::default(),
            intensity: Intensity::default(),
            mood_tags: Vec::new(),
            groove_style: GrooveStyle::default(),
            tempo_feel: TempoFeel::default(),
            mix_in_ease: 5,
            mix_out_ease: 5,
            mixability_notes: None,
            vocal_presence: VocalPresence::default(),
            vocal_style: VocalStyle::default(),
            language: None,
            structure: Vec::new(),
            drop_intensity: None,
            instrumentation: Vec::new(),
            production_style: None,
            production_quality: default_score(),
            audio_fidelity: default_score(),
            genre: String::new(),
            subgenre: None,
            similar_artists: Vec::new(),
            description: String::new(),
            rating: None,
            notes: None,
        }
    }
}

impl Track {
    /// Creates a track with neutral attributes.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            ..Self::default()
        }
    }

    /// Raw key tag, or an empty string when untagged.
    #[must_use]
    pub fn key_str(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    /// The key resolved onto the harmonic wheel.
    #[must_use]
    pub fn wheel_key(&self) -> Option<WheelKey> {
        self.key_str().parse().ok()
    }

    /// Keys this track mixes into cleanly, including two-step moves.
    #[must_use]
    pub fn compatible_keys(&self) -> Vec<String> {
        camelot::compatible_keys(self.key_str(), true)
    }

    /// Signed energy change going from `self` to `next`.
    #[must_use]
    pub fn energy_delta(&self, next: &Track) -> i32 {
        i32::from(next.energy) - i32::from(self.energy)
    }

    /// Lists range violations. An empty list means the track is well formed.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let ten_point = [
            ("energy", self.energy),
            ("danceability", self.danceability),
            ("mix_in_ease", self.mix_in_ease),
            ("mix_out_ease", self.mix_out_ease),
            ("production_quality", self.production_quality),
            ("audio_fidelity", self.audio_fidelity),
        ];
        for (field, value) in ten_point {
            if !(1..=10).contains(&value) {
                problems.push(format!("{field} {value} outside 1..=10"));
            }
        }

        if let Some(drop) = self.drop_intensity {
            if !(1..=10).contains(&drop) {
                problems.push(format!("drop_intensity {drop} outside 1..=10"));
            }
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                problems.push(format!("rating {rating} outside 1..=5"));
            }
        }
        if self.key.is_some() && self.wheel_key().is_none() {
            problems.push(format!("key {:?} is not a recognizable key", self.key_str()));
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            problems.push(format!("bpm {} is not a positive tempo", self.bpm));
        }

        problems
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_round_trip_names() {
        assert_eq!(GrooveStyle::FourOnFloor.as_str(), "four-on-floor");
        assert_eq!("Four-On-Floor".parse::<GrooveStyle>(), Ok(GrooveStyle::FourOnFloor));
        assert_eq!("double-time".parse::<TempoFeel>(), Ok(TempoFeel::DoubleTime));
        assert!("sparkly".parse::<Vibe>().is_err());
    }

    #[test]
    fn test_categorical_indexes_follow_declaration() {
        for (i, vibe) in Vibe::ALL.iter().enumerate() {
            assert_eq!(vibe.index(), i);
        }
        assert_eq!(Intensity::Closer.index(), 3);
        assert_eq!(GrooveStyle::Linear.index(), 4);
    }

    #[test]
    fn test_unknown_category_message() {
        let err = "loud".parse::<Intensity>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("intensity"));
        assert!(message.contains("opener, journey, peak, closer"));
    }

    #[test]
    fn test_deserialize_minimal_track_uses_defaults() {
        let json = r#"{
            "track_id": "abc",
            "title": "Song",
            "artist": "Someone",
            "bpm": 124.0,
            "key": "Am",
            "energy": 6,
            "danceability": 7,
            "mix_in_ease": 8,
            "mix_out_ease": 6,
            "genre": "house",
            "groove_style": "four-on-floor"
        }"#;

        let track: Track = serde_json::from_str(json).expect("minimal track should parse");
        assert_eq!(track.id, "abc");
        assert_eq!(track.vibe, Vibe::Hypnotic);
        assert_eq!(track.intensity, Intensity::Journey);
        assert_eq!(track.tempo_feel, TempoFeel::Straight);
        assert_eq!(track.audio_fidelity, 5);
        assert_eq!(track.wheel_key().map(|k| k.to_string()).as_deref(), Some("8A"));
        assert!(track.validate().is_empty());
    }

    #[test]
    fn test_unknown_category_deserializes_to_default() {
        let vibe: Vibe = serde_json::from_str("\"melancholic\"").expect("unknown vibe tolerated");
        assert_eq!(vibe, Vibe::Hypnotic, "Unknown vibe should fall back to the default");

        let feel: TempoFeel = serde_json::from_str("\"Double-Time\"").expect("mixed case tolerated");
        assert_eq!(feel, TempoFeel::DoubleTime, "Known names match regardless of case");

        assert!(serde_json::from_str::<Vibe>("7").is_err(), "Non-string values are still rejected");
    }

    #[test]
    fn test_id_written_as_track_id_and_read_from_either() {
        let json = serde_json::to_string(&Track::new("abc", "t", "a")).unwrap();
        assert!(json.contains("\"track_id\":\"abc\""), "Id serializes under track_id: {json}");

        let legacy = r#"{ "id": "xyz", "title": "t", "artist": "a", "bpm": 120.0, "energy": 5,
            "danceability": 5, "mix_in_ease": 5, "mix_out_ease": 5, "genre": "house" }"#;
        let track: Track = serde_json::from_str(legacy).expect("bare id still accepted");
        assert_eq!(track.id, "xyz");
    }

    #[test]
    fn test_serialized_enums_are_kebab_case() {
        let track = Track {
            groove_style: GrooveStyle::FourOnFloor,
            tempo_feel: TempoFeel::HalfTime,
            ..Track::new("id", "t", "a")
        };
        let json = serde_json::to_string(&track).unwrap();
        assert!(json.contains("\"four-on-floor\""));
        assert!(json.contains("\"half-time\""));
        assert!(!json.contains("rekordbox_id"), "Absent options are omitted");
    }

    #[test]
    fn test_validate_reports_out_of_range() {
        let track = Track {
            energy: 0,
            mix_in_ease: 11,
            rating: Some(9),
            key: Some("Z#q".into()),
            ..Track::new("id", "t", "a")
        };
        let problems = track.validate();
        assert_eq!(problems.len(), 4, "problems: {problems:?}");
    }

    #[test]
    fn test_energy_delta_and_compatible_keys() {
        let a = Track { energy: 4, key: Some("8A".into()), ..Track::default() };
        let b = Track { energy: 7, ..Track::default() };
        assert_eq!(a.energy_delta(&b), 3);
        assert_eq!(b.energy_delta(&a), -3);
        assert_eq!(a.compatible_keys().len(), 6);
        assert!(b.compatible_keys().is_empty(), "Untagged track has no compatible keys");
    }
}
