//! # Harmonic Key Compatibility
//!
//! Maps musical keys onto the 24-slot harmonic wheel (12 positions, each with
//! a minor `A` and a major `B` ring) and scores how smoothly one key mixes
//! into another.
//!
//! ## Wheel Layout
//!
//! ```text
//!  position:  1    2    3    4    5    6    7    8    9    10   11   12
//!  A (minor): Abm  Ebm  Bbm  Fm   Cm   Gm   Dm   Am   Em   Bm   F#m  Dbm
//!  B (major): B    F#   Db   Ab   Eb   Bb   F    C    G    D    A    E
//! ```
//!
//! Moving one position clockwise or counter-clockwise, or swapping rings at
//! the same position, keeps a mix harmonic.
//!
//! ## Scoring Table
//!
//! | Relationship                          | Score |
//! |---------------------------------------|-------|
//! | identical                             | 1.0   |
//! | same position, other ring             | 0.9   |
//! | same ring, ±1 position                | 0.9   |
//! | same ring, ±2 positions               | 0.7   |
//! | other ring, ±1 position               | 0.6   |
//! | same ring, ±7 positions (dominant)    | 0.3   |
//! | anything else                         | 0.0   |
//! | either key unresolvable               | 0.5   |

use std::fmt;
use std::str::FromStr;

/// Number of positions around the wheel.
pub const WHEEL_SIZE: u8 = 12;

/// Score returned when either key cannot be placed on the wheel.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Wheel position indexed by pitch class (C = 0 .. B = 11) for minor keys.
const MINOR_POSITION: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

/// Wheel position indexed by pitch class (C = 0 .. B = 11) for major keys.
const MAJOR_POSITION: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];

/// Which ring of the wheel a key sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ring {
    /// Inner ring, minor keys.
    A,
    /// Outer ring, major keys.
    B,
}

impl Ring {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Ring::A => Ring::B,
            Ring::B => Ring::A,
        }
    }

    const fn letter(self) -> char {
        match self {
            Ring::A => 'A',
            Ring::B => 'B',
        }
    }
}

/// A key placed on the harmonic wheel, e.g. `8A` (A minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WheelKey {
    position: u8,
    ring: Ring,
}

impl WheelKey {
    /// Builds a wheel key, returning `None` unless `position` is in `1..=12`.
    #[must_use]
    pub const fn new(position: u8, ring: Ring) -> Option<Self> {
        if position >= 1 && position <= WHEEL_SIZE {
            Some(Self { position, ring })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn position(self) -> u8 {
        self.position
    }

    #[must_use]
    pub const fn ring(self) -> Ring {
        self.ring
    }

    /// Rotates around the wheel by `steps` positions, wrapping 12 → 1.
    #[must_use]
    pub fn rotate(self, steps: i32) -> Self {
        let zero_based = i32::from(self.position) - 1 + steps;
        let wrapped = zero_based.rem_euclid(i32::from(WHEEL_SIZE)) + 1;
        Self {
            // rem_euclid keeps this in 1..=12
            position: wrapped as u8,
            ring: self.ring,
        }
    }

    /// Same position, opposite ring (relative major/minor).
    #[must_use]
    pub const fn relative(self) -> Self {
        Self {
            position: self.position,
            ring: self.ring.other(),
        }
    }

    /// Shortest number of steps between two positions, ignoring rings.
    #[must_use]
    pub fn distance(self, other: Self) -> u8 {
        let diff = self.position.abs_diff(other.position);
        diff.min(WHEEL_SIZE - diff)
    }
}

impl fmt::Display for WheelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.position, self.ring.letter())
    }
}

/// Error returned when a string is not a recognizable key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized musical key: {0:?}")]
pub struct UnknownKey(pub String);

impl FromStr for WheelKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        parse_wheel(trimmed)
            .or_else(|| parse_musical(trimmed))
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Parses `"8A"`, `"12b"` style notation.
fn parse_wheel(s: &str) -> Option<WheelKey> {
    let last = s.chars().last()?;
    let ring = match last.to_ascii_uppercase() {
        'A' => Ring::A,
        'B' => Ring::B,
        _ => return None,
    };
    let digits = &s[..s.len() - last.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    WheelKey::new(digits.parse().ok()?, ring)
}

/// Parses conventional names: `"Am"`, `"G#m"`, `"Abm"`, `"F#"`, `"Gb"`,
/// `"C minor"`, `"Eb maj"`. Enharmonic spellings land on the same slot.
fn parse_musical(s: &str) -> Option<WheelKey> {
    let mut chars = s.chars();
    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (shift, suffix) = match rest.chars().next() {
        Some('#') | Some('♯') => (1, &rest[rest.chars().next()?.len_utf8()..]),
        Some('b') | Some('♭') => (-1, &rest[rest.chars().next()?.len_utf8()..]),
        _ => (0, rest),
    };

    let ring = match suffix.trim().to_ascii_lowercase().as_str() {
        "m" | "min" | "minor" => Ring::A,
        "" | "maj" | "major" => Ring::B,
        _ => return None,
    };

    let pitch_class = (base + shift).rem_euclid(12) as usize;
    let position = match ring {
        Ring::A => MINOR_POSITION[pitch_class],
        Ring::B => MAJOR_POSITION[pitch_class],
    };
    WheelKey::new(position, ring)
}

/// Normalizes a musical key name or wheel notation to wheel notation.
///
/// Wheel notation is accepted case-insensitively; conventional names accept
/// sharps and flats interchangeably.
///
/// # Examples
///
/// ```
/// use flowstate::camelot::to_wheel_notation;
///
/// assert_eq!(to_wheel_notation("Am").as_deref(), Some("8A"));
/// assert_eq!(to_wheel_notation("G#m"), to_wheel_notation("Abm"));
/// assert_eq!(to_wheel_notation("gb").as_deref(), Some("2B"));
/// assert_eq!(to_wheel_notation("8a").as_deref(), Some("8A"));
/// assert_eq!(to_wheel_notation("H#"), None);
/// ```
#[must_use]
pub fn to_wheel_notation(key: &str) -> Option<String> {
    key.parse::<WheelKey>().ok().map(|k| k.to_string())
}

/// Keys that mix harmonically with `key`, in a fixed order: the key itself,
/// +1, -1, the relative key, then (when `extended`) +2 and -2.
///
/// Returns an empty list when `key` cannot be resolved.
///
/// # Examples
///
/// ```
/// use flowstate::camelot::compatible_keys;
///
/// assert_eq!(compatible_keys("8A", false), vec!["8A", "9A", "7A", "8B"]);
/// assert_eq!(compatible_keys("12B", true), vec!["12B", "1B", "11B", "12A", "2B", "10B"]);
/// ```
#[must_use]
pub fn compatible_keys(key: &str, extended: bool) -> Vec<String> {
    let Ok(key) = key.parse::<WheelKey>() else {
        log::trace!("No compatible keys for unresolvable key {key:?}");
        return Vec::new();
    };

    let mut keys = vec![key, key.rotate(1), key.rotate(-1), key.relative()];
    if extended {
        keys.push(key.rotate(2));
        keys.push(key.rotate(-2));
    }
    keys.into_iter().map(|k| k.to_string()).collect()
}

/// Scores two already-resolved wheel keys.
#[must_use]
pub fn wheel_score(a: WheelKey, b: WheelKey) -> f64 {
    if a == b {
        return 1.0;
    }

    let distance = a.distance(b);
    let same_ring = a.ring() == b.ring();

    match (same_ring, distance) {
        (false, 0) => 0.9,
        (true, 1) => 0.9,
        (true, 2) => 0.7,
        (false, 1) => 0.6,
        // ±7 steps wraps to 5 the short way round
        (true, 5) => 0.3,
        _ => 0.0,
    }
}

/// Harmonic compatibility of two keys in `[0, 1]`.
///
/// Unresolvable input on either side yields [`NEUTRAL_SCORE`] rather than
/// an error, so a single badly tagged track never breaks ranking.
///
/// # Examples
///
/// ```
/// use flowstate::camelot::compatibility_score;
///
/// assert_eq!(compatibility_score("8A", "8A"), 1.0);
/// assert_eq!(compatibility_score("8A", "9A"), 0.9);
/// assert_eq!(compatibility_score("8A", "10A"), 0.7);
/// assert_eq!(compatibility_score("8A", "9B"), 0.6);
/// assert_eq!(compatibility_score("8A", "3A"), 0.3);
/// assert_eq!(compatibility_score("8A", "2B"), 0.0);
/// assert_eq!(compatibility_score("8A", "???"), 0.5);
/// ```
#[must_use]
pub fn compatibility_score(key_a: &str, key_b: &str) -> f64 {
    match (key_a.parse::<WheelKey>(), key_b.parse::<WheelKey>()) {
        (Ok(a), Ok(b)) => wheel_score(a, b),
        _ => NEUTRAL_SCORE,
    }
}

/// Iterates all 24 wheel keys, `1A, 1B, 2A, ...`.
pub fn all_keys() -> impl Iterator<Item = WheelKey> {
    (1..=WHEEL_SIZE).flat_map(|position| {
        [Ring::A, Ring::B]
            .into_iter()
            .filter_map(move |ring| WheelKey::new(position, ring))
    })
}
