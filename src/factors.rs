//! # Scoring Factors
//!
//! Each factor scores one dimension of how well a candidate follows the
//! current track, for a requested [`Direction`]. Factors are independent,
//! carry their own mutable weight, and hold no other state between calls.
//!
//! | Factor               | Default weight |
//! |----------------------|----------------|
//! | Energy Trajectory    | 1.0            |
//! | Danceability         | 0.8            |
//! | Vibe Compatibility   | 0.7            |
//! | Narrative Flow       | 0.6            |
//! | Key Quality          | 0.5            |
//! | Groove Compatibility | 0.4            |
//! | Mix Ease             | 0.4            |
//! | Genre Affinity       | 0.3            |
//!
//! The transition matrices below are hand-calibrated from DJ practice. Rows
//! are the current track's category, columns the candidate's, both in the
//! declaration order of the corresponding enum.

use crate::camelot;
use crate::recommendation::{Direction, FactorScore};
use crate::track::{GrooveStyle, Intensity, Track, Vibe};
use std::fmt::Debug;

/// A pluggable scoring dimension.
///
/// Implementations must return a [`FactorScore`] whose `score` lies in
/// `[0, 1]`; [`FactorScore::new`] clamps for you.
pub trait ScoringFactor: Debug + Send + Sync {
    /// Stable display name, also used to address the factor when retuning.
    fn name(&self) -> &str;

    fn weight(&self) -> f64;

    fn set_weight(&mut self, weight: f64);

    fn score(&self, current: &Track, candidate: &Track, direction: Direction) -> FactorScore;
}

/// Implements the weight plumbing shared by every built-in factor.
macro_rules! weighted_factor {
    ($ty:ident, $name:literal, $default:literal) => {
        impl $ty {
            pub const NAME: &'static str = $name;
            pub const DEFAULT_WEIGHT: f64 = $default;

            #[must_use]
            pub const fn new() -> Self {
                Self { weight: $default }
            }

            #[must_use]
            pub const fn with_weight(weight: f64) -> Self {
                Self { weight }
            }

            fn result(&self, score: f64, reason: String) -> FactorScore {
                let fs = FactorScore::new($name, score, self.weight, reason);
                log::trace!("{}: {:.3} x {:.2} ({})", $name, fs.score, fs.weight, fs.reason);
                fs
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

macro_rules! factor_accessors {
    () => {
        fn name(&self) -> &str {
            Self::NAME
        }

        fn weight(&self) -> f64 {
            self.weight
        }

        fn set_weight(&mut self, weight: f64) {
            self.weight = weight;
        }
    };
}

/// Does the energy change match the requested direction?
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyTrajectory {
    weight: f64,
}

weighted_factor!(EnergyTrajectory, "Energy Trajectory", 1.0);

impl ScoringFactor for EnergyTrajectory {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, direction: Direction) -> FactorScore {
        let delta = current.energy_delta(candidate);
        let magnitude = f64::from(delta.unsigned_abs());

        let raw = match direction {
            // +3 or more saturates
            Direction::Up if delta >= 1 => (magnitude / 3.0).min(1.0),
            Direction::Down if delta <= -1 => (magnitude / 3.0).min(1.0),
            Direction::Up | Direction::Down => 0.0,
            Direction::Hold => (1.0 - magnitude * 0.3).max(0.0),
        };

        let reason = match direction {
            Direction::Hold => format!("Energy delta: {delta:+}"),
            _ => format!("Energy {} -> {} ({delta:+})", current.energy, candidate.energy),
        };
        self.result(raw, reason)
    }
}

/// Keeps the floor moving: rewards danceable tracks, punishes big drops.
#[derive(Debug, Clone, PartialEq)]
pub struct Danceability {
    weight: f64,
}

weighted_factor!(Danceability, "Danceability", 0.8);

impl ScoringFactor for Danceability {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        let delta = i32::from(candidate.danceability) - i32::from(current.danceability);
        let base = f64::from(candidate.danceability) / 10.0;

        if delta < -2 {
            let penalty = f64::from((delta + 2).unsigned_abs()) * 0.15;
            self.result(
                (base - penalty).max(0.0),
                format!(
                    "Danceability drop: {} -> {}",
                    current.danceability, candidate.danceability
                ),
            )
        } else {
            self.result(base, format!("Danceability: {}/10", candidate.danceability))
        }
    }
}

const VIBE_MATRIX: [[f64; 6]; 6] = [
    // to: dark bright hypnotic euphoric chill aggressive
    [1.0, 0.2, 0.8, 0.1, 0.3, 0.7], // dark
    [0.2, 1.0, 0.4, 0.9, 0.6, 0.3], // bright
    [0.8, 0.4, 1.0, 0.5, 0.7, 0.4], // hypnotic
    [0.2, 0.9, 0.5, 1.0, 0.3, 0.6], // euphoric
    [0.4, 0.6, 0.7, 0.3, 1.0, 0.1], // chill
    [0.8, 0.3, 0.5, 0.6, 0.1, 1.0], // aggressive
];

/// Transition smoothness between two vibes.
#[must_use]
pub fn vibe_transition(from: Vibe, to: Vibe) -> f64 {
    VIBE_MATRIX[from.index()][to.index()]
}

/// Mood transition smoothness.
#[derive(Debug, Clone, PartialEq)]
pub struct VibeCompatibility {
    weight: f64,
}

weighted_factor!(VibeCompatibility, "Vibe Compatibility", 0.7);

impl ScoringFactor for VibeCompatibility {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        let (from, to) = (current.vibe, candidate.vibe);
        let reason = if from == to {
            format!("Same vibe: {to}")
        } else {
            format!("Vibe: {from} -> {to}")
        };
        self.result(vibe_transition(from, to), reason)
    }
}

const FLOW_MATRIX: [[f64; 4]; 4] = [
    // to: opener journey peak closer
    [0.7, 1.0, 0.4, 0.2], // opener
    [0.3, 0.9, 1.0, 0.5], // journey
    [0.1, 0.6, 0.8, 1.0], // peak
    [0.5, 0.4, 0.3, 0.8], // closer
];

/// Bonus for moving along the set arc in the requested direction.
const FLOW_DIRECTION_BONUS: f64 = 0.2;

/// Transition score between set positions, before any direction bonus.
#[must_use]
pub fn flow_transition(from: Intensity, to: Intensity) -> f64 {
    FLOW_MATRIX[from.index()][to.index()]
}

/// Set-arc progression: opener, journey, peak, closer.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrativeFlow {
    weight: f64,
}

weighted_factor!(NarrativeFlow, "Narrative Flow", 0.6);

impl ScoringFactor for NarrativeFlow {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, direction: Direction) -> FactorScore {
        let (from, to) = (current.intensity, candidate.intensity);
        let mut raw = flow_transition(from, to);

        let with_direction = match direction {
            Direction::Up => to.index() > from.index(),
            Direction::Down => to.index() < from.index(),
            Direction::Hold => false,
        };
        if with_direction {
            raw = (raw + FLOW_DIRECTION_BONUS).min(1.0);
        }

        self.result(raw, format!("Flow: {from} -> {to}"))
    }
}

/// Harmonic compatibility on the key wheel.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyQuality {
    weight: f64,
}

weighted_factor!(KeyQuality, "Key Quality", 0.5);

impl ScoringFactor for KeyQuality {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        let raw = camelot::compatibility_score(current.key_str(), candidate.key_str());

        let label = match raw {
            r if r >= 0.9 => "harmonic",
            r if r >= 0.7 => "compatible",
            r if r > 0.0 => "tension",
            _ => "clash",
        };
        let show = |k: &str| if k.is_empty() { "?".to_string() } else { k.to_string() };
        self.result(
            raw,
            format!(
                "Key: {} -> {} ({label})",
                show(current.key_str()),
                show(candidate.key_str())
            ),
        )
    }
}

const GROOVE_MATRIX: [[f64; 5]; 5] = [
    // to: four-on-floor broken swung syncopated linear
    [1.0, 0.3, 0.4, 0.5, 0.7], // four-on-floor
    [0.3, 1.0, 0.6, 0.8, 0.4], // broken
    [0.4, 0.7, 1.0, 0.6, 0.5], // swung
    [0.5, 0.8, 0.7, 1.0, 0.5], // syncopated
    [0.8, 0.4, 0.4, 0.5, 1.0], // linear
];

/// Transition smoothness between two groove styles.
#[must_use]
pub fn groove_transition(from: GrooveStyle, to: GrooveStyle) -> f64 {
    GROOVE_MATRIX[from.index()][to.index()]
}

/// Rhythm style transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct GrooveCompatibility {
    weight: f64,
}

weighted_factor!(GrooveCompatibility, "Groove Compatibility", 0.4);

impl ScoringFactor for GrooveCompatibility {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        let (from, to) = (current.groove_style, candidate.groove_style);
        let reason = if from == to {
            format!("Same groove: {to}")
        } else {
            format!("Groove: {from} -> {to}")
        };
        self.result(groove_transition(from, to), reason)
    }
}

/// Technical ease of the blend, leaning toward the incoming track.
#[derive(Debug, Clone, PartialEq)]
pub struct MixEase {
    weight: f64,
}

weighted_factor!(MixEase, "Mix Ease", 0.4);

impl ScoringFactor for MixEase {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        let mix_out = f64::from(current.mix_out_ease);
        let mix_in = f64::from(candidate.mix_in_ease);
        self.result(
            (mix_out * 0.4 + mix_in * 0.6) / 10.0,
            format!(
                "Mix out: {}/10, Mix in: {}/10",
                current.mix_out_ease, candidate.mix_in_ease
            ),
        )
    }
}

/// Genre and subgenre match.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreAffinity {
    weight: f64,
}

weighted_factor!(GenreAffinity, "Genre Affinity", 0.3);

impl ScoringFactor for GenreAffinity {
    factor_accessors!();

    fn score(&self, current: &Track, candidate: &Track, _direction: Direction) -> FactorScore {
        if !current.genre.eq_ignore_ascii_case(&candidate.genre) {
            return self.result(
                0.3,
                format!("Genre: {} -> {}", current.genre, candidate.genre),
            );
        }

        match (&current.subgenre, &candidate.subgenre) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {
                self.result(1.0, format!("Same subgenre: {b}"))
            }
            (Some(_), Some(_)) => self.result(0.8, "Same genre, different subgenre".to_string()),
            _ => self.result(0.8, format!("Same genre: {}", candidate.genre)),
        }
    }
}

/// The eight built-in factors in their canonical order.
#[must_use]
pub fn default_factors() -> Vec<Box<dyn ScoringFactor>> {
    vec![
        Box::new(EnergyTrajectory::new()),
        Box::new(Danceability::new()),
        Box::new(VibeCompatibility::new()),
        Box::new(NarrativeFlow::new()),
        Box::new(KeyQuality::new()),
        Box::new(GrooveCompatibility::new()),
        Box::new(MixEase::new()),
        Box::new(GenreAffinity::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(energy: u8) -> Track {
        Track {
            energy,
            ..Track::new(format!("e{energy}"), "Title", "Artist")
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_factor_order_and_weights() {
        let factors = default_factors();
        let summary: Vec<(&str, f64)> = factors.iter().map(|f| (f.name(), f.weight())).collect();
        assert_eq!(
            summary,
            vec![
                ("Energy Trajectory", 1.0),
                ("Danceability", 0.8),
                ("Vibe Compatibility", 0.7),
                ("Narrative Flow", 0.6),
                ("Key Quality", 0.5),
                ("Groove Compatibility", 0.4),
                ("Mix Ease", 0.4),
                ("Genre Affinity", 0.3),
            ]
        );
    }

    #[test]
    fn test_energy_up() {
        let factor = EnergyTrajectory::new();
        let cur = track(5);
        assert!(approx(factor.score(&cur, &track(6), Direction::Up).score, 1.0 / 3.0));
        assert!(approx(factor.score(&cur, &track(7), Direction::Up).score, 2.0 / 3.0));
        assert_eq!(factor.score(&cur, &track(9), Direction::Up).score, 1.0, "Saturates at +3");
        assert_eq!(factor.score(&cur, &track(5), Direction::Up).score, 0.0);
        assert_eq!(factor.score(&cur, &track(3), Direction::Up).score, 0.0);
    }

    #[test]
    fn test_energy_down_mirrors_up() {
        let factor = EnergyTrajectory::new();
        let cur = track(5);
        assert!(approx(factor.score(&cur, &track(4), Direction::Down).score, 1.0 / 3.0));
        assert_eq!(factor.score(&cur, &track(1), Direction::Down).score, 1.0);
        assert_eq!(factor.score(&cur, &track(6), Direction::Down).score, 0.0);
    }

    #[test]
    fn test_energy_hold() {
        let factor = EnergyTrajectory::new();
        let cur = track(5);
        assert_eq!(factor.score(&cur, &track(5), Direction::Hold).score, 1.0);
        assert!(approx(factor.score(&cur, &track(6), Direction::Hold).score, 0.7));
        assert!(approx(factor.score(&cur, &track(3), Direction::Hold).score, 0.4));
        assert_eq!(factor.score(&cur, &track(10), Direction::Hold).score, 0.0, "Floors at zero");
        assert_eq!(
            factor.score(&cur, &track(6), Direction::Hold).reason,
            "Energy delta: +1"
        );
    }

    #[test]
    fn test_danceability_penalty() {
        let factor = Danceability::new();
        let cur = Track { danceability: 8, ..Track::default() };

        let small_drop = Track { danceability: 6, ..Track::default() };
        assert!(approx(factor.score(&cur, &small_drop, Direction::Hold).score, 0.6));

        let big_drop = Track { danceability: 4, ..Track::default() };
        // 0.4 - 0.15 * |(-4) + 2|
        assert!(approx(factor.score(&cur, &big_drop, Direction::Hold).score, 0.1));

        let cliff = Track { danceability: 1, ..Track::default() };
        let scored = factor.score(&Track { danceability: 10, ..Track::default() }, &cliff, Direction::Hold);
        assert_eq!(scored.score, 0.0);
        assert!(scored.reason.starts_with("Danceability drop"));
    }

    #[test]
    fn test_vibe_matrix_diagonal_and_asymmetry() {
        for vibe in Vibe::ALL {
            assert_eq!(vibe_transition(*vibe, *vibe), 1.0);
        }
        assert_eq!(vibe_transition(Vibe::Dark, Vibe::Euphoric), 0.1);
        assert_eq!(vibe_transition(Vibe::Euphoric, Vibe::Dark), 0.2);
        assert_eq!(vibe_transition(Vibe::Bright, Vibe::Aggressive), 0.3);
        assert_eq!(vibe_transition(Vibe::Chill, Vibe::Aggressive), 0.1);
        assert_eq!(vibe_transition(Vibe::Aggressive, Vibe::Dark), 0.8);
    }

    #[test]
    fn test_vibe_reason() {
        let factor = VibeCompatibility::new();
        let cur = Track { vibe: Vibe::Dark, ..Track::default() };
        let next = Track { vibe: Vibe::Hypnotic, ..Track::default() };
        let fs = factor.score(&cur, &next, Direction::Hold);
        assert_eq!(fs.score, 0.8);
        assert_eq!(fs.reason, "Vibe: dark -> hypnotic");
        assert_eq!(factor.score(&cur, &cur, Direction::Hold).reason, "Same vibe: dark");
    }

    #[test]
    fn test_narrative_flow_direction_bonus() {
        let factor = NarrativeFlow::new();
        let opener = Track { intensity: Intensity::Opener, ..Track::default() };
        let peak = Track { intensity: Intensity::Peak, ..Track::default() };
        let closer = Track { intensity: Intensity::Closer, ..Track::default() };

        assert!(approx(factor.score(&opener, &peak, Direction::Hold).score, 0.4));
        assert!(approx(factor.score(&opener, &peak, Direction::Up).score, 0.6));
        assert!(approx(factor.score(&opener, &peak, Direction::Down).score, 0.4));

        assert!(approx(factor.score(&closer, &peak, Direction::Down).score, 0.5));
        assert_eq!(factor.score(&peak, &closer, Direction::Up).score, 1.0, "Bonus is capped");
    }

    #[test]
    fn test_key_quality_delegates_to_wheel() {
        let factor = KeyQuality::new();
        let a = Track { key: Some("8A".into()), ..Track::default() };
        let b = Track { key: Some("9A".into()), ..Track::default() };
        let clash = Track { key: Some("2B".into()), ..Track::default() };
        let untagged = Track::default();

        let fs = factor.score(&a, &b, Direction::Up);
        assert_eq!(fs.score, 0.9);
        assert_eq!(fs.reason, "Key: 8A -> 9A (harmonic)");
        assert!(factor.score(&a, &clash, Direction::Up).reason.ends_with("(clash)"));
        let neutral = factor.score(&a, &untagged, Direction::Up);
        assert_eq!(neutral.score, 0.5);
        assert_eq!(neutral.reason, "Key: 8A -> ? (tension)");
    }

    #[test]
    fn test_groove_matrix() {
        for groove in GrooveStyle::ALL {
            assert_eq!(groove_transition(*groove, *groove), 1.0);
        }
        assert_eq!(groove_transition(GrooveStyle::Linear, GrooveStyle::FourOnFloor), 0.8);
        assert_eq!(groove_transition(GrooveStyle::FourOnFloor, GrooveStyle::Linear), 0.7);
        assert_eq!(groove_transition(GrooveStyle::Swung, GrooveStyle::Broken), 0.7);
    }

    #[test]
    fn test_mix_ease_formula() {
        let factor = MixEase::new();
        let cur = Track { mix_out_ease: 5, ..Track::default() };
        let next = Track { mix_in_ease: 10, ..Track::default() };
        assert!(approx(factor.score(&cur, &next, Direction::Up).score, 0.8));
    }

    #[test]
    fn test_genre_affinity() {
        let factor = GenreAffinity::new();
        let house = |sub: Option<&str>| Track {
            genre: "House".into(),
            subgenre: sub.map(String::from),
            ..Track::default()
        };
        let techno = Track { genre: "techno".into(), ..Track::default() };

        let lower = Track { genre: "house".into(), subgenre: Some("DEEP".into()), ..Track::default() };
        assert_eq!(factor.score(&house(Some("deep")), &lower, Direction::Hold).score, 1.0);
        assert_eq!(factor.score(&house(Some("deep")), &house(Some("tech")), Direction::Hold).score, 0.8);
        assert_eq!(factor.score(&house(None), &house(Some("deep")), Direction::Hold).score, 0.8);
        assert_eq!(factor.score(&house(None), &techno, Direction::Hold).score, 0.3);
    }

    #[test]
    fn test_weights_are_mutable() {
        let mut factor = MixEase::new();
        factor.set_weight(2.0);
        let fs = factor.score(&Track::default(), &Track::default(), Direction::Hold);
        assert_eq!(fs.weight, 2.0);
        assert!(approx(fs.weighted_score, 1.0));
        assert_eq!(MixEase::with_weight(0.0).weight(), 0.0);
    }

    #[test]
    fn test_all_factor_scores_in_unit_range() {
        let factors = default_factors();
        let tracks: Vec<Track> = (1..=10)
            .map(|i| Track {
                energy: i,
                danceability: 11 - i,
                mix_in_ease: i,
                mix_out_ease: 11 - i,
                vibe: Vibe::ALL[usize::from(i) % Vibe::ALL.len()],
                intensity: Intensity::ALL[usize::from(i) % Intensity::ALL.len()],
                groove_style: GrooveStyle::ALL[usize::from(i) % GrooveStyle::ALL.len()],
                key: Some(format!("{}A", i)),
                ..Track::default()
            })
            .collect();

        for a in &tracks {
            for b in &tracks {
                for direction in Direction::ALL {
                    for factor in &factors {
                        let fs = factor.score(a, b, direction);
                        assert!((0.0..=1.0).contains(&fs.score), "{} out of range: {}", fs.name, fs.score);
                    }
                }
            }
        }
    }
}
