//! Result types produced by the recommendation engine.

use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Desired energy trajectory from the current track to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Hold,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Up, Direction::Hold, Direction::Down];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Hold => "hold",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One factor's verdict on a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub name: String,
    /// Raw score in `[0, 1]`.
    pub score: f64,
    pub weight: f64,
    /// `score * weight`.
    pub weighted_score: f64,
    pub reason: String,
}

impl FactorScore {
    /// Builds a score, clamping `score` into `[0, 1]` and deriving the
    /// weighted product.
    #[must_use]
    pub fn new(name: impl Into<String>, score: f64, weight: f64, reason: impl Into<String>) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self {
            name: name.into(),
            score,
            weight,
            weighted_score: score * weight,
            reason: reason.into(),
        }
    }
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrack {
    pub track: Track,
    pub direction: Direction,
    /// Weight-normalized aggregate in `[0, 1]`.
    pub total_score: f64,
    pub factor_scores: Vec<FactorScore>,
}

impl ScoredTrack {
    /// Human-readable breakdown, strongest contributions first.
    #[must_use]
    pub fn explain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} - {}", self.track.title, self.track.artist);
        let _ = writeln!(
            out,
            "Direction: {} | Score: {:.2}",
            self.direction.as_str().to_uppercase(),
            self.total_score
        );
        let _ = writeln!(out);
        let _ = write!(out, "Factor Breakdown:");

        let mut factors: Vec<&FactorScore> = self.factor_scores.iter().collect();
        factors.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));

        for fs in factors {
            let _ = write!(
                out,
                "\n  {}: {:.2} x {:.1} = {:.2}",
                fs.name, fs.score, fs.weight, fs.weighted_score
            );
            if !fs.reason.is_empty() {
                let _ = write!(out, "\n    - {}", fs.reason);
            }
        }
        out
    }
}

/// Everything one `recommend` call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub current_track: Track,
    pub up: Vec<ScoredTrack>,
    pub hold: Vec<ScoredTrack>,
    pub down: Vec<ScoredTrack>,
    /// Size of the whole corpus.
    pub candidates_considered: usize,
    /// Candidates left after hard filtering.
    pub filtered_count: usize,
    /// Recently played ids at call time, most recent first.
    pub recently_played: Vec<String>,
}

impl Recommendations {
    #[must_use]
    pub fn get(&self, direction: Direction) -> &[ScoredTrack] {
        match direction {
            Direction::Up => &self.up,
            Direction::Hold => &self.hold,
            Direction::Down => &self.down,
        }
    }

    /// First `n` picks for `direction`.
    #[must_use]
    pub fn top(&self, direction: Direction, n: usize) -> &[ScoredTrack] {
        let picks = self.get(direction);
        &picks[..n.min(picks.len())]
    }

    /// All picks in up, hold, down order. A track can appear more than once.
    pub fn all(&self) -> impl Iterator<Item = &ScoredTrack> {
        self.up.iter().chain(&self.hold).chain(&self.down)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.hold.is_empty() && self.down.is_empty()
    }
}
