//! # Recommendation Engine
//!
//! Four-stage pipeline run for every `recommend` call:
//!
//! 1. **Hard filter**: drop the current track, recently played tracks,
//!    tracks outside the BPM window, tracks in clashing keys and low
//!    fidelity rips.
//! 2. **Direction split**: bucket survivors into UP / HOLD / DOWN by energy
//!    delta. Buckets overlap at the boundaries (a +1 delta is both UP and
//!    HOLD under the defaults).
//! 3. **Weighted scoring**: every active factor scores every candidate;
//!    the total is `Σ weighted / Σ weight`.
//! 4. **Rank**: stable sort by total, descending, then keep the top N.
//!
//! The engine borrows the corpus and never mutates it. Its only mutable
//! state is the recently played history and the factor weights, neither of
//! which is synchronized: callers serialize access to one engine.

use crate::camelot;
use crate::corpus::Corpus;
use crate::factors::{default_factors, ScoringFactor};
use crate::recommendation::{Direction, Recommendations, ScoredTrack};
use crate::track::Track;
use log::{debug, info, trace};
use std::collections::{BTreeMap, VecDeque};

/// How many recently played ids the engine remembers.
pub const MAX_HISTORY: usize = 20;

/// Errors surfaced by engine configuration calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown factor: {0:?}")]
    UnknownFactor(String),
}

/// Tunable parameters for one engine.
#[derive(Debug)]
pub struct ScoringConfig {
    /// Maximum absolute BPM difference from the current track.
    pub bpm_range: f64,
    /// Skip the harmonic key filter entirely.
    pub allow_key_clash: bool,

    pub up_min_delta: i32,
    /// Informational; UP membership is bounded below only.
    pub up_max_delta: i32,
    pub hold_max_delta: i32,
    pub down_min_delta: i32,
    /// Informational; DOWN membership is bounded above only.
    pub down_max_delta: i32,

    /// Picks kept per direction.
    pub top_n: usize,
    /// Tracks with `audio_fidelity` below this never reach scoring.
    pub min_audio_fidelity: u8,

    /// Active factors, in evaluation order.
    pub factors: Vec<Box<dyn ScoringFactor>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bpm_range: 6.0,
            allow_key_clash: false,
            up_min_delta: 1,
            up_max_delta: 3,
            hold_max_delta: 1,
            down_min_delta: 1,
            down_max_delta: 3,
            top_n: 5,
            min_audio_fidelity: 0,
            factors: default_factors(),
        }
    }
}

impl ScoringConfig {
    /// Default thresholds with a custom factor set.
    #[must_use]
    pub fn with_factors(factors: Vec<Box<dyn ScoringFactor>>) -> Self {
        Self {
            factors,
            ..Self::default()
        }
    }

    /// Overwrites the weight of the factor named exactly `name`.
    ///
    /// Returns the previous weight.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownFactor`] if no factor has that name;
    /// the configuration is left untouched.
    pub fn set_factor_weight(&mut self, name: &str, weight: f64) -> Result<f64, EngineError> {
        let factor = self
            .factors
            .iter_mut()
            .find(|f| f.name() == name)
            .ok_or_else(|| EngineError::UnknownFactor(name.to_string()))?;

        let previous = factor.weight();
        factor.set_weight(weight);
        info!("Factor {name:?} weight {previous} -> {weight}");
        Ok(previous)
    }

    /// Snapshot of name → weight.
    #[must_use]
    pub fn factor_weights(&self) -> BTreeMap<String, f64> {
        self.factors
            .iter()
            .map(|f| (f.name().to_string(), f.weight()))
            .collect()
    }

    /// Factor names in evaluation order.
    #[must_use]
    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name()).collect()
    }
}

/// Next-track recommender over a borrowed corpus.
#[derive(Debug)]
pub struct RecommendationEngine<'c> {
    corpus: &'c Corpus,
    config: ScoringConfig,
    recently_played: VecDeque<String>,
}

impl<'c> RecommendationEngine<'c> {
    #[must_use]
    pub fn new(corpus: &'c Corpus, config: ScoringConfig) -> Self {
        Self {
            corpus,
            config,
            recently_played: VecDeque::with_capacity(MAX_HISTORY + 1),
        }
    }

    /// Engine with [`ScoringConfig::default`].
    #[must_use]
    pub fn with_defaults(corpus: &'c Corpus) -> Self {
        Self::new(corpus, ScoringConfig::default())
    }

    #[must_use]
    pub fn corpus(&self) -> &'c Corpus {
        self.corpus
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ScoringConfig {
        &mut self.config
    }

    /// Recently played ids, most recent first.
    pub fn recently_played(&self) -> impl Iterator<Item = &str> {
        self.recently_played.iter().map(String::as_str)
    }

    /// Moves `track_id` to the front of the history, evicting the oldest
    /// entry beyond [`MAX_HISTORY`].
    pub fn add_to_history(&mut self, track_id: &str) {
        self.recently_played.retain(|id| id != track_id);
        self.recently_played.push_front(track_id.to_string());
        self.recently_played.truncate(MAX_HISTORY);
    }

    pub fn clear_history(&mut self) {
        self.recently_played.clear();
    }

    /// See [`ScoringConfig::set_factor_weight`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownFactor`] for an unknown name.
    pub fn set_factor_weight(&mut self, name: &str, weight: f64) -> Result<f64, EngineError> {
        self.config.set_factor_weight(name, weight)
    }

    #[must_use]
    pub fn factor_weights(&self) -> BTreeMap<String, f64> {
        self.config.factor_weights()
    }

    #[must_use]
    pub fn factor_names(&self) -> Vec<&str> {
        self.config.factor_names()
    }

    /// Runs the full pipeline for `current` and records it as played.
    pub fn recommend(&mut self, current: &Track) -> Recommendations {
        self.add_to_history(&current.id);

        let candidates = self.hard_filter(current);
        debug!(
            "{} of {} tracks survive hard filters for {:?}",
            candidates.len(),
            self.corpus.len(),
            current.id
        );

        let (up, hold, down) = self.split_by_direction(current, &candidates);
        debug!("Buckets: up={} hold={} down={}", up.len(), hold.len(), down.len());

        let top_n = self.config.top_n;
        let rank = |bucket: &[&Track], direction| {
            let mut ranked = self.score_and_rank(current, bucket, direction);
            ranked.truncate(top_n);
            ranked
        };

        Recommendations {
            current_track: current.clone(),
            up: rank(up.as_slice(), Direction::Up),
            hold: rank(hold.as_slice(), Direction::Hold),
            down: rank(down.as_slice(), Direction::Down),
            candidates_considered: self.corpus.len(),
            filtered_count: candidates.len(),
            recently_played: self.recently_played.iter().cloned().collect(),
        }
    }

    /// Stage 1: eligibility checks, preserving corpus order.
    #[must_use]
    pub fn hard_filter(&self, current: &Track) -> Vec<&'c Track> {
        let compatible = if self.config.allow_key_clash {
            Vec::new()
        } else {
            camelot::compatible_keys(current.key_str(), true)
        };

        let corpus: &'c Corpus = self.corpus;
        corpus
            .tracks()
            .iter()
            .filter(|track| {
                if track.id == current.id {
                    return false;
                }
                if self.recently_played.iter().any(|id| *id == track.id) {
                    trace!("{:?}: recently played", track.id);
                    return false;
                }
                if (track.bpm - current.bpm).abs() > self.config.bpm_range {
                    trace!("{:?}: bpm {} outside window", track.id, track.bpm);
                    return false;
                }
                // An unresolvable current key yields no list and disables the check
                if !compatible.is_empty() {
                    let key = camelot::to_wheel_notation(track.key_str());
                    if !key.is_some_and(|k| compatible.contains(&k)) {
                        trace!("{:?}: key {:?} clashes", track.id, track.key);
                        return false;
                    }
                }
                if track.audio_fidelity < self.config.min_audio_fidelity {
                    trace!("{:?}: fidelity {} too low", track.id, track.audio_fidelity);
                    return false;
                }
                true
            })
            .collect()
    }

    /// Stage 2: overlapping energy buckets (up, hold, down).
    #[must_use]
    pub fn split_by_direction<'t>(
        &self,
        current: &Track,
        candidates: &[&'t Track],
    ) -> (Vec<&'t Track>, Vec<&'t Track>, Vec<&'t Track>) {
        let mut up = Vec::new();
        let mut hold = Vec::new();
        let mut down = Vec::new();

        for &candidate in candidates {
            let delta = current.energy_delta(candidate);
            if delta >= self.config.up_min_delta {
                up.push(candidate);
            }
            if delta.abs() <= self.config.hold_max_delta {
                hold.push(candidate);
            }
            if delta <= -self.config.down_min_delta {
                down.push(candidate);
            }
        }

        (up, hold, down)
    }

    /// Evaluates every factor for one candidate.
    #[must_use]
    pub fn score_candidate(&self, current: &Track, candidate: &Track, direction: Direction) -> ScoredTrack {
        let factor_scores: Vec<_> = self
            .config
            .factors
            .iter()
            .map(|factor| factor.score(current, candidate, direction))
            .collect();

        let total_weighted: f64 = factor_scores.iter().map(|fs| fs.weighted_score).sum();
        let total_weight: f64 = factor_scores.iter().map(|fs| fs.weight).sum();
        // Infinite weights make the ratio NaN
        let ratio = total_weighted / total_weight;
        let total_score = if total_weight > 0.0 && !ratio.is_nan() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };

        ScoredTrack {
            track: candidate.clone(),
            direction,
            total_score,
            factor_scores,
        }
    }

    /// Stages 3 and 4: score then stable-sort descending. Equal totals keep
    /// their incoming order.
    #[must_use]
    pub fn score_and_rank(
        &self,
        current: &Track,
        candidates: &[&Track],
        direction: Direction,
    ) -> Vec<ScoredTrack> {
        let mut scored: Vec<ScoredTrack> = candidates
            .iter()
            .map(|candidate| self.score_candidate(current, candidate, direction))
            .collect();

        scored.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        scored
    }
}
