//! # Track Corpus
//!
//! The ordered collection of analysed tracks that recommendations are drawn
//! from, with an id/path index, attribute search and summary statistics.
//!
//! Corpora persist as a single pretty-printed JSON document:
//!
//! ```json
//! { "tracks": [ { "track_id": "…", "title": "…", … } ] }
//! ```
//!
//! Unknown top-level keys are ignored so files written by other tools load
//! unchanged.

use crate::camelot;
use crate::track::{Track, Vibe};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Fidelity below which a rip is counted as low quality in [`CorpusStats`].
pub const LOW_FIDELITY_THRESHOLD: u8 = 6;

/// Ordered, indexed track collection.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    tracks: Vec<Track>,
    by_id: HashMap<String, usize>,
    by_path: HashMap<String, usize>,
}

#[derive(Serialize)]
struct CorpusFileRef<'a> {
    tracks: &'a [Track],
}

#[derive(Deserialize)]
struct CorpusFile {
    #[serde(default)]
    tracks: Vec<Track>,
}

impl Corpus {
    /// Builds a corpus, indexing tracks in order. A later duplicate id
    /// shadows an earlier one in [`Corpus::get_by_id`].
    #[must_use]
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut corpus = Self {
            tracks,
            ..Self::default()
        };
        corpus.rebuild_indexes();
        corpus
    }

    fn rebuild_indexes(&mut self) {
        self.by_id.clear();
        self.by_path.clear();
        for (i, track) in self.tracks.iter().enumerate() {
            self.by_id.insert(track.id.clone(), i);
            if !track.file_path.as_os_str().is_empty() {
                self.by_path.insert(track.file_path.to_string_lossy().into_owned(), i);
            }
        }
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Replaces the track with the same id in place, otherwise appends.
    pub fn add(&mut self, track: Track) {
        let existing = self.by_id.get(&track.id).copied();
        match existing {
            Some(i) => {
                debug!("Replacing track {:?}", track.id);
                self.tracks[i] = track;
            }
            None => self.tracks.push(track),
        }
        self.rebuild_indexes();
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Track> {
        self.by_id.get(id).map(|&i| &self.tracks[i])
    }

    #[must_use]
    pub fn get_by_path(&self, path: impl AsRef<Path>) -> Option<&Track> {
        let key = path.as_ref().to_string_lossy();
        self.by_path.get(key.as_ref()).map(|&i| &self.tracks[i])
    }

    /// Finds a track by exact id, then by case-insensitive substring of id
    /// or title. The first partial match in corpus order wins.
    #[must_use]
    pub fn resolve(&self, needle: &str) -> Option<&Track> {
        if let Some(track) = self.get_by_id(needle) {
            return Some(track);
        }
        let needle = needle.to_lowercase();
        self.tracks.iter().find(|t| {
            t.id.to_lowercase().contains(&needle) || t.title.to_lowercase().contains(&needle)
        })
    }

    /// Tracks matching every set criterion of `query`, in corpus order.
    #[must_use]
    pub fn search(&self, query: &SearchQuery) -> Vec<&Track> {
        self.tracks.iter().filter(|t| query.matches(t)).collect()
    }

    /// Summary statistics. All fields are empty for an empty corpus.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        if self.tracks.is_empty() {
            return CorpusStats::default();
        }

        #[allow(clippy::cast_precision_loss)]
        let n = self.tracks.len() as f64;
        let mut stats = CorpusStats {
            total_tracks: self.tracks.len(),
            ..CorpusStats::default()
        };

        let mut bpm_sum = 0.0;
        let mut quality_sum = 0u32;
        let mut fidelity_sum = 0u32;
        let mut bpm_min = f64::INFINITY;
        let mut bpm_max = f64::NEG_INFINITY;

        for track in &self.tracks {
            bpm_sum += track.bpm;
            bpm_min = bpm_min.min(track.bpm);
            bpm_max = bpm_max.max(track.bpm);
            quality_sum += u32::from(track.production_quality);
            fidelity_sum += u32::from(track.audio_fidelity);
            if track.audio_fidelity < LOW_FIDELITY_THRESHOLD {
                stats.low_fidelity_count += 1;
            }

            *stats.energy_distribution.entry(track.energy).or_default() += 1;
            *stats.vibe_distribution.entry(track.vibe.to_string()).or_default() += 1;
            *stats.intensity_distribution.entry(track.intensity.to_string()).or_default() += 1;
            let key = track.wheel_key().map_or_else(|| "unknown".to_string(), |k| k.to_string());
            *stats.key_distribution.entry(key).or_default() += 1;
            *stats.genre_distribution.entry(track.genre.clone()).or_default() += 1;
            *stats.vocal_distribution.entry(track.vocal_presence.to_string()).or_default() += 1;
        }

        stats.bpm_min = Some(bpm_min);
        stats.bpm_max = Some(bpm_max);
        stats.bpm_avg = Some(bpm_sum / n);
        stats.avg_production_quality = Some(f64::from(quality_sum) / n);
        stats.avg_audio_fidelity = Some(f64::from(fidelity_sum) / n);
        stats
    }

    /// Loads a corpus file. A missing file yields an empty corpus.
    ///
    /// Tracks with out-of-range attributes are kept and logged at `warn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No corpus at {}, starting empty", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file {}", path.display()))?;
        let file: CorpusFile = serde_json::from_str(&text)
            .with_context(|| format!("Corpus file {} is not valid corpus JSON", path.display()))?;

        for track in &file.tracks {
            for problem in track.validate() {
                warn!("Track {:?}: {problem}", track.id);
            }
        }

        info!("Loaded {} tracks from {}", file.tracks.len(), path.display());
        Ok(Self::new(file.tracks))
    }

    /// Writes the corpus as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&CorpusFileRef { tracks: &self.tracks })
            .context("Failed to serialize corpus")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write corpus file {}", path.display()))?;

        debug!("Saved {} tracks to {}", self.tracks.len(), path.display());
        Ok(())
    }
}

/// Attribute filters for [`Corpus::search`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Case-insensitive substring of title, artist, genre or description.
    pub text: String,
    /// Inclusive BPM bounds.
    pub bpm_range: Option<(f64, f64)>,
    /// Accepted keys, compared in wheel notation.
    pub keys: Vec<String>,
    pub vibes: Vec<Vibe>,
    pub min_energy: Option<u8>,
    pub max_energy: Option<u8>,
    /// Unrated tracks never satisfy a rating floor.
    pub min_rating: Option<u8>,
    pub min_fidelity: Option<u8>,
}

impl SearchQuery {
    /// Text-only query.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn matches(&self, track: &Track) -> bool {
        if !self.text.is_empty() {
            let needle = self.text.to_lowercase();
            let hit = [&track.title, &track.artist, &track.genre, &track.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some((low, high)) = self.bpm_range {
            if track.bpm < low || track.bpm > high {
                return false;
            }
        }

        if !self.keys.is_empty() {
            let Some(key) = track.wheel_key() else {
                return false;
            };
            let key = key.to_string();
            let listed = self
                .keys
                .iter()
                .filter_map(|k| camelot::to_wheel_notation(k))
                .any(|k| k == key);
            if !listed {
                return false;
            }
        }

        if !self.vibes.is_empty() && !self.vibes.contains(&track.vibe) {
            return false;
        }

        if self.min_energy.is_some_and(|min| track.energy < min)
            || self.max_energy.is_some_and(|max| track.energy > max)
        {
            return false;
        }

        if let Some(min) = self.min_rating {
            if track.rating.map_or(true, |r| r < min) {
                return false;
            }
        }

        !self.min_fidelity.is_some_and(|min| track.audio_fidelity < min)
    }
}

/// Aggregate view of a corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusStats {
    pub total_tracks: usize,

    pub bpm_min: Option<f64>,
    pub bpm_max: Option<f64>,
    pub bpm_avg: Option<f64>,

    pub energy_distribution: BTreeMap<u8, usize>,
    pub vibe_distribution: BTreeMap<String, usize>,
    pub intensity_distribution: BTreeMap<String, usize>,
    pub key_distribution: BTreeMap<String, usize>,
    pub genre_distribution: BTreeMap<String, usize>,
    pub vocal_distribution: BTreeMap<String, usize>,

    pub avg_production_quality: Option<f64>,
    pub avg_audio_fidelity: Option<f64>,
    pub low_fidelity_count: usize,
}
