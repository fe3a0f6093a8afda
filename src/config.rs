//! # Configuration Module
//!
//! This module handles data directory setup and persisted tuning for
//! Flowstate. It provides platform-appropriate storage locations and
//! ensures necessary directories exist.
//!
//! ## Data Storage
//!
//! Flowstate keeps its files in the platform-standard data directory:
//! - Linux: `~/.local/share/flowstate/`
//! - macOS: `~/Library/Application Support/flowstate/`
//! - Windows: `%APPDATA%\flowstate\`
//!
//! | File           | Contents                                   |
//! |----------------|--------------------------------------------|
//! | `corpus.json`  | default track corpus                       |
//! | `tuning.json`  | scoring threshold and weight overrides     |

use crate::engine::{EngineError, ScoringConfig};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the Flowstate data directory, creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The flowstate subdirectory cannot be created due to permissions
///
/// # Examples
///
/// ```no_run
/// use flowstate::config::get_data_dir;
///
/// let dir = get_data_dir()?;
/// println!("Data directory: {}", dir.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let flowstate_dir = data_dir.join("flowstate");
    fs::create_dir_all(&flowstate_dir)
        .with_context(|| format!(
            "Failed to create Flowstate data directory at {}. Please check file permissions.",
            flowstate_dir.display()
        ))?;

    Ok(flowstate_dir)
}

/// Default corpus location, `<data dir>/corpus.json`.
///
/// # Errors
///
/// Same failure modes as [`get_data_dir`].
pub fn get_corpus_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("corpus.json"))
}

/// Default tuning overrides location, `<data dir>/tuning.json`.
///
/// # Errors
///
/// Same failure modes as [`get_data_dir`].
pub fn get_tuning_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("tuning.json"))
}

/// File locations used by one run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub corpus_path: PathBuf,
    pub tuning_path: PathBuf,
}

impl RuntimeConfig {
    /// Locations under the platform data directory.
    ///
    /// # Errors
    ///
    /// Fails if the data directory cannot be determined or created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            corpus_path: get_corpus_path()?,
            tuning_path: get_tuning_path()?,
        })
    }

    /// Explicit locations, no filesystem access.
    pub fn with_paths(corpus_path: PathBuf, tuning_path: PathBuf) -> Self {
        Self {
            corpus_path,
            tuning_path,
        }
    }
}

/// Persisted overrides layered on top of [`ScoringConfig::default`].
///
/// Every field is optional so a file only needs to mention what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm_range: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_key_clash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_min_delta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_max_delta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_max_delta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_min_delta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_max_delta: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_audio_fidelity: Option<u8>,
    /// Factor name → weight.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
}

impl TuningOverrides {
    /// Reads overrides; a missing file means no overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No tuning file at {}", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tuning file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Tuning file {} is not valid JSON", path.display()))
    }

    /// Writes overrides as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize tuning")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write tuning file {}", path.display()))?;
        info!("Saved tuning to {}", path.display());
        Ok(())
    }

    /// Applies every set override to `config`.
    ///
    /// Scalars are applied first, then weights. A weight for an unknown
    /// factor aborts with `config`'s weights unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownFactor`] for an unrecognized weight name.
    pub fn apply(&self, config: &mut ScoringConfig) -> Result<(), EngineError> {
        if let Some(unknown) = self
            .weights
            .keys()
            .find(|name| !config.factors.iter().any(|f| f.name() == name.as_str()))
        {
            return Err(EngineError::UnknownFactor(unknown.clone()));
        }

        if let Some(v) = self.bpm_range {
            config.bpm_range = v;
        }
        if let Some(v) = self.allow_key_clash {
            config.allow_key_clash = v;
        }
        if let Some(v) = self.up_min_delta {
            config.up_min_delta = v;
        }
        if let Some(v) = self.up_max_delta {
            config.up_max_delta = v;
        }
        if let Some(v) = self.hold_max_delta {
            config.hold_max_delta = v;
        }
        if let Some(v) = self.down_min_delta {
            config.down_min_delta = v;
        }
        if let Some(v) = self.down_max_delta {
            config.down_max_delta = v;
        }
        if let Some(v) = self.top_n {
            config.top_n = v;
        }
        if let Some(v) = self.min_audio_fidelity {
            config.min_audio_fidelity = v;
        }

        for (name, &weight) in &self.weights {
            config.set_factor_weight(name, weight)?;
        }
        Ok(())
    }

    /// [`ScoringConfig::default`] with these overrides applied.
    ///
    /// # Errors
    ///
    /// See [`TuningOverrides::apply`].
    pub fn to_scoring_config(&self) -> Result<ScoringConfig, EngineError> {
        let mut config = ScoringConfig::default();
        self.apply(&mut config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_data_dir_creates_directory() {
        let dir = get_data_dir().expect("Should resolve data dir");
        assert!(dir.exists());
        assert!(dir.is_dir());
        assert_eq!(dir.file_name().unwrap(), "flowstate");
    }

    #[test]
    fn test_default_paths_structure() {
        let corpus = get_corpus_path().expect("Should get corpus path");
        let tuning = get_tuning_path().expect("Should get tuning path");

        assert!(corpus.is_absolute(), "Corpus path should be absolute");
        assert!(corpus.to_string_lossy().ends_with("corpus.json"));
        assert_eq!(corpus.parent(), tuning.parent());
    }

    #[test]
    fn test_runtime_config_with_paths() {
        let config = RuntimeConfig::with_paths(PathBuf::from("/tmp/c.json"), PathBuf::from("/tmp/t.json"));
        assert_eq!(config.corpus_path, PathBuf::from("/tmp/c.json"));
        assert_eq!(config.tuning_path, PathBuf::from("/tmp/t.json"));
    }

    #[test]
    fn test_runtime_config_new_never_relative() {
        let config = RuntimeConfig::new().expect("Data directory should resolve");
        assert!(config.corpus_path.is_absolute(), "Corpus path must not fall back to a relative file");
        assert!(config.tuning_path.is_absolute(), "Tuning path must not fall back to a relative file");
        assert_eq!(config.corpus_path, get_corpus_path().expect("Should get corpus path"));
    }

    #[test]
    fn test_apply_overrides() {
        let overrides = TuningOverrides {
            bpm_range: Some(3.0),
            top_n: Some(2),
            allow_key_clash: Some(true),
            weights: BTreeMap::from([("Genre Affinity".to_string(), 1.5)]),
            ..TuningOverrides::default()
        };

        let config = overrides.to_scoring_config().expect("Overrides should apply");
        assert_eq!(config.bpm_range, 3.0);
        assert_eq!(config.top_n, 2);
        assert!(config.allow_key_clash);
        assert_eq!(config.hold_max_delta, 1, "Unset fields keep defaults");
        assert_eq!(config.factor_weights()["Genre Affinity"], 1.5);
    }

    #[test]
    fn test_unknown_weight_rejected_without_partial_apply() {
        let overrides = TuningOverrides {
            weights: BTreeMap::from([
                ("Energy Trajectory".to_string(), 0.1),
                ("Bogus".to_string(), 1.0),
            ]),
            ..TuningOverrides::default()
        };

        let mut config = ScoringConfig::default();
        let err = overrides.apply(&mut config).unwrap_err();
        assert_eq!(err, EngineError::UnknownFactor("Bogus".into()));
        assert_eq!(config.factor_weights()["Energy Trajectory"], 1.0);
    }

    #[test]
    fn test_tuning_round_trip_and_missing() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("tuning.json");

        assert_eq!(TuningOverrides::load(&path)?, TuningOverrides::default());

        let overrides = TuningOverrides {
            min_audio_fidelity: Some(6),
            weights: BTreeMap::from([("Mix Ease".to_string(), 0.0)]),
            ..TuningOverrides::default()
        };
        overrides.save(&path)?;

        let text = fs::read_to_string(&path)?;
        assert!(!text.contains("bpm_range"), "Unset overrides are not written");
        assert_eq!(TuningOverrides::load(&path)?, overrides);
        Ok(())
    }
}
