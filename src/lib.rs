//! Next-track recommendations for DJs.
//!
//! Core modules:
//! - [`engine`] - Filter, split and rank pipeline
//! - [`factors`] - Weighted scoring factors
//! - [`camelot`] - Harmonic key wheel and compatibility
//! - [`track`] - Track model and categorical attributes
//! - [`recommendation`] - Result types
//!
//! ### Supporting Modules
//!
//! - [`corpus`] - Track collection, search, statistics and JSON persistence
//! - [`config`] - Data directory and persisted tuning overrides
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`report`] - Terminal rendering
//!
//! ## Quick Start Example
//!
//! ```
//! use flowstate::corpus::Corpus;
//! use flowstate::engine::RecommendationEngine;
//! use flowstate::recommendation::Direction;
//! use flowstate::track::Track;
//!
//! let playing = Track { key: Some("8A".into()), energy: 5, ..Track::new("a", "Opening", "DJ") };
//! let lift = Track { key: Some("9A".into()), energy: 7, ..Track::new("b", "Lift", "DJ") };
//! let corpus = Corpus::new(vec![playing.clone(), lift]);
//!
//! let mut engine = RecommendationEngine::with_defaults(&corpus);
//! let recs = engine.recommend(&playing);
//!
//! assert_eq!(recs.get(Direction::Up)[0].track.id, "b");
//! assert!(recs.get(Direction::Down).is_empty());
//! ```
//!
//! ## Pipeline
//!
//! Every `recommend` call runs four stages:
//!
//! 1. **Hard filter** - excludes the current track, recently played tracks,
//!    tracks outside the BPM window, harmonically incompatible keys and low
//!    fidelity files
//! 2. **Direction split** - UP / HOLD / DOWN by energy delta; buckets may
//!    overlap at their edges
//! 3. **Scoring** - each factor returns a score in `[0, 1]` with a reason;
//!    the total is the weight-normalized sum
//! 4. **Ranking** - stable descending sort, top N per direction
//!
//! ## Tuning
//!
//! Factor weights are adjustable at runtime through
//! [`engine::RecommendationEngine::set_factor_weight`]. A weight of `0.0`
//! removes a factor's influence. The binary persists overrides with
//! [`config::TuningOverrides`].
//!
//! ## Error Handling
//!
//! The engine itself is infallible apart from naming an unknown factor,
//! reported as [`engine::EngineError`]. File and corpus operations return
//! `anyhow::Result` with context describing the path involved.

pub mod camelot;
pub mod cli;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod factors;
pub mod recommendation;
pub mod report;
pub mod track;
