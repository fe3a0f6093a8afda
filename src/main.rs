//! # Flowstate - DJ Next-Track Recommender
//!
//! Given the track that is playing, Flowstate suggests what to play next in
//! three directions: raise the energy, hold it, or bring it down. Picks are
//! filtered by tempo, harmonic key and audio fidelity, then ranked by a
//! weighted set of musical factors.
//!
//! ## Architecture
//!
//! - `engine`: Filter, split and rank pipeline
//! - `factors`: Weighted scoring factors
//! - `camelot`: Harmonic key wheel
//! - `corpus`: Track collection and JSON persistence
//! - `config`: Data directory and tuning overrides
//! - `cli`: Command-line interface definitions
//! - `report`: Terminal rendering
//!
//! ## Usage
//!
//! ```bash
//! # Recommend after a track
//! flowstate recommend "Sunrise Dub" --explain
//!
//! # Build a set interactively
//! flowstate session abc123
//!
//! # Tune a factor
//! flowstate weights set "Key Quality" 0.8
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser};
use flowstate::cli::{self, SessionInput};
use flowstate::config::{get_corpus_path, get_tuning_path, RuntimeConfig, TuningOverrides};
use flowstate::corpus::{Corpus, SearchQuery};
use flowstate::engine::{RecommendationEngine, ScoringConfig};
use flowstate::{completion, report};
use log::{debug, info};
use std::io::{self, BufRead, Write};

/// Resolves file locations: command-line flags win over the data directory.
fn runtime_config(args: &cli::Args) -> Result<RuntimeConfig> {
    let corpus_path = match &args.corpus {
        Some(path) => path.clone(),
        None => get_corpus_path()?,
    };
    let tuning_path = match &args.tuning {
        Some(path) => path.clone(),
        None => get_tuning_path()?,
    };
    Ok(RuntimeConfig::with_paths(corpus_path, tuning_path))
}

/// Persisted overrides, then per-call flags.
fn scoring_config(runtime: &RuntimeConfig, scoring: &cli::ScoringArgs) -> Result<ScoringConfig> {
    let tuning = TuningOverrides::load(&runtime.tuning_path)?;
    let mut config = tuning
        .to_scoring_config()
        .with_context(|| format!("Invalid tuning file {}", runtime.tuning_path.display()))?;

    if let Some(top_n) = scoring.top_n {
        config.top_n = top_n;
    }
    if let Some(bpm_range) = scoring.bpm_range {
        config.bpm_range = bpm_range;
    }
    if scoring.allow_key_clash {
        config.allow_key_clash = true;
    }
    if let Some(min_fidelity) = scoring.min_fidelity {
        config.min_audio_fidelity = min_fidelity;
    }
    debug!("Scoring config: {config:?}");
    Ok(config)
}

fn load_corpus(runtime: &RuntimeConfig) -> Result<Corpus> {
    let corpus = Corpus::load(&runtime.corpus_path)?;
    if corpus.is_empty() {
        return Err(anyhow!(
            "Corpus {} has no tracks. Point --corpus at a corpus JSON file.",
            runtime.corpus_path.display()
        ));
    }
    Ok(corpus)
}

/// Interactive loop: show picks, read a choice, continue from the choice.
fn run_session(engine: &mut RecommendationEngine<'_>, start: &str) -> Result<()> {
    let corpus = engine.corpus();
    let mut current = corpus
        .resolve(start)
        .ok_or_else(|| anyhow!("No track matches {start:?}"))?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut played = 1;

    loop {
        let recs = engine.recommend(current);
        {
            let mut out = io::stdout().lock();
            writeln!(out)?;
            report::write_recommendations(&mut out, &recs, false)?;
            write!(out, "\nPick (u1/h1/d1, q to quit): ")?;
            out.flush()?;
        }

        let Some(line) = lines.next() else { break };
        match cli::parse_session_input(&line?) {
            Some(SessionInput::Quit) => break,
            Some(SessionInput::Pick(direction, rank)) => match recs.get(direction).get(rank - 1) {
                Some(pick) => {
                    current = corpus
                        .get_by_id(&pick.track.id)
                        .ok_or_else(|| anyhow!("Track {:?} vanished from corpus", pick.track.id))?;
                    played += 1;
                    info!("Session pick {played}: {current}");
                }
                None => println!("No {} pick #{rank}", direction.as_str()),
            },
            None => println!("Unrecognized input"),
        }
    }

    println!("Played {played} tracks");
    Ok(())
}

/// Main entry point for Flowstate.
///
/// Initializes logging, parses command-line arguments and routes commands.
///
/// # Logging
///
/// Controlled via `RUST_LOG`:
/// - `RUST_LOG=debug flowstate recommend x` - Pipeline stage sizes
/// - `RUST_LOG=flowstate::factors=trace flowstate recommend x` - Every factor score
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match &args.command {
        cli::Command::Recommend { track, scoring, played, explain, json } => {
            let runtime = runtime_config(&args)?;
            let corpus = load_corpus(&runtime)?;
            let mut engine = RecommendationEngine::new(&corpus, scoring_config(&runtime, scoring)?);
            for id in played.iter().rev() {
                engine.add_to_history(id);
            }

            let current = corpus
                .resolve(track)
                .ok_or_else(|| anyhow!("No track matches {track:?}"))?;
            info!("Recommending after {current}");
            let recs = engine.recommend(current);

            if *json {
                let text = serde_json::to_string_pretty(&recs).context("Failed to serialize recommendations")?;
                println!("{text}");
            } else {
                report::write_recommendations(&mut io::stdout().lock(), &recs, *explain)?;
            }
        }
        cli::Command::Session { track, scoring } => {
            let runtime = runtime_config(&args)?;
            let corpus = load_corpus(&runtime)?;
            let mut engine = RecommendationEngine::new(&corpus, scoring_config(&runtime, scoring)?);
            run_session(&mut engine, track)?;
        }
        cli::Command::Corpus { action } => {
            let runtime = runtime_config(&args)?;
            let corpus = Corpus::load(&runtime.corpus_path)?;
            let mut out = io::stdout().lock();

            match action {
                cli::CorpusAction::Stats => {
                    report::write_stats(&mut out, &corpus.stats())?;
                }
                cli::CorpusAction::Search { query, min_energy, max_energy, vibe, limit } => {
                    let search = SearchQuery {
                        text: query.clone(),
                        min_energy: *min_energy,
                        max_energy: *max_energy,
                        vibes: vibe.iter().copied().collect(),
                        ..SearchQuery::default()
                    };
                    let hits = corpus.search(&search);
                    let shown: Vec<_> = hits.iter().copied().take(*limit).collect();
                    report::write_track_table(&mut out, &shown)?;
                    if hits.len() > shown.len() {
                        writeln!(out, "... {} more", hits.len() - shown.len())?;
                    }
                }
                cli::CorpusAction::Show { track } => {
                    let found = corpus
                        .resolve(track)
                        .ok_or_else(|| anyhow!("No track matches {track:?}"))?;
                    report::write_track_detail(&mut out, found)?;
                }
            }
        }
        cli::Command::Weights { action } => {
            let runtime = runtime_config(&args)?;
            let mut tuning = TuningOverrides::load(&runtime.tuning_path)?;

            match action {
                cli::WeightsAction::Show => {
                    let config = tuning.to_scoring_config()?;
                    let weights: Vec<(String, f64)> = config
                        .factors
                        .iter()
                        .map(|f| (f.name().to_string(), f.weight()))
                        .collect();
                    report::write_weights(&mut io::stdout().lock(), &weights)?;
                }
                cli::WeightsAction::Set { name, weight } => {
                    if !weight.is_finite() || *weight < 0.0 {
                        return Err(anyhow!("Weight must be a non-negative number, got {weight}"));
                    }
                    // Reject unknown names before anything is written.
                    let mut config = tuning.to_scoring_config()?;
                    let previous = match config.set_factor_weight(name, *weight) {
                        Ok(previous) => previous,
                        Err(e) => {
                            return Err(anyhow!("{e}. Known factors: {}", config.factor_names().join(", ")));
                        }
                    };

                    tuning.weights.insert(name.clone(), *weight);
                    tuning.save(&runtime.tuning_path)?;
                    println!("{name}: {previous:.2} -> {weight:.2}");
                }
                cli::WeightsAction::Reset => {
                    tuning.weights.clear();
                    tuning.save(&runtime.tuning_path)?;
                    println!("Factor weights reset to defaults");
                }
            }
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::print_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(())
}
