//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Flowstate using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `recommend`: Show UP / HOLD / DOWN picks for a track
//! - `session`: Interactive loop feeding each pick back in as the next track
//! - `corpus`: Inspect a corpus file (stats, search, show)
//! - `weights`: Show or persist factor weight overrides
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! flowstate recommend "Sunrise Dub"
//! flowstate -c ~/sets/friday.json recommend abc123 --explain
//! flowstate weights set "Genre Affinity" 0.6
//! ```

use crate::recommendation::Direction;
use crate::track::Vibe;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "flowstate")]
#[command(about = "Flowstate: next-track recommendations for DJs")]
#[command(version)]
pub struct Args {
    /// Corpus file to read (defaults to the data directory's corpus.json)
    #[arg(short, long, global = true, env = "FLOWSTATE_CORPUS", value_hint = clap::ValueHint::FilePath)]
    pub corpus: Option<PathBuf>,

    /// Tuning overrides file (defaults to the data directory's tuning.json)
    #[arg(long, global = true, env = "FLOWSTATE_TUNING", value_hint = clap::ValueHint::FilePath)]
    pub tuning: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Per-call overrides of the scoring thresholds.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Picks shown per direction
    #[arg(short = 'n', long)]
    pub top_n: Option<usize>,

    /// Maximum BPM difference from the current track
    #[arg(long)]
    pub bpm_range: Option<f64>,

    /// Ignore harmonic key compatibility when filtering
    #[arg(long)]
    pub allow_key_clash: bool,

    /// Drop tracks whose audio fidelity is below this (1-10)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub min_fidelity: Option<u8>,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend what to play after a track
    ///
    /// Filters the corpus by BPM window, harmonic key and fidelity, splits
    /// the survivors by energy direction and ranks each direction with the
    /// weighted factor model.
    Recommend {
        /// Track id, or part of an id or title
        #[arg(value_hint = clap::ValueHint::Other)]
        track: String,

        #[command(flatten)]
        scoring: ScoringArgs,

        /// Track ids to treat as already played, most recent first
        #[arg(long, value_delimiter = ',')]
        played: Vec<String>,

        /// Show the per-factor breakdown for every pick
        #[arg(short, long)]
        explain: bool,

        /// Print the recommendations as JSON
        #[arg(long, conflicts_with = "explain")]
        json: bool,
    },

    /// Interactive set builder
    ///
    /// Shows recommendations, reads a pick such as `u1`, `h2` or `d1` from
    /// stdin and continues from that track. `q` quits.
    Session {
        /// Track to start from
        #[arg(value_hint = clap::ValueHint::Other)]
        track: String,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Inspect a corpus
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },

    /// Show or change factor weights
    ///
    /// Changes are stored in the tuning file and apply to later runs.
    Weights {
        #[command(subcommand)]
        action: WeightsAction,
    },

    /// Generate shell completions
    ///
    /// Usage: flowstate completion bash > ~/.local/share/bash-completion/completions/flowstate
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Corpus inspection actions
#[derive(Subcommand, Debug)]
pub enum CorpusAction {
    /// Summary statistics
    Stats,

    /// Search tracks by text and attributes
    Search {
        /// Matches title, artist, genre or description
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(long)]
        min_energy: Option<u8>,

        #[arg(long)]
        max_energy: Option<u8>,

        /// dark, bright, hypnotic, euphoric, chill or aggressive
        #[arg(long)]
        vibe: Option<Vibe>,

        /// Maximum results
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Show every attribute of one track
    Show {
        /// Track id, or part of an id or title
        track: String,
    },
}

/// Weight management actions
#[derive(Subcommand, Debug)]
pub enum WeightsAction {
    /// Print effective weights
    Show,

    /// Persist a weight override
    Set {
        /// Exact factor name, e.g. "Key Quality"
        name: String,

        weight: f64,
    },

    /// Remove all weight overrides
    Reset,
}

/// A line typed during `session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// Play the 1-based `rank`-th pick of a direction.
    Pick(Direction, usize),
    Quit,
}

/// Parses `u1`, `h2`, `d3` (case-insensitive) or `q`.
#[must_use]
pub fn parse_session_input(line: &str) -> Option<SessionInput> {
    let line = line.trim().to_lowercase();
    if line == "q" || line == "quit" {
        return Some(SessionInput::Quit);
    }

    let mut chars = line.chars();
    let direction = match chars.next()? {
        'u' => Direction::Up,
        'h' => Direction::Hold,
        'd' => Direction::Down,
        _ => return None,
    };
    let rank: usize = chars.as_str().parse().ok()?;
    (rank > 0).then_some(SessionInput::Pick(direction, rank))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_recommend_with_overrides() {
        let args = Args::try_parse_from([
            "flowstate", "-c", "set.json", "recommend", "abc", "-n", "3",
            "--bpm-range", "4", "--played", "x,y", "--explain",
        ])
        .expect("Arguments should parse");

        assert_eq!(args.corpus, Some(PathBuf::from("set.json")));
        match args.command {
            Command::Recommend { track, scoring, played, explain, json } => {
                assert_eq!(track, "abc");
                assert_eq!(scoring.top_n, Some(3));
                assert_eq!(scoring.bpm_range, Some(4.0));
                assert_eq!(played, vec!["x", "y"]);
                assert!(explain);
                assert!(!json);
            }
            other => panic!("Unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_vibe_filter() {
        let args = Args::try_parse_from(["flowstate", "corpus", "search", "--vibe", "dark"])
            .expect("Arguments should parse");
        match args.command {
            Command::Corpus { action: CorpusAction::Search { vibe, limit, .. } } => {
                assert_eq!(vibe, Some(Vibe::Dark));
                assert_eq!(limit, 20);
            }
            other => panic!("Unexpected command: {other:?}"),
        }

        assert!(Args::try_parse_from(["flowstate", "corpus", "search", "--vibe", "moody"]).is_err());
    }

    #[test]
    fn test_every_subcommand_is_user_facing() {
        let cmd = Args::command();
        let hidden: Vec<_> = cmd
            .get_subcommands()
            .filter(|sub| sub.is_hide_set())
            .map(|sub| sub.get_name().to_string())
            .collect();
        assert!(hidden.is_empty(), "No hidden helper commands: {hidden:?}");
        assert!(
            Args::try_parse_from(["flowstate", "complete-tracks"]).is_err(),
            "Track listing helper is not a command"
        );
    }

    #[test]
    fn test_json_conflicts_with_explain() {
        let result = Args::try_parse_from(["flowstate", "recommend", "abc", "--json", "--explain"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_session_input() {
        assert_eq!(parse_session_input("u1"), Some(SessionInput::Pick(Direction::Up, 1)));
        assert_eq!(parse_session_input(" H2\n"), Some(SessionInput::Pick(Direction::Hold, 2)));
        assert_eq!(parse_session_input("d10"), Some(SessionInput::Pick(Direction::Down, 10)));
        assert_eq!(parse_session_input("q"), Some(SessionInput::Quit));
        assert_eq!(parse_session_input("u0"), None, "Ranks are 1-based");
        assert_eq!(parse_session_input("x1"), None);
        assert_eq!(parse_session_input("u"), None);
        assert_eq!(parse_session_input(""), None);
    }
}
