//! # Shell Completion Module
//!
//! Generation of completion scripts for the supported shells.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! flowstate completion bash > ~/.local/share/bash-completion/completions/flowstate
//!
//! # Generate zsh completions
//! flowstate completion zsh > ~/.config/zsh/completions/_flowstate
//! ```

use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell into `out`.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions for the given shell on stdout.
pub fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate_completions(gen, cmd, &mut io::stdout());
}

/// Convert our shell enum to clap_complete's.
#[must_use]
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}
