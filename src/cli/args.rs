//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output (mismatches from `compare` are still shown)
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repostate - Build the same repository through the GitHub API and through git, then compare
#[derive(Parser, Debug)]
#[command(name = "repostate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; `compare` still prints mismatched branches
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a fixture in a local git repository
    #[command(
        name = "local",
        long_about = "Build a fixture in a fresh local git repository.\n\n\
            The fixture's initial commit lands on master, every other branch starts \
            from it, and each branch's commits are added on top. Prints each branch's \
            commit ids, oldest first.",
        after_help = "\
EXAMPLES:
    # Build and inspect, then discard
    repostate local fixtures/two_branches.toml

    # Keep the repository around for a closer look
    repostate local fixtures/two_branches.toml --keep"
    )]
    Local {
        /// Fixture file (TOML, or JSON with a .json extension)
        fixture: PathBuf,

        /// Keep the temporary repository and print its path
        #[arg(long)]
        keep: bool,
    },

    /// Build a fixture on GitHub
    #[command(
        name = "remote",
        long_about = "Build a fixture on GitHub through the Git data API.\n\n\
            Each branch is created under a unique name (<branch>-<uuid>). The \
            references are deleted again once printed unless --keep is given.",
        after_help = "\
EXAMPLES:
    REPOSTATE_GITHUB_OWNER=me REPOSTATE_GITHUB_REPO=sandbox \\
        repostate remote fixtures/two_branches.toml"
    )]
    Remote {
        /// Fixture file (TOML, or JSON with a .json extension)
        fixture: PathBuf,

        /// Leave the created references on GitHub
        #[arg(long)]
        keep: bool,
    },

    /// Read a branch's history from GitHub
    #[command(name = "read")]
    Read {
        /// Branch name, or commit SHA with --sha
        target: String,

        /// Treat the target as a commit SHA
        #[arg(long)]
        sha: bool,
    },

    /// List a pull request's commits
    #[command(name = "pr-commits")]
    PrCommits {
        /// Pull request number
        number: u64,
    },

    /// Build a fixture both ways and compare the read-back histories
    #[command(
        name = "compare",
        long_about = "Build a fixture on GitHub and in a local repository, read every \
            branch back from both, and compare them commit by commit.\n\n\
            The GitHub references are always deleted afterwards. Exits non-zero if any \
            branch differs."
    )]
    Compare {
        /// Fixture file (TOML, or JSON with a .json extension)
        fixture: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    repostate completion bash > ~/.local/share/bash-completion/completions/repostate
    repostate completion zsh > ~/.zfunc/_repostate"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
