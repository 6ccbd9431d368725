//! repostate - Differential git fixtures for GitHub API tooling
//!
//! repostate takes an abstract description of a repository (a root commit
//! and linear histories per branch, each commit being a list of lines in a
//! single tracked file plus a message) and realizes it twice: once through
//! the GitHub Git data API (blobs, trees, commits, references), once by
//! driving the `git` executable in a temporary working tree. Both can be
//! read back into the same abstract shape, so tools that rewrite history
//! through the API can be checked against what native git would produce.
//!
//! # Architecture
//!
//! - [`core`] - Domain types, the abstract state model, naming, configuration
//! - [`forge`] - The hosting API seam: `Forge` trait, GitHub client, in-memory mock
//! - [`remote`] - Build a state through a `Forge` and read it back
//! - [`local`] - Build a state with `git` and read it back
//! - [`cli`] - Command-line interface layer
//!
//! # Invariants
//!
//! 1. Readers return a branch's full history, oldest first, root included
//! 2. Every remote branch gets a fresh, uniquely named reference
//! 3. Commits within a branch are created strictly in order
//! 4. The local working tree is never used by two operations at once

pub mod cli;
pub mod core;
pub mod forge;
pub mod local;
pub mod remote;
