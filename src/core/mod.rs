//! core
//!
//! Domain types, the abstract repository model, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, RefName, Sha
//! - [`naming`] - Reference paths and ephemeral branch names
//! - [`state`] - Commit, ReferenceState, RepoState and content encoding
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Fixtures are validated once, before anything is realized
//! - Nothing here performs I/O except fixture and config loading

pub mod config;
pub mod naming;
pub mod state;
pub mod types;
