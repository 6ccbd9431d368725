//! forge
//!
//! Abstraction over the remote hosting API.
//!
//! # Architecture
//!
//! The `Forge` trait exposes the Git data primitives (blob, tree, commit,
//! reference) plus the handful of reads and pull request calls the harness
//! needs. The remote builder and reader are written against `&dyn Forge`,
//! so the same code runs against GitHub and against the in-memory mock.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing

pub mod github;
pub mod mock;
mod traits;

pub use traits::*;
