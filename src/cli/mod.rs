//! cli
//!
//! Command-line interface layer for repostate.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the log subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers load fixtures and configuration, call
//! into [`crate::local`] and [`crate::remote`], and format the results.
//! Logs go to stderr so stdout stays parseable under `--json`.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    pub debug: bool,
    pub quiet: bool,
    pub json: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };
    init_logging(&ctx);

    commands::dispatch(cli.command, &ctx)
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` for this crate under `--debug`.
fn init_logging(ctx: &Context) {
    let default = if ctx.debug { "repostate=debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
