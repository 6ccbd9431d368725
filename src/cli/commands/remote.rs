//! cli::commands::remote
//!
//! Build a fixture on GitHub and print where each branch landed.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{block_on, github_forge, load_fixture, print_json};
use crate::cli::Context;
use crate::remote::create_references;

/// Build `fixture` remotely; delete the references afterwards unless `keep`.
pub fn remote(ctx: &Context, fixture: &Path, keep: bool) -> Result<()> {
    let state = load_fixture(fixture)?;
    let forge = github_forge()?;

    block_on(async {
        let repo = create_references(&forge, &state)
            .await
            .context("Failed to build remote state")?;

        if ctx.json {
            print_json(repo.refs_details())?;
        } else if !ctx.quiet {
            for (branch, details) in repo.refs_details() {
                println!("{branch} -> {}", details.reference);
                for sha in &details.shas {
                    println!("    {sha}");
                }
            }
        }

        if keep {
            return Ok(());
        }
        repo.delete_references()
            .await
            .context("Failed to delete remote references")
    })?
}
