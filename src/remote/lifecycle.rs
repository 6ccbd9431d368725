//! remote::lifecycle
//!
//! Ephemeral references.
//!
//! An ephemeral reference is a uniquely named branch (`<base>-<uuid>`)
//! that lives for one test. Two forms exist:
//!
//! - [`create_temporary_reference`] hands back a [`TemporaryReference`]
//!   the caller releases explicitly with [`TemporaryReference::delete`].
//! - [`with_temporary_reference`] runs an action and always deletes the
//!   reference afterwards, whether the action succeeded or not.
//!
//! # Example
//!
//! ```ignore
//! let tip = with_temporary_reference(&forge, &base, &sha, |name| async move {
//!     forge.fetch_reference_sha(&name).await
//! })
//! .await?;
//! ```

use std::future::Future;

use crate::core::naming::generate_unique_ref;
use crate::core::types::{BranchName, Sha};
use crate::forge::{Forge, ForgeError};

/// A created ephemeral reference and the capability to delete it.
#[must_use = "a temporary reference stays on the remote until deleted"]
pub struct TemporaryReference<'a> {
    forge: &'a dyn Forge,
    name: BranchName,
}

impl std::fmt::Debug for TemporaryReference<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryReference")
            .field("forge", &self.forge.name())
            .field("name", &self.name)
            .finish()
    }
}

impl<'a> TemporaryReference<'a> {
    /// Create `<base>-<uuid>` pointing at `sha`.
    pub async fn create(
        forge: &'a dyn Forge,
        base: &BranchName,
        sha: &Sha,
    ) -> Result<Self, ForgeError> {
        let name = generate_unique_ref(base);
        forge.create_reference(&name, sha).await?;
        tracing::debug!(reference = %name, %sha, "created temporary reference");
        Ok(Self { forge, name })
    }

    /// The generated reference name.
    pub fn name(&self) -> &BranchName {
        &self.name
    }

    /// Give up the delete capability, keeping the reference on the remote.
    pub fn into_name(self) -> BranchName {
        self.name
    }

    /// Delete the reference from the remote.
    pub async fn delete(self) -> Result<(), ForgeError> {
        self.forge.delete_reference(&self.name).await?;
        tracing::debug!(reference = %self.name, "deleted temporary reference");
        Ok(())
    }
}

/// Create an ephemeral reference the caller must release.
pub async fn create_temporary_reference<'a>(
    forge: &'a dyn Forge,
    base: &BranchName,
    sha: &Sha,
) -> Result<TemporaryReference<'a>, ForgeError> {
    TemporaryReference::create(forge, base, sha).await
}

/// Run `action` with an ephemeral reference that is deleted afterwards.
///
/// The reference is deleted after `action` returns, on success and on
/// error. When both the action and the deletion fail, the action's error
/// is returned and the deletion error is logged. When only the deletion
/// fails, its error is returned.
pub async fn with_temporary_reference<F, Fut, T, E>(
    forge: &dyn Forge,
    base: &BranchName,
    sha: &Sha,
    action: F,
) -> Result<T, E>
where
    F: FnOnce(BranchName) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ForgeError>,
{
    let temporary = TemporaryReference::create(forge, base, sha).await?;
    let name = temporary.name().clone();

    let outcome = action(name.clone()).await;
    let cleanup = temporary.delete().await;

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err.into()),
        (Err(action_err), Ok(())) => Err(action_err),
        (Err(action_err), Err(cleanup_err)) => {
            tracing::warn!(
                reference = %name,
                error = %cleanup_err,
                "failed to delete temporary reference after action failure"
            );
            Err(action_err)
        }
    }
}
