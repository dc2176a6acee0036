//! engine::fast_forward
//!
//! Advance the branch to the upstream tip without creating a commit.
//!
//! The working tree moves first and the branch pointer second. If the
//! pointer move is refused, the tree is put back so the caller never observes
//! a tree that disagrees with the branch.

use tracing::{debug, warn};

use super::SyncError;
use crate::core::types::{BranchName, Oid, RefName};
use crate::git::{Git, GitError};

/// Fast-forward `branch` from `local` to `upstream`.
///
/// HEAD follows because it is a symbolic ref to `branch`.
///
/// # Errors
///
/// - [`SyncError::CheckoutFailed`] if local changes would be overwritten
/// - [`SyncError::RefUpdateFailed`] if the branch moved since it was read;
///   nothing is touched when that is seen before the checkout
pub fn fast_forward(
    git: &Git,
    branch: &BranchName,
    local: &Oid,
    upstream: &Oid,
) -> Result<Oid, SyncError> {
    let refname = RefName::for_branch(branch);
    let current = git.resolve_ref(refname.as_str())?;
    if &current != local {
        return Err(SyncError::RefUpdateFailed(format!(
            "{refname} moved to {} (expected {})",
            current.short(12),
            local.short(12)
        )));
    }

    git.checkout_commit_tree(upstream).map_err(|e| match e {
        GitError::CheckoutConflict { message } => SyncError::CheckoutFailed(message),
        other => SyncError::CheckoutFailed(other.to_string()),
    })?;
    debug!(oid = %upstream.short(8), "working tree updated");

    let message = format!("forksync: fast-forward to {}", upstream.short(12));
    if let Err(e) = git.update_ref_cas(refname.as_str(), upstream, local, &message) {
        warn!(refname = %refname, error = %e, "ref update refused, restoring working tree");
        // Put the tree back at whatever the branch holds now.
        let restored = git
            .resolve_ref(refname.as_str())
            .and_then(|tip| git.restore_paths(upstream, &tip));
        if let Err(restore) = restored {
            warn!(error = %restore, "failed to restore working tree");
        }
        return Err(SyncError::RefUpdateFailed(e.to_string()));
    }

    Ok(upstream.clone())
}
