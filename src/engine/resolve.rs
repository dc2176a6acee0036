//! engine::resolve
//!
//! Branch tip resolution.
//!
//! The upstream tip is only trusted after a fresh fetch: the remote-tracking
//! ref is refreshed first, then read. A fetch failure of any kind (missing
//! remote, rejected credentials, unreachable host, malformed URL) is reported
//! as [`SyncError::FetchFailed`] so callers see a single category for "could
//! not talk to upstream".

use tracing::debug;

use super::SyncError;
use crate::core::types::{BranchName, Oid, RefName, RemoteName};
use crate::credentials::CredentialSource;
use crate::git::{Git, GitError};

/// Fetch `remote`, then resolve `refs/remotes/<remote>/<branch>`.
///
/// # Errors
///
/// - [`SyncError::FetchFailed`] if the fetch fails
/// - [`SyncError::RefNotFound`] if the branch does not exist on the remote
pub fn fetch_and_resolve(
    git: &Git,
    remote: &RemoteName,
    branch: &BranchName,
    credentials: &dyn CredentialSource,
) -> Result<Oid, SyncError> {
    debug!(remote = %remote, "fetching");
    git.fetch(remote.as_str(), credentials)
        .map_err(|e| SyncError::FetchFailed {
            remote: remote.to_string(),
            message: e.to_string(),
        })?;

    let tracking = RefName::for_remote_branch(remote, branch);
    let oid = resolve(git, &tracking)?;
    debug!(refname = %tracking, oid = %oid.short(8), "resolved upstream tip");
    Ok(oid)
}

/// Resolve the local branch `refs/heads/<branch>`.
///
/// # Errors
///
/// - [`SyncError::RefNotFound`] if the branch does not exist
pub fn resolve_local(git: &Git, branch: &BranchName) -> Result<Oid, SyncError> {
    resolve(git, &RefName::for_branch(branch))
}

fn resolve(git: &Git, refname: &RefName) -> Result<Oid, SyncError> {
    git.resolve_ref(refname.as_str()).map_err(|e| match e {
        GitError::RefNotFound { refname } => SyncError::RefNotFound { refname },
        other => SyncError::Git(other),
    })
}
