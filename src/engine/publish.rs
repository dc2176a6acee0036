//! engine::publish
//!
//! Push the reconciled branch to the fork's own remote.
//!
//! Credentials come from a [`CredentialSource`] at the moment the remote asks
//! for them. The value handed to libgit2 is owned and dropped when the
//! request is answered; nothing is read from or written to the repository.
//! The push is never forced.

use tracing::debug;

use super::SyncError;
use crate::core::types::{BranchName, RemoteName};
use crate::credentials::CredentialSource;
use crate::git::{Git, GitError};

/// Push `refs/heads/<branch>` to the same ref on `own_remote`.
///
/// # Errors
///
/// - [`SyncError::AuthFailed`] if credentials are missing or rejected
/// - [`SyncError::PushRejected`] if the remote refuses the update
/// - [`SyncError::NetworkFailed`] on transport failures
pub fn publish(
    git: &Git,
    own_remote: &RemoteName,
    branch: &BranchName,
    credentials: &dyn CredentialSource,
) -> Result<(), SyncError> {
    debug!(remote = %own_remote, branch = %branch, "pushing");
    git.push_branch(own_remote.as_str(), branch, credentials)
        .map_err(classify)
}

fn classify(err: GitError) -> SyncError {
    match err {
        GitError::AuthFailed { message } => SyncError::AuthFailed(message),
        GitError::PushRejected { refname, message } => {
            SyncError::PushRejected(format!("{refname}: {message}"))
        }
        GitError::Transport { message } => SyncError::NetworkFailed(message),
        GitError::RemoteNotFound { name } => {
            SyncError::NetworkFailed(format!("remote '{name}' is not configured"))
        }
        other => SyncError::Git(other),
    }
}
