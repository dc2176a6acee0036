//! engine::merge
//!
//! Three-way merge of the upstream tip into the local branch.
//!
//! # Contract
//!
//! - A clean merge produces one commit with parents `[local, upstream]`, in
//!   that order, and the branch moves only as part of creating that commit.
//! - Conflicts are reported with their paths and nothing is committed. The
//!   index and working tree keep the conflict markers; what happens to them
//!   next is up to the caller.
//! - No side is ever preferred to resolve a conflict.

use serde::Serialize;
use tracing::{debug, info};

use super::SyncSettings;
use crate::core::types::Oid;
use crate::git::Git;

/// Result of a merge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum MergeResult {
    /// Merge commit created.
    Clean(Oid),
    /// Conflicting paths, sorted; no commit created.
    Conflicted(Vec<String>),
    /// The merge could not be carried out.
    Failed(String),
}

impl MergeResult {
    /// The merge commit, if the merge was clean.
    pub fn commit(&self) -> Option<&Oid> {
        match self {
            MergeResult::Clean(oid) => Some(oid),
            _ => None,
        }
    }
}

/// Merge `upstream` into HEAD (which must be at `local`).
///
/// Never returns an error: every failure is folded into
/// [`MergeResult::Failed`] so the outcome can be reported as-is.
pub fn merge(git: &Git, settings: &SyncSettings, local: &Oid, upstream: &Oid) -> MergeResult {
    if let Err(e) = git.merge_into_head(upstream) {
        return MergeResult::Failed(e.to_string());
    }

    let conflicts = match git.conflicted_paths() {
        Ok(paths) => paths,
        Err(e) => return MergeResult::Failed(e.to_string()),
    };
    if !conflicts.is_empty() {
        info!(count = conflicts.len(), "merge stopped on conflicts");
        return MergeResult::Conflicted(conflicts);
    }

    let tree = match git.write_index_tree() {
        Ok(tree) => tree,
        Err(e) => return MergeResult::Failed(e.to_string()),
    };
    debug!(tree = %tree.short(8), "merged tree written");

    let message = settings.render_merge_message();
    let parents = [local, upstream];
    let commit = match git.commit_on_head(&tree, &parents, &message, &settings.signature) {
        Ok(oid) => oid,
        Err(e) => return MergeResult::Failed(e.to_string()),
    };

    // MERGE_HEAD and friends are obsolete once the commit exists.
    if let Err(e) = git.cleanup_state() {
        return MergeResult::Failed(e.to_string());
    }

    MergeResult::Clean(commit)
}
