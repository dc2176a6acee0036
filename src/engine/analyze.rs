//! engine::analyze
//!
//! Divergence classification.
//!
//! # Algorithm
//!
//! Given the local tip `L` and upstream tip `U`:
//!
//! | Condition                          | Outcome               |
//! |------------------------------------|-----------------------|
//! | `L == U` or `U` is an ancestor of `L` | `UpToDate`         |
//! | `L` is an ancestor of `U`          | `FastForwardable`     |
//! | merge base exists                  | `DivergedNeedsMerge`  |
//! | no merge base                      | `Unsupported`         |
//!
//! The rows are checked top to bottom, so the outcomes are mutually
//! exclusive.

use serde::Serialize;
use tracing::debug;

use super::SyncError;
use crate::core::types::Oid;
use crate::git::Git;

/// Relationship between the local tip and the upstream tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DivergenceOutcome {
    /// Upstream is already contained in local history.
    UpToDate,
    /// Local has no commits of its own; moving the pointer suffices.
    FastForwardable,
    /// Both sides have novel commits.
    DivergedNeedsMerge {
        /// Common ancestor used as merge base
        base: Oid,
    },
    /// Histories cannot be related (no common ancestor).
    Unsupported,
}

impl DivergenceOutcome {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            DivergenceOutcome::UpToDate => "up-to-date",
            DivergenceOutcome::FastForwardable => "fast-forwardable",
            DivergenceOutcome::DivergedNeedsMerge { .. } => "diverged",
            DivergenceOutcome::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for DivergenceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `local` against `upstream` using commit-graph ancestry.
///
/// # Errors
///
/// Only repository read failures; every graph shape maps to an outcome.
pub fn analyze(git: &Git, local: &Oid, upstream: &Oid) -> Result<DivergenceOutcome, SyncError> {
    let outcome = if git.is_ancestor(upstream, local)? {
        DivergenceOutcome::UpToDate
    } else if git.is_ancestor(local, upstream)? {
        DivergenceOutcome::FastForwardable
    } else {
        match git.merge_base(local, upstream)? {
            Some(base) => DivergenceOutcome::DivergedNeedsMerge { base },
            None => DivergenceOutcome::Unsupported,
        }
    };

    debug!(
        local = %local.short(8),
        upstream = %upstream.short(8),
        outcome = %outcome,
        "analyzed divergence"
    );
    Ok(outcome)
}
