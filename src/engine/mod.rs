//! engine
//!
//! Reconciles a fork's branch with its upstream: Resolve -> Analyze ->
//! Integrate -> Publish.
//!
//! # Architecture
//!
//! Each repository is handled by one [`SyncPipeline`] that exclusively owns
//! its [`Git`](crate::git::Git) handle for the duration of the run:
//!
//! 1. **Resolve** ([`resolve`]): fetch the upstream remote, resolve both tips
//! 2. **Analyze** ([`analyze`]): classify the pair into a [`DivergenceOutcome`]
//! 3. **Integrate** ([`fast_forward`] or [`merge`]): exactly one executor runs
//! 4. **Publish** ([`publish`]): push the branch to the fork's own remote
//!
//! [`batch`] drives many pipelines and never lets one repository's failure
//! stop the rest.
//!
//! # Invariants
//!
//! - The branch pointer moves only after its tree or commit is fully written
//! - Publish runs only after a fast-forward or a clean merge
//! - Every run ends in exactly one terminal state
//! - Cancellation is observed between stages, never inside one
//!
//! # Example
//!
//! ```ignore
//! use forksync::engine::{CancelToken, SyncPipeline, SyncSettings};
//! use forksync::credentials::EnvCredentialSource;
//!
//! let creds = EnvCredentialSource::new("GITHUB_USERNAME", "GITHUB_TOKEN");
//! let pipeline = SyncPipeline::new(&settings, &creds, CancelToken::new());
//! let report = pipeline.run(&git, path);
//! println!("{}", report.summary());
//! ```

pub mod analyze;
pub mod batch;
pub mod cancel;
pub mod fast_forward;
pub mod merge;
pub mod pipeline;
pub mod publish;
pub mod report;
pub mod resolve;

pub use analyze::{analyze, DivergenceOutcome};
pub use batch::{sync_all, SyncJob};
pub use cancel::CancelToken;
pub use fast_forward::fast_forward;
pub use merge::{merge, MergeResult};
pub use pipeline::{Divergence, SyncPipeline};
pub use publish::publish;
pub use report::{ReportView, SyncAction, SyncReport};
pub use resolve::{fetch_and_resolve, resolve_local};

use serde::Serialize;
use thiserror::Error;

use crate::core::config::Config;
use crate::core::types::{BranchName, Oid, RemoteName, TypeError};
use crate::git::{CommitSignature, GitError};

/// Why a sync pipeline stopped.
///
/// Each variant is local to one repository; none of them abort a batch.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the upstream remote failed.
    #[error("fetch from {remote} failed: {message}")]
    FetchFailed {
        /// Remote being fetched
        remote: String,
        /// Underlying cause
        message: String,
    },

    /// A required branch does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The missing ref
        refname: String,
    },

    /// The two tips share no history.
    #[error("cannot reconcile {local} with {upstream}: histories are unrelated")]
    Unsupported {
        /// Local tip
        local: Oid,
        /// Upstream tip
        upstream: Oid,
    },

    /// The working tree could not be updated.
    #[error("checkout failed: {0}")]
    CheckoutFailed(String),

    /// The branch pointer move was refused.
    #[error("ref update failed: {0}")]
    RefUpdateFailed(String),

    /// The merge stopped on conflicts; nothing was committed.
    #[error("merge conflict in {} path(s): {}", paths.len(), paths.join(", "))]
    Conflicted {
        /// Conflicting paths, sorted
        paths: Vec<String>,
    },

    /// The merge could not be carried out.
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// The remote rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The remote refused the branch update.
    #[error("push rejected: {0}")]
    PushRejected(String),

    /// Network or transport failure during push.
    #[error("network failure: {0}")]
    NetworkFailed(String),

    /// A cancellation request was observed between stages.
    #[error("cancelled")]
    Cancelled,

    /// The working copy is not in a state the pipeline can start from.
    #[error("repository not ready: {0}")]
    NotReady(String),

    /// Unexpected repository error.
    #[error("git error: {0}")]
    Git(#[from] GitError),
}

impl SyncError {
    /// Stable snake_case label for reports and logs.
    ///
    /// # Example
    ///
    /// ```
    /// use forksync::engine::SyncError;
    ///
    /// assert_eq!(SyncError::Cancelled.kind(), "cancelled");
    /// ```
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::FetchFailed { .. } => "fetch_failed",
            SyncError::RefNotFound { .. } => "ref_not_found",
            SyncError::Unsupported { .. } => "unsupported",
            SyncError::CheckoutFailed(_) => "checkout_failed",
            SyncError::RefUpdateFailed(_) => "ref_update_failed",
            SyncError::Conflicted { .. } => "conflicted",
            SyncError::MergeFailed(_) => "merge_failed",
            SyncError::AuthFailed(_) => "auth_failed",
            SyncError::PushRejected(_) => "push_rejected",
            SyncError::NetworkFailed(_) => "network_failed",
            SyncError::Cancelled => "cancelled",
            SyncError::NotReady(_) => "not_ready",
            SyncError::Git(_) => "git_error",
        }
    }
}

/// Pipeline position. A report records the last stage reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing done yet.
    Start,
    /// Upstream fetched and resolved.
    Fetched,
    /// Divergence classified.
    Analyzed,
    /// Fast-forward or merge applied locally.
    Executed,
    /// Branch pushed to the own remote.
    Published,
    /// Terminal success.
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Start => "start",
            Stage::Fetched => "fetched",
            Stage::Analyzed => "analyzed",
            Stage::Executed => "executed",
            Stage::Published => "published",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Parameters fixed at pipeline construction.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// The fork's own remote (pushed to).
    pub own_remote: RemoteName,
    /// The upstream remote (fetched from).
    pub upstream_remote: RemoteName,
    /// Branch reconciled on both sides.
    pub branch: BranchName,
    /// Merge commit identity.
    pub signature: CommitSignature,
    /// Merge message template; `{remote}` and `{branch}` are substituted.
    pub merge_message: String,
    /// Leave a conflicted merge in the working tree instead of aborting it.
    pub keep_conflicts: bool,
}

impl SyncSettings {
    /// Settings with the given names and default policies.
    pub fn new(own_remote: RemoteName, upstream_remote: RemoteName, branch: BranchName) -> Self {
        Self {
            own_remote,
            upstream_remote,
            branch,
            signature: CommitSignature::default(),
            merge_message: crate::core::config::DEFAULT_MERGE_MESSAGE.to_string(),
            keep_conflicts: false,
        }
    }

    /// Build settings from a (possibly repo-layered) configuration.
    pub fn from_config(config: &Config) -> Result<Self, TypeError> {
        let signature = config.signature();
        Ok(Self {
            own_remote: RemoteName::new(config.own_remote())?,
            upstream_remote: RemoteName::new(config.upstream_remote())?,
            branch: BranchName::new(config.branch())?,
            signature: CommitSignature {
                name: signature.name,
                email: signature.email,
                time: signature.timestamp,
            },
            merge_message: config.merge_message().to_string(),
            keep_conflicts: config.keep_conflicts(),
        })
    }

    /// The merge commit message for this branch.
    pub fn render_merge_message(&self) -> String {
        self.merge_message
            .replace("{remote}", self.upstream_remote.as_str())
            .replace("{branch}", self.branch.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SyncSettings {
        SyncSettings::new(
            RemoteName::new("origin").unwrap(),
            RemoteName::new("upstream").unwrap(),
            BranchName::new("master").unwrap(),
        )
    }

    mod sync_error {
        use super::*;

        #[test]
        fn conflicted_lists_paths() {
            let err = SyncError::Conflicted {
                paths: vec!["a.txt".into(), "b/c.txt".into()],
            };
            let text = err.to_string();
            assert!(text.contains("2 path(s)"));
            assert!(text.contains("a.txt, b/c.txt"));
        }

        #[test]
        fn kinds_are_distinct() {
            let kinds = [
                SyncError::CheckoutFailed(String::new()).kind(),
                SyncError::RefUpdateFailed(String::new()).kind(),
                SyncError::MergeFailed(String::new()).kind(),
                SyncError::AuthFailed(String::new()).kind(),
                SyncError::PushRejected(String::new()).kind(),
                SyncError::NetworkFailed(String::new()).kind(),
                SyncError::NotReady(String::new()).kind(),
                SyncError::Cancelled.kind(),
            ];
            let mut sorted = kinds.to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), kinds.len());
        }

        #[test]
        fn git_error_converts() {
            let err: SyncError = GitError::BareRepo.into();
            assert_eq!(err.kind(), "git_error");
        }
    }

    mod stage {
        use super::*;

        #[test]
        fn ordered_along_pipeline() {
            assert!(Stage::Start < Stage::Fetched);
            assert!(Stage::Executed < Stage::Published);
            assert!(Stage::Published < Stage::Done);
        }

        #[test]
        fn serializes_snake_case() {
            assert_eq!(serde_json::to_string(&Stage::Published).unwrap(), "\"published\"");
        }
    }

    mod sync_settings {
        use super::*;

        #[test]
        fn default_message_rendering() {
            assert_eq!(
                settings().render_merge_message(),
                "Merge upstream/master into master"
            );
        }

        #[test]
        fn custom_template() {
            let mut s = settings();
            s.merge_message = "sync {branch} from {remote}".into();
            assert_eq!(s.render_merge_message(), "sync master from upstream");
        }

        #[test]
        fn from_default_config() {
            let s = SyncSettings::from_config(&Config::default()).unwrap();
            assert_eq!(s.own_remote.as_str(), "origin");
            assert_eq!(s.upstream_remote.as_str(), "upstream");
            assert_eq!(s.branch.as_str(), "master");
            assert!(!s.keep_conflicts);
            assert_eq!(s.signature, CommitSignature::default());
        }
    }
}
