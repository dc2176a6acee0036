//! engine::pipeline
//!
//! The per-repository sync state machine.
//!
//! ```text
//! Start -> Fetched -> Analyzed -> Executed -> Published -> Done
//!   \         \           \           \
//!    +---------+-----------+-----------+----> Failed(reason)
//! ```
//!
//! `UpToDate` goes straight from `Analyzed` to `Done`. Cancellation is
//! checked before each transition.
//!
//! # Partial state
//!
//! The local branch update and the push are not transactional. When the
//! push fails, the branch has already moved locally and stays there; the
//! report's stage (`Executed`) tells the caller so.

use std::path::Path;

use tracing::{debug, info, warn};

use super::analyze::{analyze, DivergenceOutcome};
use super::cancel::CancelToken;
use super::fast_forward::fast_forward;
use super::merge::{merge, MergeResult};
use super::publish::publish;
use super::report::{SyncAction, SyncReport};
use super::resolve::{fetch_and_resolve, resolve_local};
use super::{Stage, SyncError, SyncSettings};
use crate::core::types::Oid;
use crate::credentials::CredentialSource;
use crate::git::{Git, GitState};

/// Tips and classification observed by [`SyncPipeline::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// Local branch tip
    pub local: Oid,
    /// Upstream tracking tip (freshly fetched)
    pub upstream: Oid,
    /// Classification of the pair
    pub outcome: DivergenceOutcome,
}

/// One sync run over one repository.
///
/// Holds no repository state itself; [`SyncPipeline::run`] borrows the
/// handle for exactly one run.
pub struct SyncPipeline<'a> {
    settings: &'a SyncSettings,
    credentials: &'a dyn CredentialSource,
    cancel: CancelToken,
}

impl<'a> SyncPipeline<'a> {
    /// Create a pipeline.
    pub fn new(
        settings: &'a SyncSettings,
        credentials: &'a dyn CredentialSource,
        cancel: CancelToken,
    ) -> Self {
        Self {
            settings,
            credentials,
            cancel,
        }
    }

    /// Run to a terminal state.
    ///
    /// Never panics on repository errors: every failure ends up in the
    /// report's `result`.
    pub fn run(&self, git: &Git, path: &Path) -> SyncReport {
        let mut report = SyncReport {
            path: path.to_path_buf(),
            stage: Stage::Start,
            outcome: None,
            merge: None,
            result: Ok(SyncAction::Skipped),
        };

        report.result = self.drive(git, &mut report);

        match &report.result {
            Ok(action) => info!(path = %path.display(), ?action, "sync done"),
            Err(e) => warn!(
                path = %path.display(),
                stage = %report.stage,
                kind = e.kind(),
                error = %e,
                "sync failed"
            ),
        }
        report
    }

    /// Fetch and classify without touching the branch or working tree.
    pub fn inspect(&self, git: &Git) -> Result<Divergence, SyncError> {
        let local = resolve_local(git, &self.settings.branch)?;
        let upstream = fetch_and_resolve(
            git,
            &self.settings.upstream_remote,
            &self.settings.branch,
            self.credentials,
        )?;
        let outcome = analyze(git, &local, &upstream)?;
        Ok(Divergence {
            local,
            upstream,
            outcome,
        })
    }

    fn drive(&self, git: &Git, report: &mut SyncReport) -> Result<SyncAction, SyncError> {
        let settings = self.settings;

        // Start -> Fetched
        self.checkpoint()?;
        self.check_ready(git)?;
        let local = resolve_local(git, &settings.branch)?;
        let upstream = fetch_and_resolve(
            git,
            &settings.upstream_remote,
            &settings.branch,
            self.credentials,
        )?;
        report.stage = Stage::Fetched;
        debug!(stage = %report.stage, "transition");

        // Fetched -> Analyzed
        self.checkpoint()?;
        let outcome = analyze(git, &local, &upstream)?;
        report.outcome = Some(outcome.clone());
        report.stage = Stage::Analyzed;
        debug!(stage = %report.stage, outcome = %outcome, "transition");

        // Analyzed -> Executed
        let action = match outcome {
            DivergenceOutcome::UpToDate => {
                info!(branch = %settings.branch, "already up to date, skipping");
                report.stage = Stage::Done;
                return Ok(SyncAction::Skipped);
            }
            DivergenceOutcome::FastForwardable => {
                self.checkpoint()?;
                let to = fast_forward(git, &settings.branch, &local, &upstream)?;
                info!(to = %to.short(8), "fast-forwarded");
                SyncAction::FastForwarded { to }
            }
            DivergenceOutcome::DivergedNeedsMerge { ref base } => {
                self.checkpoint()?;
                debug!(base = %base.short(8), "merging");
                let result = merge(git, settings, &local, &upstream);
                report.merge = Some(result.clone());
                match result {
                    MergeResult::Clean(commit) => {
                        info!(commit = %commit.short(8), "merge committed");
                        SyncAction::Merged { commit }
                    }
                    MergeResult::Conflicted(paths) => {
                        self.after_conflict(git, &upstream);
                        return Err(SyncError::Conflicted { paths });
                    }
                    MergeResult::Failed(cause) => {
                        self.after_failed_merge(git, &upstream);
                        return Err(SyncError::MergeFailed(cause));
                    }
                }
            }
            DivergenceOutcome::Unsupported => {
                return Err(SyncError::Unsupported { local, upstream });
            }
        };
        report.stage = Stage::Executed;
        debug!(stage = %report.stage, "transition");

        // Executed -> Published -> Done
        self.checkpoint()?;
        publish(
            git,
            &settings.own_remote,
            &settings.branch,
            self.credentials,
        )?;
        report.stage = Stage::Published;
        debug!(stage = %report.stage, "transition");

        report.stage = Stage::Done;
        Ok(action)
    }

    fn checkpoint(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    /// HEAD must be on the configured branch with no operation in progress.
    fn check_ready(&self, git: &Git) -> Result<(), SyncError> {
        let state = git.state();
        if state.is_in_progress() {
            return Err(SyncError::NotReady(format!("a {state} is in progress")));
        }

        match git.current_branch()? {
            Some(current) if current == self.settings.branch => Ok(()),
            Some(current) => Err(SyncError::NotReady(format!(
                "HEAD is on '{}', expected '{}'",
                current, self.settings.branch
            ))),
            None => Err(SyncError::NotReady(
                "HEAD is detached or unborn".to_string(),
            )),
        }
    }

    /// A merge that got as far as the index is backed out; one refused
    /// before touching the tree leaves nothing behind.
    fn after_failed_merge(&self, git: &Git, upstream: &Oid) {
        if git.state() != GitState::Merge {
            return;
        }
        match git.abort_merge(upstream) {
            Ok(()) => debug!("failed merge aborted"),
            Err(e) => warn!(error = %e, "failed to abort merge"),
        }
    }

    fn after_conflict(&self, git: &Git, upstream: &Oid) {
        if self.settings.keep_conflicts {
            warn!("conflict markers left in the working tree for inspection");
            return;
        }
        match git.abort_merge(upstream) {
            Ok(()) => debug!("conflicted merge aborted"),
            Err(e) => warn!(error = %e, "failed to abort conflicted merge"),
        }
    }
}
