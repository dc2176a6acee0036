//! engine::batch
//!
//! Multi-repository driver.
//!
//! Every job produces exactly one [`SyncReport`], in job order, whatever
//! happens to the others. With more than one worker, jobs are pulled from a
//! shared counter by scoped threads; each thread opens its own repository
//! handle per job, so no handle is ever shared between pipelines.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{info, info_span, warn};

use super::cancel::CancelToken;
use super::pipeline::SyncPipeline;
use super::report::SyncReport;
use super::{SyncError, SyncSettings};
use crate::credentials::CredentialSource;
use crate::git::{Git, GitError, RemoteSetup};

/// One repository to synchronize.
#[derive(Debug, Clone)]
pub struct SyncJob {
    /// Path to an existing working copy.
    pub path: PathBuf,
    /// Settings for this repository (after repo config layering).
    pub settings: SyncSettings,
    /// Register the upstream remote with this URL if it is missing.
    pub upstream_url: Option<String>,
}

/// Synchronize every job and collect one report per job.
///
/// `workers` is clamped to `1..=jobs.len()`.
pub fn sync_all(
    jobs: &[SyncJob],
    credentials: &dyn CredentialSource,
    cancel: &CancelToken,
    workers: usize,
) -> Vec<SyncReport> {
    let workers = workers.clamp(1, jobs.len().max(1));
    if workers == 1 {
        return jobs
            .iter()
            .map(|job| run_job(job, credentials, cancel))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, SyncReport)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::SeqCst);
                        let Some(job) = jobs.get(i) else { break };
                        done.push((i, run_job(job, credentials, cancel)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(done) => done,
                Err(_) => {
                    warn!("sync worker panicked");
                    Vec::new()
                }
            })
            .collect()
    });

    indexed.sort_by_key(|(i, _)| *i);
    let mut reports: Vec<SyncReport> = Vec::with_capacity(jobs.len());
    let mut indexed = indexed.into_iter().peekable();
    for (i, job) in jobs.iter().enumerate() {
        match indexed.next_if(|(j, _)| *j == i) {
            Some((_, report)) => reports.push(report),
            None => reports.push(unreported(job)),
        }
    }
    reports
}

/// Report for a job whose worker died before handing back a result.
fn unreported(job: &SyncJob) -> SyncReport {
    SyncReport::failed(
        job.path.clone(),
        SyncError::Git(GitError::Internal {
            message: "sync worker terminated before reporting".to_string(),
        }),
    )
}

/// Open, provision, and sync one repository.
fn run_job(job: &SyncJob, credentials: &dyn CredentialSource, cancel: &CancelToken) -> SyncReport {
    let span = info_span!("repo", path = %job.path.display());
    let _enter = span.enter();

    if cancel.is_cancelled() {
        return SyncReport::failed(job.path.clone(), SyncError::Cancelled);
    }

    let git = match Git::open(&job.path) {
        Ok(git) => git,
        Err(e) => return SyncReport::failed(job.path.clone(), e.into()),
    };

    if let Some(url) = &job.upstream_url {
        let remote = job.settings.upstream_remote.as_str();
        match git.ensure_remote(remote, url) {
            Ok(RemoteSetup::Added) => info!(remote, url = %url, "registered upstream remote"),
            Ok(RemoteSetup::Existing) => {}
            Ok(RemoteSetup::UrlMismatch { actual }) => warn!(
                remote,
                configured = %url,
                actual = %actual,
                "upstream remote exists with a different URL; leaving it unchanged"
            ),
            Err(e) => return SyncReport::failed(job.path.clone(), e.into()),
        }
    }

    SyncPipeline::new(&job.settings, credentials, cancel.clone()).run(&git, &job.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, RemoteName};
    use crate::engine::Stage;

    #[test]
    fn lost_worker_is_an_internal_failure() {
        let job = SyncJob {
            path: PathBuf::from("/srv/forks/widgets"),
            settings: SyncSettings::new(
                RemoteName::new("origin").unwrap(),
                RemoteName::new("upstream").unwrap(),
                BranchName::new("master").unwrap(),
            ),
            upstream_url: None,
        };

        let report = unreported(&job);
        assert_eq!(report.path, job.path);
        assert_eq!(report.stage, Stage::Start);
        match &report.result {
            Err(e) => assert_eq!(e.kind(), "git_error"),
            Ok(action) => panic!("unexpected success: {action:?}"),
        }
    }
}
