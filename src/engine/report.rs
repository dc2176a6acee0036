//! engine::report
//!
//! Per-repository terminal outcome.

use std::path::PathBuf;

use serde::Serialize;

use super::{DivergenceOutcome, MergeResult, Stage, SyncError};
use crate::core::types::Oid;

/// What a successful pipeline did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Already up to date; nothing executed, nothing pushed.
    Skipped,
    /// Branch fast-forwarded and pushed.
    FastForwarded {
        /// New branch tip
        to: Oid,
    },
    /// Merge commit created and pushed.
    Merged {
        /// The merge commit
        commit: Oid,
    },
}

/// Everything a caller learns about one repository's run.
#[derive(Debug)]
pub struct SyncReport {
    /// Working copy path.
    pub path: PathBuf,
    /// Last stage reached.
    pub stage: Stage,
    /// Divergence classification, if analysis ran.
    pub outcome: Option<DivergenceOutcome>,
    /// Merge result, if the merge executor ran.
    pub merge: Option<MergeResult>,
    /// Terminal state: `Ok` is `Done`, `Err` is `Failed(reason)`.
    pub result: Result<SyncAction, SyncError>,
}

impl SyncReport {
    /// A report that failed before any stage completed.
    pub fn failed(path: PathBuf, error: SyncError) -> Self {
        Self {
            path,
            stage: Stage::Start,
            outcome: None,
            merge: None,
            result: Err(error),
        }
    }

    /// Whether the pipeline reached `Done`.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// One-line description.
    pub fn summary(&self) -> String {
        match &self.result {
            Ok(SyncAction::Skipped) => "up to date".to_string(),
            Ok(SyncAction::FastForwarded { to }) => {
                format!("fast-forwarded to {} and pushed", to.short(7))
            }
            Ok(SyncAction::Merged { commit }) => {
                format!("merged as {} and pushed", commit.short(7))
            }
            Err(e) => format!("failed after {}: {}", self.stage, e),
        }
    }

    /// Serializable snapshot of this report.
    pub fn view(&self) -> ReportView<'_> {
        let (status, action, error) = match &self.result {
            Ok(action) => ("done", Some(action), None),
            Err(e) => (
                "failed",
                None,
                Some(ErrorView {
                    kind: e.kind(),
                    message: e.to_string(),
                    conflicts: match e {
                        SyncError::Conflicted { paths } => paths.as_slice(),
                        _ => &[],
                    },
                }),
            ),
        };

        ReportView {
            path: &self.path,
            status,
            stage: self.stage,
            outcome: self.outcome.as_ref(),
            merge: self.merge.as_ref(),
            action,
            error,
        }
    }
}

/// JSON shape of a [`SyncReport`].
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    path: &'a std::path::Path,
    status: &'static str,
    stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<&'a DivergenceOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge: Option<&'a MergeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a SyncAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorView<'a>>,
}

#[derive(Debug, Serialize)]
struct ErrorView<'a> {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "no_conflicts")]
    conflicts: &'a [String],
}

fn no_conflicts(paths: &&[String]) -> bool {
    paths.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn summary_for_each_action() {
        let mut report = SyncReport {
            path: PathBuf::from("/r"),
            stage: Stage::Done,
            outcome: Some(DivergenceOutcome::UpToDate),
            merge: None,
            result: Ok(SyncAction::Skipped),
        };
        assert_eq!(report.summary(), "up to date");

        report.result = Ok(SyncAction::FastForwarded { to: oid('c') });
        assert_eq!(report.summary(), "fast-forwarded to ccccccc and pushed");

        report.result = Ok(SyncAction::Merged { commit: oid('d') });
        assert!(report.summary().starts_with("merged as ddddddd"));
    }

    #[test]
    fn failed_summary_names_stage() {
        let mut report = SyncReport::failed(PathBuf::from("/r"), SyncError::Cancelled);
        report.stage = Stage::Fetched;
        assert_eq!(report.summary(), "failed after fetched: cancelled");
        assert!(!report.is_success());
    }

    #[test]
    fn view_of_conflict() {
        let report = SyncReport {
            path: PathBuf::from("/r"),
            stage: Stage::Analyzed,
            outcome: Some(DivergenceOutcome::DivergedNeedsMerge { base: oid('a') }),
            merge: Some(MergeResult::Conflicted(vec!["f.txt".into()])),
            result: Err(SyncError::Conflicted {
                paths: vec!["f.txt".into()],
            }),
        };

        let json = serde_json::to_value(report.view()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "analyzed");
        assert_eq!(json["error"]["kind"], "conflicted");
        assert_eq!(json["error"]["conflicts"][0], "f.txt");
        assert!(json.get("action").is_none());
    }

    #[test]
    fn view_of_success() {
        let report = SyncReport {
            path: PathBuf::from("/r"),
            stage: Stage::Done,
            outcome: Some(DivergenceOutcome::FastForwardable),
            merge: None,
            result: Ok(SyncAction::FastForwarded { to: oid('e') }),
        };

        let json = serde_json::to_value(report.view()).unwrap();
        assert_eq!(json["status"], "done");
        assert_eq!(json["action"]["action"], "fast_forwarded");
        assert!(json.get("error").is_none());
        assert!(json.get("merge").is_none());
    }
}
