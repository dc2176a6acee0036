//! status command - Report divergence without changing anything

use anyhow::{bail, Result};
use serde_json::json;

use super::{credential_source, plan_jobs};
use crate::cli::args::RepoArgs;
use crate::cli::Context;
use crate::engine::{CancelToken, Divergence, SyncError, SyncPipeline};
use crate::git::Git;
use crate::ui::output;

/// Fetch upstream for every selected repository and classify it.
///
/// The upstream remote is never registered here; a missing remote is
/// reported as a fetch failure.
pub fn status(ctx: &Context, repos: &RepoArgs, json: bool) -> Result<()> {
    let plan = plan_jobs(ctx, repos, false)?;
    let credentials = credential_source(&plan.config);

    let mut rows = Vec::with_capacity(plan.jobs.len());
    let mut failed = 0;
    for job in &plan.jobs {
        let result = Git::open(&job.path)
            .map_err(SyncError::from)
            .and_then(|git| {
                SyncPipeline::new(&job.settings, &credentials, CancelToken::new()).inspect(&git)
            });
        if result.is_err() {
            failed += 1;
        }

        if json {
            rows.push(match &result {
                Ok(d) => json!({
                    "path": job.path,
                    "branch": job.settings.branch,
                    "local": d.local,
                    "upstream": d.upstream,
                    "divergence": d.outcome,
                }),
                Err(e) => json!({
                    "path": job.path,
                    "branch": job.settings.branch,
                    "error": { "kind": e.kind(), "message": e.to_string() },
                }),
            });
        } else {
            output::print(
                format_status(&job.path.display().to_string(), &result),
                ctx.verbosity,
            );
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }

    if failed > 0 {
        bail!("{} of {} repositories could not be inspected", failed, plan.jobs.len());
    }
    Ok(())
}

fn format_status(path: &str, result: &Result<Divergence, SyncError>) -> String {
    match result {
        Ok(d) => format!(
            "{}: {} (local {}, upstream {})",
            path,
            d.outcome,
            d.local.short(7),
            d.upstream.short(7)
        ),
        Err(e) => format!("{}: error: {}", path, e),
    }
}
