//! sync command - Reconcile forks with upstream and publish

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::warn;

use super::{credential_source, plan_jobs};
use crate::cli::args::RepoArgs;
use crate::cli::Context;
use crate::engine::{sync_all, CancelToken};
use crate::ui::output;

/// Synchronize every selected repository.
///
/// Every repository is attempted. The command fails afterwards if any of
/// them failed.
pub fn sync(
    ctx: &Context,
    repos: &RepoArgs,
    workers: Option<usize>,
    keep_conflicts: bool,
    json: bool,
) -> Result<()> {
    let plan = plan_jobs(ctx, repos, keep_conflicts)?;
    let workers = workers.unwrap_or_else(|| plan.config.workers());
    if workers == 0 {
        bail!("--workers must be at least 1");
    }

    let credentials = credential_source(&plan.config);
    let cancel = CancelToken::new();
    watch_interrupt(cancel.clone());

    let reports = sync_all(&plan.jobs, &credentials, &cancel, workers);

    if json {
        let views: Vec<_> = reports.iter().map(|r| r.view()).collect();
        let doc = serde_json::json!({
            "generated_at": Utc::now(),
            "reports": views,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        for report in &reports {
            output::print(output::format_report(report), ctx.verbosity);
        }
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        bail!("{} of {} repositories failed to sync", failed, reports.len());
    }
    Ok(())
}

/// Trip `cancel` on the first Ctrl-C; exit on the second.
fn watch_interrupt(cancel: CancelToken) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C");
                return;
            }
        };

        if rt.block_on(tokio::signal::ctrl_c()).is_err() {
            return;
        }
        warn!("interrupt received; stopping after the current step");
        cancel.cancel();

        if rt.block_on(tokio::signal::ctrl_c()).is_ok() {
            std::process::exit(130);
        }
    });
}
