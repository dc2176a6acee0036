//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds one job per repository
//! 2. Calls the engine
//! 3. Formats and displays output
//!
//! Handlers do NOT perform repository mutations directly.

mod completion;
mod status;
mod sync;

pub use completion::completion;
pub use status::status;
pub use sync::sync;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};

use super::args::{Command, RepoArgs};
use super::Context;
use crate::core::config::{Config, ConfigWarning};
use crate::core::types::{BranchName, RemoteName};
use crate::credentials::EnvCredentialSource;
use crate::engine::{SyncJob, SyncSettings};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Sync {
            repos,
            workers,
            keep_conflicts,
            json,
        } => sync::sync(ctx, &repos, workers, keep_conflicts, json),
        Command::Status { repos, json } => status::status(ctx, &repos, json),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Loaded configuration plus the jobs derived from it.
pub(crate) struct Plan {
    pub config: Config,
    pub jobs: Vec<SyncJob>,
}

/// Load configuration and build one job per selected repository.
///
/// Paths come from the command line, else from `[[repos]]` in the global
/// config, else the current directory. Precedence for every setting is
/// defaults < global config < repo config < command line.
pub(crate) fn plan_jobs(ctx: &Context, args: &RepoArgs, keep_conflicts: bool) -> Result<Plan> {
    let loaded = Config::load(ctx.config.as_deref()).context("failed to load configuration")?;
    report_warnings(&loaded.warnings, ctx);
    let config = loaded.config;

    let targets: Vec<(PathBuf, Option<String>)> = if !args.paths.is_empty() {
        args.paths.iter().map(|p| (p.clone(), None)).collect()
    } else if !config.repos().is_empty() {
        config
            .repos()
            .iter()
            .map(|r| (r.path.clone(), r.upstream_url.clone()))
            .collect()
    } else {
        vec![(std::env::current_dir().context("cannot determine current directory")?, None)]
    };

    let mut jobs = Vec::with_capacity(targets.len());
    for (path, entry_url) in targets {
        let layered = config
            .for_repo(&path)
            .with_context(|| format!("failed to load repository config for {}", path.display()))?;
        report_warnings(&layered.warnings, ctx);

        let settings = job_settings(&layered.config, args, keep_conflicts, &path)?;
        let upstream_url = args
            .upstream_url
            .clone()
            .or(entry_url)
            .or_else(|| layered.config.upstream_url().map(String::from));

        jobs.push(SyncJob {
            path,
            settings,
            upstream_url,
        });
    }

    Ok(Plan { config, jobs })
}

fn job_settings(
    config: &Config,
    args: &RepoArgs,
    keep_conflicts: bool,
    path: &Path,
) -> Result<SyncSettings> {
    let mut settings = SyncSettings::from_config(config)
        .with_context(|| format!("invalid configuration for {}", path.display()))?;

    if let Some(branch) = &args.branch {
        settings.branch = BranchName::new(branch.as_str())?;
    }
    if let Some(remote) = &args.own_remote {
        settings.own_remote = RemoteName::new(remote.as_str())?;
    }
    if let Some(remote) = &args.upstream_remote {
        settings.upstream_remote = RemoteName::new(remote.as_str())?;
    }
    if keep_conflicts {
        settings.keep_conflicts = true;
    }

    if settings.own_remote == settings.upstream_remote {
        bail!(
            "own remote and upstream remote are both '{}' for {}",
            settings.own_remote,
            path.display()
        );
    }
    Ok(settings)
}

/// Credential source configured for this run.
pub(crate) fn credential_source(config: &Config) -> EnvCredentialSource {
    EnvCredentialSource::new(config.username_env(), config.token_env())
}

fn report_warnings(warnings: &[ConfigWarning], ctx: &Context) {
    for w in warnings {
        output::warn(format!("{} ({})", w.message, w.path.display()), ctx.verbosity);
    }
}
