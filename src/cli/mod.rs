//! cli
//!
//! Command-line interface layer for forksync.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and turn it into per-repository jobs
//! - Delegate to command handlers
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Errors are reported with `anyhow`.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, RepoArgs, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Execution context for commands, derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit global config file.
    pub config: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs` after logging is set up.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
