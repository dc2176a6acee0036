//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this global config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--log-json`: Emit logs as JSON lines

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// forksync - keep forks in step with their upstream
#[derive(Parser, Debug)]
#[command(name = "forksync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this global config file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output (warnings and errors only)
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Default log filter directive implied by the flags.
    ///
    /// `RUST_LOG` still wins when set.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bring forks up to date with upstream and push the result
    #[command(
        name = "sync",
        long_about = "Bring each fork's branch up to date with upstream and push it.\n\n\
            For every repository the upstream remote is fetched and the local branch is \
            compared against it. A branch that is behind is fast-forwarded; a branch that \
            has diverged gets a merge commit with the local tip as first parent. The \
            result is pushed (never forced) to the fork's own remote.\n\n\
            Merge conflicts are reported with their paths and nothing is pushed. One \
            repository failing never stops the others; the exit status is non-zero if \
            any repository failed.",
        after_help = "\
EXAMPLES:
    # Sync the repository in the current directory
    forksync sync

    # Sync several working copies, four at a time
    forksync sync ~/src/fork-a ~/src/fork-b ~/src/fork-c --workers 4

    # Register upstream if missing, and sync 'main' instead of 'master'
    forksync sync --branch main --upstream-url https://github.com/source/project.git

CREDENTIALS:
    Push credentials are read from $GITHUB_USERNAME and $GITHUB_TOKEN at push
    time. The variable names can be changed in the [credentials] config section."
    )]
    Sync {
        #[command(flatten)]
        repos: RepoArgs,

        /// Number of repositories to process concurrently
        #[arg(long, short = 'j', value_name = "N")]
        workers: Option<usize>,

        /// Leave conflict markers in the working tree instead of aborting the merge
        #[arg(long)]
        keep_conflicts: bool,

        /// Print one JSON document with all reports
        #[arg(long)]
        json: bool,
    },

    /// Fetch upstream and report how each fork has diverged (no changes made)
    #[command(name = "status")]
    Status {
        #[command(flatten)]
        repos: RepoArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    forksync completion bash > ~/.local/share/bash-completion/completions/forksync

    # Zsh
    forksync completion zsh > \"${fpath[1]}/_forksync\"

    # Fish
    forksync completion fish > ~/.config/fish/completions/forksync.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Repository selection and naming overrides shared by `sync` and `status`.
#[derive(Args, Debug, Clone, Default)]
pub struct RepoArgs {
    /// Working copies to process (default: configured repos, else the current directory)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Branch to reconcile on both sides
    #[arg(long, short)]
    pub branch: Option<String>,

    /// Remote the result is pushed to
    #[arg(long, value_name = "NAME")]
    pub own_remote: Option<String>,

    /// Remote fetched as the source of truth
    #[arg(long, value_name = "NAME")]
    pub upstream_remote: Option<String>,

    /// Add the upstream remote with this URL if it does not exist
    #[arg(long, value_name = "URL")]
    pub upstream_url: Option<String>,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_with_overrides() {
        let cli = Cli::try_parse_from([
            "forksync",
            "sync",
            "a",
            "b",
            "--branch",
            "main",
            "--upstream-url",
            "https://example.com/src.git",
            "-j",
            "3",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Command::Sync {
                repos,
                workers,
                keep_conflicts,
                json,
            } => {
                assert_eq!(repos.paths, vec![PathBuf::from("a"), PathBuf::from("b")]);
                assert_eq!(repos.branch.as_deref(), Some("main"));
                assert_eq!(
                    repos.upstream_url.as_deref(),
                    Some("https://example.com/src.git")
                );
                assert_eq!(workers, Some(3));
                assert!(!keep_conflicts);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["forksync", "status", "--debug", "--log-json"]).unwrap();
        assert!(cli.debug);
        assert!(cli.log_json);
        assert_eq!(cli.log_level(), "debug");
    }

    #[test]
    fn quiet_and_debug_conflict() {
        assert!(Cli::try_parse_from(["forksync", "--quiet", "--debug", "status"]).is_err());
    }

    #[test]
    fn quiet_lowers_level() {
        let cli = Cli::try_parse_from(["forksync", "-q", "status"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }
}
