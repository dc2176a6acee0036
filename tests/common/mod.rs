//! Shared fixtures for integration tests.
//!
//! Every fixture is a real set of repositories in a temp dir, driven with
//! the git CLI:
//!
//! - `upstream/`: the source project (non-bare, commits are made here)
//! - `fork.git`: the fork's remote (bare, a clone of upstream)
//! - `work/`: working copy of the fork; `origin` is `fork.git`,
//!   `upstream` is `upstream/`

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use forksync::core::types::{BranchName, Oid, RemoteName};
use forksync::engine::SyncSettings;
use forksync::git::{CommitSignature, Git};

/// Fixed identity for merge commits created in tests.
pub const BOT_NAME: &str = "Sync Bot";
pub const BOT_EMAIL: &str = "bot@example.com";
pub const BOT_TIME: i64 = 1_700_000_000;

pub struct ForkFixture {
    root: TempDir,
}

impl ForkFixture {
    /// Upstream with one commit (C1), a bare fork cloned from it, and a
    /// working copy of the fork with `upstream` registered.
    pub fn new() -> Self {
        let root = TempDir::new().expect("failed to create temp dir");
        let fixture = Self { root };

        let upstream = fixture.upstream_path();
        std::fs::create_dir(&upstream).unwrap();
        init_repo(&upstream);
        std::fs::write(upstream.join("README.md"), "# Project\n\nline one\n").unwrap();
        run_git(&upstream, &["add", "README.md"]);
        run_git(&upstream, &["commit", "-m", "C1"]);

        run_git(
            fixture.root.path(),
            &["clone", "--bare", "upstream", "fork.git"],
        );
        run_git(fixture.root.path(), &["clone", "fork.git", "work"]);
        configure_identity(&fixture.work_path());
        fixture.add_upstream_remote();

        fixture
    }

    /// Same as [`ForkFixture::new`] but without the `upstream` remote.
    pub fn without_upstream_remote() -> Self {
        let fixture = Self::new();
        run_git(&fixture.work_path(), &["remote", "remove", "upstream"]);
        fixture
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn upstream_path(&self) -> PathBuf {
        self.root.path().join("upstream")
    }

    pub fn fork_path(&self) -> PathBuf {
        self.root.path().join("fork.git")
    }

    pub fn work_path(&self) -> PathBuf {
        self.root.path().join("work")
    }

    pub fn upstream_url(&self) -> String {
        self.upstream_path().display().to_string()
    }

    fn add_upstream_remote(&self) {
        run_git(
            &self.work_path(),
            &["remote", "add", "upstream", &self.upstream_url()],
        );
    }

    pub fn git(&self) -> Git {
        Git::open(&self.work_path()).expect("failed to open working copy")
    }

    /// Commit `content` to `file` on upstream's master.
    pub fn commit_upstream(&self, file: &str, content: &str, message: &str) -> Oid {
        commit_file(&self.upstream_path(), file, content, message)
    }

    /// Commit `content` to `file` in the working copy.
    pub fn commit_local(&self, file: &str, content: &str, message: &str) -> Oid {
        commit_file(&self.work_path(), file, content, message)
    }

    /// Push a commit to the fork from a second clone, so the fork moves
    /// without the working copy knowing.
    pub fn push_to_fork_elsewhere(&self, file: &str, content: &str) -> Oid {
        let other = self.root.path().join("other");
        if !other.exists() {
            run_git(self.root.path(), &["clone", "fork.git", "other"]);
            configure_identity(&other);
        }
        let oid = commit_file(&other, file, content, "concurrent change");
        run_git(&other, &["push", "origin", "master"]);
        oid
    }

    pub fn local_master(&self) -> Oid {
        rev_parse(&self.work_path(), "refs/heads/master")
    }

    pub fn fork_master(&self) -> Oid {
        rev_parse(&self.fork_path(), "refs/heads/master")
    }

    pub fn upstream_master(&self) -> Oid {
        rev_parse(&self.upstream_path(), "refs/heads/master")
    }

    pub fn read_work_file(&self, file: &str) -> String {
        std::fs::read_to_string(self.work_path().join(file)).unwrap()
    }

    /// Settings for origin/upstream/master with a fixed signature.
    pub fn settings(&self) -> SyncSettings {
        let mut settings = SyncSettings::new(
            RemoteName::new("origin").unwrap(),
            RemoteName::new("upstream").unwrap(),
            BranchName::new("master").unwrap(),
        );
        settings.signature = CommitSignature {
            name: Some(BOT_NAME.into()),
            email: Some(BOT_EMAIL.into()),
            time: Some(BOT_TIME),
        };
        settings
    }
}

/// Initialize a repository on `master` with a test identity.
pub fn init_repo(dir: &Path) {
    run_git(dir, &["init", "-b", "master"]);
    configure_identity(dir);
}

pub fn configure_identity(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "core.editor", "true"]);
}

pub fn commit_file(dir: &Path, file: &str, content: &str, message: &str) -> Oid {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    run_git(dir, &["add", file]);
    run_git(dir, &["commit", "-m", message]);
    rev_parse(dir, "HEAD")
}

pub fn rev_parse(dir: &Path, rev: &str) -> Oid {
    Oid::new(git_output(dir, &["rev-parse", rev])).unwrap()
}

/// Run a git command and return trimmed stdout.
pub fn git_output(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    git_output(dir, args);
}
