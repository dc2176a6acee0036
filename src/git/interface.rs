//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to all Git operations in forksync.
//! Every read and write of a working copy flows through [`Git`], which
//! returns strong types and normalizes libgit2 failures into typed
//! categories the sync engine can act on.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CasFailed`]: Compare-and-swap precondition failed
//! - [`GitError::CheckoutConflict`]: Local changes would be overwritten
//! - [`GitError::AuthFailed`] / [`GitError::PushRejected`] /
//!   [`GitError::Transport`]: remote operations
//!
//! # Example
//!
//! ```ignore
//! use forksync::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let oid = git.resolve_ref("refs/heads/master")?;
//! println!("master is at {}", oid.short(7));
//! ```

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{BranchName, Oid, TypeError};
use crate::credentials::{AllowedAuth, CredentialSource};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Compare-and-swap precondition failed.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Named remote is not configured.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// Checkout refused because it would overwrite local changes.
    #[error("checkout conflict: {message}")]
    CheckoutConflict {
        /// Description from libgit2
        message: String,
    },

    /// The remote rejected our credentials (or none were available).
    #[error("authentication failed: {message}")]
    AuthFailed {
        /// Description of the failure
        message: String,
    },

    /// The remote refused a ref update.
    #[error("push of {refname} rejected: {message}")]
    PushRejected {
        /// The ref that was refused
        refname: String,
        /// Reason reported by the remote
        message: String,
    },

    /// Network or transport level failure.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    /// Categorize an error from a fetch or push.
    fn from_transport(err: git2::Error, refname: &str) -> Self {
        let message = err.message().to_string();
        match (err.code(), err.class()) {
            (git2::ErrorCode::Auth, _) => GitError::AuthFailed { message },
            (git2::ErrorCode::NotFastForward, _) => GitError::PushRejected {
                refname: refname.to_string(),
                message,
            },
            (git2::ErrorCode::Certificate, _)
            | (
                _,
                git2::ErrorClass::Net
                | git2::ErrorClass::Http
                | git2::ErrorClass::Ssh
                | git2::ErrorClass::Ssl,
            ) => GitError::Transport { message },
            _ if is_rejection_message(&message) => GitError::PushRejected {
                refname: refname.to_string(),
                message,
            },
            _ => GitError::Internal { message },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::InvalidRefName {
                message: other.to_string(),
            },
        }
    }
}

/// Server messages that mean "your ref update was refused".
fn is_rejection_message(message: &str) -> bool {
    const MARKERS: [&str; 4] = [
        "non-fast-forward",
        "fetch first",
        "not present locally",
        "failed to update ref",
    ];
    MARKERS.iter().any(|m| message.contains(m))
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    /// Merge in progress.
    Merge,
    /// Rebase in progress.
    Rebase,
    /// Cherry-pick in progress.
    CherryPick,
    /// Revert in progress.
    Revert,
    /// Bisect in progress.
    Bisect,
    /// Apply mailbox in progress.
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use forksync::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Merge.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    /// Get a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Merge => "merge",
            GitState::Rebase => "rebase",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of [`Git::ensure_remote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSetup {
    /// Remote already existed with the requested URL.
    Existing,
    /// Remote was created.
    Added,
    /// Remote already existed with a different URL; it was left alone.
    UrlMismatch {
        /// The URL currently configured
        actual: String,
    },
}

/// Identity used when writing a commit.
///
/// Missing name/email fall back to the repository's `user.name` /
/// `user.email`; a missing time means "now".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSignature {
    /// Author/committer name
    pub name: Option<String>,
    /// Author/committer email
    pub email: Option<String>,
    /// Seconds since the Unix epoch (UTC)
    pub time: Option<i64>,
}

/// Name used when neither the config nor the repository supplies one.
const FALLBACK_NAME: &str = "forksync";
/// Email used when neither the config nor the repository supplies one.
const FALLBACK_EMAIL: &str = "forksync@localhost";

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2`. A `Git` value owns its repository handle; it is `Send`
/// but must not be shared between pipelines.
///
/// # CAS Semantics
///
/// Branch pointer moves use compare-and-swap: the update only succeeds if the
/// ref still points where the caller last saw it.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the working copy.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the current Git state (rebase, merge, etc.).
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    /// Paths with unresolved conflicts in the index, sorted and de-duplicated.
    pub fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let index = self.repo.index()?;
        if !index.has_conflicts() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            // Any side carries the path; a delete/modify conflict lacks one of them.
            let entry = conflict
                .our
                .as_ref()
                .or(conflict.their.as_ref())
                .or(conflict.ancestor.as_ref());
            if let Some(entry) = entry {
                paths.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }

        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to the commit it points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let commit = self
            .repo
            .find_reference(refname)
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, refname))?;

        Ok(Oid::new(commit.id().to_string())?)
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match head.shorthand() {
            Some(name) if head.is_branch() => Ok(Some(BranchName::new(name)?)),
            _ => Ok(None), // Detached HEAD
        }
    }

    // =========================================================================
    // CAS Ref Operations
    // =========================================================================

    /// Move an existing ref from `expected_old` to `new_oid`.
    ///
    /// The comparison and the write happen inside libgit2 under the ref lock,
    /// so a concurrent writer between our read and our write is detected.
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match
    /// - [`GitError::RefNotFound`] if the ref doesn't exist
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: &Oid,
        message: &str,
    ) -> Result<(), GitError> {
        let current = self
            .repo
            .refname_to_id(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        if current.to_string() != expected_old.as_str() {
            return Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected_old.to_string(),
                actual: current.to_string(),
            });
        }

        let new = to_git2_oid(new_oid)?;
        let old = to_git2_oid(expected_old)?;
        match self.repo.reference_matching(refname, new, true, old, message) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::Modified => Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected_old.to_string(),
                actual: "<modified concurrently>".to_string(),
            }),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Find the merge base (common ancestor) of two commits.
    ///
    /// Returns `None` if there is no common ancestor.
    pub fn merge_base(&self, oid1: &Oid, oid2: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(to_git2_oid(oid1)?, to_git2_oid(oid2)?) {
            Ok(oid) => Ok(Some(Oid::new(oid.to_string())?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if `ancestor` is an ancestor of `descendant`.
    ///
    /// Returns true if ancestor == descendant (a commit is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        if ancestor == descendant {
            return Ok(true);
        }

        Ok(self
            .repo
            .graph_descendant_of(to_git2_oid(descendant)?, to_git2_oid(ancestor)?)?)
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        self.repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    // =========================================================================
    // Working Tree
    // =========================================================================

    /// Update index and working tree to the tree of `oid`, refusing to
    /// overwrite local modifications. HEAD is not moved.
    ///
    /// # Errors
    ///
    /// - [`GitError::CheckoutConflict`] if local changes are in the way
    pub fn checkout_commit_tree(&self, oid: &Oid) -> Result<(), GitError> {
        let commit = self.find_commit(oid)?;
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();

        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(checkout_error)
    }

    /// Force the paths that differ between `from` and `to` back to their
    /// content in `to`, leaving every other path alone.
    ///
    /// Used to undo a tree checkout whose ref update was then refused,
    /// with `to` being the branch tip that won.
    pub fn restore_paths(&self, from: &Oid, to: &Oid) -> Result<(), GitError> {
        let target = self.find_commit(to)?;
        let paths = self.diff_paths(&self.find_commit(from)?.tree()?, &target.tree()?)?;
        self.force_checkout_paths(&target, &paths)
    }

    /// Undo a merge of `theirs` into HEAD.
    ///
    /// Only paths the merge could have touched (those `theirs` changed since
    /// the merge base) are forced back to HEAD, so unrelated uncommitted
    /// edits survive. The index is reset to HEAD and in-progress merge state
    /// is removed.
    pub fn abort_merge(&self, theirs: &Oid) -> Result<(), GitError> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        let head_tree = head.tree()?;
        let their_tree = self.find_commit(theirs)?.tree()?;

        let their_oid = to_git2_oid(theirs)?;
        let base_tree = match self.repo.merge_base(head.id(), their_oid) {
            Ok(base) => self.repo.find_commit(base)?.tree()?,
            Err(e) if e.code() == git2::ErrorCode::NotFound => head_tree.clone(),
            Err(e) => return Err(e.into()),
        };

        let paths = self.diff_paths(&base_tree, &their_tree)?;
        self.force_checkout_paths(&head, &paths)?;

        let mut index = self.repo.index()?;
        index.read_tree(&head_tree)?;
        index.write()?;

        self.repo.cleanup_state()?;
        Ok(())
    }

    fn diff_paths(
        &self,
        old: &git2::Tree<'_>,
        new: &git2::Tree<'_>,
    ) -> Result<Vec<PathBuf>, GitError> {
        let diff = self.repo.diff_tree_to_tree(Some(old), Some(new), None)?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.push(path.to_path_buf());
                }
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn force_checkout_paths(
        &self,
        target: &git2::Commit<'_>,
        paths: &[PathBuf],
    ) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force().remove_untracked(false);
        for path in paths {
            checkout.path(path.as_path());
        }
        self.repo
            .checkout_tree(target.as_object(), Some(&mut checkout))
            .map_err(checkout_error)
    }

    /// Clear in-progress operation state without touching index or tree.
    pub fn cleanup_state(&self) -> Result<(), GitError> {
        Ok(self.repo.cleanup_state()?)
    }

    // =========================================================================
    // Merge and Commit
    // =========================================================================

    /// Merge `theirs` into HEAD, writing the result into the index and
    /// working tree. Conflicts are recorded in the index (with conflict
    /// markers in the files) rather than reported as an error.
    ///
    /// Leaves the repository in the merging state; callers finish with
    /// [`Git::cleanup_state`] or [`Git::abort_merge`].
    pub fn merge_into_head(&self, theirs: &Oid) -> Result<(), GitError> {
        let annotated = self
            .repo
            .find_annotated_commit(to_git2_oid(theirs)?)
            .map_err(|e| GitError::from_git2(e, theirs.as_str()))?;

        let mut merge_opts = git2::MergeOptions::new();
        merge_opts.fail_on_conflict(false);

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout
            .safe()
            .allow_conflicts(true)
            .conflict_style_merge(true);

        self.repo
            .merge(&[&annotated], Some(&mut merge_opts), Some(&mut checkout))
            .map_err(checkout_error)
    }

    /// Write the current index as a tree.
    pub fn write_index_tree(&self) -> Result<Oid, GitError> {
        let mut index = self.repo.index()?;
        let tree = index.write_tree()?;
        Ok(Oid::new(tree.to_string())?)
    }

    /// Create a commit of `tree` with the given parents and move HEAD's
    /// branch to it in the same step.
    ///
    /// libgit2 refuses the ref update if `parents[0]` is no longer the
    /// branch tip, which surfaces as [`GitError::CasFailed`].
    pub fn commit_on_head(
        &self,
        tree: &Oid,
        parents: &[&Oid],
        message: &str,
        signature: &CommitSignature,
    ) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .find_tree(to_git2_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;
        let parents = parents
            .iter()
            .map(|oid| self.find_commit(oid))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        let sig = self.signature(signature)?;

        match self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        {
            Ok(oid) => Ok(Oid::new(oid.to_string())?),
            Err(e) if e.code() == git2::ErrorCode::Modified => Err(GitError::CasFailed {
                refname: "HEAD".to_string(),
                expected: parent_refs
                    .first()
                    .map(|c| c.id().to_string())
                    .unwrap_or_default(),
                actual: "<modified concurrently>".to_string(),
            }),
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    fn signature(&self, policy: &CommitSignature) -> Result<git2::Signature<'static>, GitError> {
        let fallback = self.repo.signature().ok();
        let name = policy
            .name
            .as_deref()
            .or_else(|| fallback.as_ref().and_then(|s| s.name()))
            .unwrap_or(FALLBACK_NAME);
        let email = policy
            .email
            .as_deref()
            .or_else(|| fallback.as_ref().and_then(|s| s.email()))
            .unwrap_or(FALLBACK_EMAIL);

        let sig = match policy.time {
            Some(seconds) => git2::Signature::new(name, email, &git2::Time::new(seconds, 0)),
            None => git2::Signature::now(name, email),
        };
        Ok(sig?)
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote.
    ///
    /// Returns `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Register remote `name` pointing at `url` unless it already exists.
    ///
    /// An existing remote is never modified.
    pub fn ensure_remote(&self, name: &str, url: &str) -> Result<RemoteSetup, GitError> {
        match self.remote_url(name)? {
            Some(actual) if actual == url => Ok(RemoteSetup::Existing),
            Some(actual) => Ok(RemoteSetup::UrlMismatch { actual }),
            None => {
                self.repo
                    .remote(name, url)
                    .map_err(|e| GitError::from_git2(e, name))?;
                Ok(RemoteSetup::Added)
            }
        }
    }

    /// Fetch `remote` using its configured refspecs, updating its
    /// remote-tracking refs.
    pub fn fetch(
        &self,
        remote: &str,
        credentials: &dyn CredentialSource,
    ) -> Result<(), GitError> {
        let mut handle = self.find_remote(remote)?;
        let attempts = Cell::new(0u32);

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(auth_callbacks(credentials, &attempts));

        handle
            .fetch::<&str>(&[], Some(&mut options), None)
            .map_err(|e| GitError::from_transport(e, remote))
    }

    /// Push `refs/heads/<branch>` to the same name on `remote`, without force.
    ///
    /// # Errors
    ///
    /// - [`GitError::AuthFailed`] if credentials are missing or rejected
    /// - [`GitError::PushRejected`] if the remote refuses the update
    /// - [`GitError::Transport`] on network failures
    pub fn push_branch(
        &self,
        remote: &str,
        branch: &BranchName,
        credentials: &dyn CredentialSource,
    ) -> Result<(), GitError> {
        let refname = format!("refs/heads/{}", branch);
        let refspec = format!("{refname}:{refname}");

        let mut handle = self.find_remote(remote)?;
        let attempts = Cell::new(0u32);
        let rejection: RefCell<Option<String>> = RefCell::new(None);

        {
            let mut callbacks = auth_callbacks(credentials, &attempts);
            callbacks.push_update_reference(|_name, status| {
                if let Some(msg) = status {
                    *rejection.borrow_mut() = Some(msg.to_string());
                }
                Ok(())
            });

            let mut options = git2::PushOptions::new();
            options.remote_callbacks(callbacks);

            handle
                .push(&[refspec.as_str()], Some(&mut options))
                .map_err(|e| GitError::from_transport(e, &refname))?;
        }

        match rejection.into_inner() {
            Some(message) => Err(GitError::PushRejected { refname, message }),
            None => Ok(()),
        }
    }

    fn find_remote(&self, name: &str) -> Result<git2::Remote<'_>, GitError> {
        self.repo.find_remote(name).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RemoteNotFound {
                name: name.to_string(),
            },
            _ => e.into(),
        })
    }
}

/// Build callbacks that answer credential requests from `source`.
///
/// libgit2 re-invokes the credential callback after the remote rejects what
/// it was given; the second request is turned into an auth error instead of
/// looping.
fn auth_callbacks<'a>(
    source: &'a dyn CredentialSource,
    attempts: &'a Cell<u32>,
) -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > 1 {
            return Err(auth_error("credentials rejected by remote"));
        }

        let wanted = AllowedAuth {
            user_pass: allowed.is_user_pass_plaintext(),
            ssh_key: allowed.is_ssh_key(),
        };
        let creds = source
            .credentials(url, username_from_url, wanted)
            .map_err(|e| auth_error(&e.to_string()))?;

        if wanted.user_pass {
            git2::Cred::userpass_plaintext(creds.username(), creds.token())
        } else if wanted.ssh_key {
            git2::Cred::ssh_key_from_agent(creds.username())
        } else {
            Err(auth_error("remote requested an unsupported credential type"))
        }
    });
    callbacks
}

fn auth_error(message: &str) -> git2::Error {
    git2::Error::new(git2::ErrorCode::Auth, git2::ErrorClass::Callback, message)
}

fn checkout_error(err: git2::Error) -> GitError {
    match (err.code(), err.class()) {
        (git2::ErrorCode::Conflict | git2::ErrorCode::MergeConflict, _)
        | (_, git2::ErrorClass::Checkout) => GitError::CheckoutConflict {
            message: err.message().to_string(),
        },
        _ => err.into(),
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}
