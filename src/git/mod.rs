//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and writes
//! flow through this interface. No other module should import `git2`, and
//! nothing shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Ref resolution and CAS branch updates
//! - Ancestry queries (merge-base, is-ancestor)
//! - Working tree checkout, merge, and commit
//! - Remote setup, fetch, and push with credential callbacks
//!
//! # Invariants
//!
//! - Branch pointer moves use CAS (compare-and-swap) semantics
//! - Pushes are never forced
//! - All operations return strong types (Oid, BranchName)
//!
//! # Example
//!
//! ```ignore
//! use forksync::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let local = git.resolve_ref("refs/heads/master")?;
//! let upstream = git.resolve_ref("refs/remotes/upstream/master")?;
//!
//! if git.is_ancestor(&local, &upstream)? {
//!     git.checkout_commit_tree(&upstream)?;
//!     git.update_ref_cas("refs/heads/master", &upstream, &local, "forksync: fast-forward")?;
//! }
//! ```

mod interface;

pub use interface::{CommitSignature, Git, GitError, GitState, RemoteSetup};
