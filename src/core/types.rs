//! core::types
//!
//! Strong types for the names and identifiers that flow through a sync.
//!
//! # Types
//!
//! - [`BranchName`] - Validated branch name (the branch being reconciled)
//! - [`RemoteName`] - Validated remote name (`origin`, `upstream`, ...)
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RefName`] - Fully qualified reference name
//!
//! # Validation
//!
//! Names are checked at construction time against Git's refname rules, so a
//! misconfigured branch or remote is rejected when the config is loaded
//! rather than halfway through a fetch.
//!
//! # Examples
//!
//! ```
//! use forksync::core::types::{BranchName, Oid, RefName, RemoteName};
//!
//! let branch = BranchName::new("master").unwrap();
//! let upstream = RemoteName::new("upstream").unwrap();
//! let tracking = RefName::for_remote_branch(&upstream, &branch);
//! assert_eq!(tracking.as_str(), "refs/remotes/upstream/master");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid remote name: {0}")]
    InvalidRemoteName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Check the rules shared by branch names, remote names and full refnames
/// (see `git check-ref-format`).
///
/// `what` names the kind of value in the returned message.
fn check_refname_rules(name: &str, what: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }
    if name == "@" {
        return Err(format!("{what} cannot be '@' (reserved)"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(format!("{what} cannot start or end with '/'"));
    }
    if name.ends_with(".lock") {
        return Err(format!("{what} cannot end with '.lock'"));
    }

    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Err(format!("{what} cannot contain '{bad}'"));
        }
    }

    const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
        return Err(format!("{what} cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err(format!("{what} cannot contain control characters"));
    }

    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }

    Ok(())
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = TypeError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// A validated Git branch name, without the `refs/heads/` prefix.
///
/// # Example
///
/// ```
/// use forksync::core::types::BranchName;
///
/// let name = BranchName::new("release/1.x").unwrap();
/// assert_eq!(name.as_str(), "release/1.x");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        check_refname_rules(&name, "branch name").map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(BranchName);

/// A validated remote name.
///
/// Remote names end up inside refspecs and tracking refs
/// (`refs/remotes/<remote>/...`), so they obey the same rules as a single
/// refname component: no `/` is allowed.
///
/// # Example
///
/// ```
/// use forksync::core::types::RemoteName;
///
/// assert!(RemoteName::new("upstream").is_ok());
/// assert!(RemoteName::new("up/stream").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteName(String);

impl RemoteName {
    /// Create a new validated remote name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.contains('/') {
            return Err(TypeError::InvalidRemoteName(
                "remote name cannot contain '/'".into(),
            ));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidRemoteName(
                "remote name cannot start with '-'".into(),
            ));
        }
        check_refname_rules(&name, "remote name").map_err(TypeError::InvalidRemoteName)?;
        Ok(Self(name))
    }

    /// Get the remote name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(RemoteName);

/// A Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use forksync::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64
    /// character hex string.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// If `len` exceeds the OID length, returns the full OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(Oid);

/// A validated, fully qualified Git reference name.
///
/// # Example
///
/// ```
/// use forksync::core::types::{BranchName, RefName};
///
/// let branch = BranchName::new("master").unwrap();
/// assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/master");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_refname_rules(&name, "ref name").map_err(TypeError::InvalidRefName)?;
        Ok(Self(name))
    }

    /// Local branch ref (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        // Both halves are already validated.
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// Remote-tracking ref (`refs/remotes/<remote>/<branch>`).
    ///
    /// # Example
    ///
    /// ```
    /// use forksync::core::types::{BranchName, RefName, RemoteName};
    ///
    /// let remote = RemoteName::new("upstream").unwrap();
    /// let branch = BranchName::new("master").unwrap();
    /// let refname = RefName::for_remote_branch(&remote, &branch);
    /// assert_eq!(refname.as_str(), "refs/remotes/upstream/master");
    /// ```
    pub fn for_remote_branch(remote: &RemoteName, branch: &BranchName) -> Self {
        Self(format!("refs/remotes/{}/{}", remote.as_str(), branch.as_str()))
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

string_newtype_impls!(RefName);
