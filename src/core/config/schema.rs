//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$FORKSYNC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/forksync/config.toml`
//! 3. `~/.forksync/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.git/forksync/config.toml` inside a working copy.
//!
//! # Validation
//!
//! Config values are validated after parsing: branch and remote names must
//! be valid Git names, and signature fields must not be blank.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, RemoteName};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// own_remote = "origin"
/// upstream_remote = "upstream"
/// branch = "master"
/// workers = 4
/// keep_conflicts = false
///
/// [signature]
/// name = "Fork Bot"
/// email = "forkbot@example.com"
///
/// [credentials]
/// username_env = "GITHUB_USERNAME"
/// token_env = "GITHUB_TOKEN"
///
/// [[repos]]
/// path = "/srv/forks/widgets"
/// upstream_url = "https://github.com/acme/widgets.git"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Name of the fork's own remote (default: "origin")
    pub own_remote: Option<String>,

    /// Name of the upstream remote (default: "upstream")
    pub upstream_remote: Option<String>,

    /// Branch reconciled on both sides (default: "master")
    pub branch: Option<String>,

    /// Leave a conflicted merge in the working tree instead of aborting it
    pub keep_conflicts: Option<bool>,

    /// Number of repositories processed concurrently (default: 1)
    pub workers: Option<usize>,

    /// Merge commit message template
    pub merge_message: Option<String>,

    /// Merge commit signature policy
    pub signature: Option<SignatureConfig>,

    /// Where push credentials come from
    pub credentials: Option<CredentialsConfig>,

    /// Repositories to sync when none are given on the command line
    pub repos: Vec<RepoEntry>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_names(
            self.own_remote.as_deref(),
            self.upstream_remote.as_deref(),
            self.branch.as_deref(),
        )?;

        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue(
                "workers must be at least 1".into(),
            ));
        }

        if let Some(signature) = &self.signature {
            signature.validate()?;
        }
        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }
        for entry in &self.repos {
            if entry.path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "repos entry has an empty path".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Repository configuration, stored inside the working copy.
///
/// # Example
///
/// ```toml
/// branch = "main"
/// upstream_url = "https://github.com/acme/widgets.git"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Branch override for this repository
    pub branch: Option<String>,

    /// Own remote override for this repository
    pub own_remote: Option<String>,

    /// Upstream remote override for this repository
    pub upstream_remote: Option<String>,

    /// URL used to register the upstream remote when it is missing
    pub upstream_url: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_names(
            self.own_remote.as_deref(),
            self.upstream_remote.as_deref(),
            self.branch.as_deref(),
        )?;
        if matches!(self.upstream_url.as_deref(), Some(url) if url.trim().is_empty()) {
            return Err(ConfigError::InvalidValue("upstream_url is empty".into()));
        }
        Ok(())
    }
}

/// One `[[repos]]` entry in the global config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    /// Path to an existing working copy of the fork
    pub path: PathBuf,

    /// URL of the upstream repository (registers the upstream remote if missing)
    #[serde(default)]
    pub upstream_url: Option<String>,
}

/// Signature used for merge commits.
///
/// Any field left out falls back to the repository's `user.name` /
/// `user.email`, and the timestamp falls back to the current time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SignatureConfig {
    /// Author/committer name
    pub name: Option<String>,

    /// Author/committer email
    pub email: Option<String>,

    /// Fixed commit time in seconds since the Unix epoch
    pub timestamp: Option<i64>,
}

impl SignatureConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("signature.name", &self.name), ("signature.email", &self.email)] {
            let Some(value) = value.as_deref() else {
                continue;
            };
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!("{key} is empty")));
            }
            if value.contains(|c: char| c == '<' || c == '>') {
                return Err(ConfigError::InvalidValue(format!(
                    "{key} must not contain '<' or '>': '{value}'"
                )));
            }
        }
        if matches!(self.timestamp, Some(t) if t < 0) {
            return Err(ConfigError::InvalidValue(
                "signature.timestamp must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Environment variables that hold push credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Variable holding the username (default: "GITHUB_USERNAME")
    pub username_env: Option<String>,

    /// Variable holding the token (default: "GITHUB_TOKEN")
    pub token_env: Option<String>,
}

impl CredentialsConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("credentials.username_env", &self.username_env),
            ("credentials.token_env", &self.token_env),
        ] {
            if let Some(var) = value {
                if var.is_empty() || var.contains('=') || var.contains('\0') {
                    return Err(ConfigError::InvalidValue(format!(
                        "{key} is not a valid environment variable name: '{var}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_names(
    own_remote: Option<&str>,
    upstream_remote: Option<&str>,
    branch: Option<&str>,
) -> Result<(), ConfigError> {
    if let Some(branch) = branch {
        BranchName::new(branch).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    }
    for remote in [own_remote, upstream_remote].into_iter().flatten() {
        RemoteName::new(remote).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    }
    if let (Some(own), Some(up)) = (own_remote, upstream_remote) {
        if own == up {
            return Err(ConfigError::InvalidValue(format!(
                "own_remote and upstream_remote are both '{own}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_global_config() {
        let config: GlobalConfig = toml::from_str(
            r#"
            own_remote = "origin"
            upstream_remote = "source"
            branch = "main"
            workers = 2

            [signature]
            name = "Fork Bot"
            email = "bot@example.com"
            timestamp = 1700000000

            [credentials]
            token_env = "FORK_TOKEN"

            [[repos]]
            path = "/srv/forks/a"

            [[repos]]
            path = "/srv/forks/b"
            upstream_url = "https://example.com/b.git"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.repos.len(), 2);
        assert_eq!(
            config.repos[1].upstream_url.as_deref(),
            Some("https://example.com/b.git")
        );
        assert_eq!(config.signature.unwrap().timestamp, Some(1_700_000_000));
    }

    #[test]
    fn same_remote_twice_rejected() {
        let config = GlobalConfig {
            own_remote: Some("origin".into()),
            upstream_remote: Some("origin".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = GlobalConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_signature_rejected() {
        let sig = SignatureConfig {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(sig.validate().is_err());
    }

    #[test]
    fn angle_brackets_in_signature_rejected() {
        let name = SignatureConfig {
            name: Some("bad <name>".into()),
            ..Default::default()
        };
        assert!(name.validate().is_err());

        let email = SignatureConfig {
            email: Some("<bot@example.com>".into()),
            ..Default::default()
        };
        assert!(email.validate().is_err());

        let fine = SignatureConfig {
            name: Some("Sync Bot".into()),
            email: Some("bot@example.com".into()),
            timestamp: None,
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn bad_env_var_name_rejected() {
        let creds = CredentialsConfig {
            token_env: Some("A=B".into()),
            ..Default::default()
        };
        assert!(creds.validate().is_err());
    }

    #[test]
    fn repo_config_rejects_remote_with_slash() {
        let repo = RepoConfig {
            upstream_remote: Some("up/stream".into()),
            ..Default::default()
        };
        assert!(repo.validate().is_err());
    }
}
