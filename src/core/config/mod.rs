//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! forksync has two configuration scopes:
//! - **Global**: User-level settings and the list of forks to process
//! - **Repo**: Per-working-copy overrides (branch, remotes, upstream URL)
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (applied by the CLI layer)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. An explicit `--config <path>` (must exist)
//! 2. `$FORKSYNC_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/forksync/config.toml`
//! 4. `~/.forksync/config.toml`
//!
//! # Repo Config Locations
//!
//! Searched in order:
//! 1. `.git/forksync/config.toml` (canonical)
//! 2. `.forksync.toml` in the working tree (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use forksync::core::config::Config;
//! use std::path::Path;
//!
//! let global = Config::load(None).unwrap();
//! let scoped = global.config.for_repo(Path::new("/srv/forks/widgets")).unwrap();
//! println!("branch: {}", scoped.config.branch());
//! ```

pub mod schema;

pub use schema::{CredentialsConfig, GlobalConfig, RepoConfig, RepoEntry, SignatureConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default name of the fork's own remote.
pub const DEFAULT_OWN_REMOTE: &str = "origin";
/// Default name of the upstream remote.
pub const DEFAULT_UPSTREAM_REMOTE: &str = "upstream";
/// Default branch reconciled on both sides.
pub const DEFAULT_BRANCH: &str = "master";
/// Default environment variable holding the push username.
pub const DEFAULT_USERNAME_ENV: &str = "GITHUB_USERNAME";
/// Default environment variable holding the push token.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Default merge commit message. `{remote}` and `{branch}` are substituted.
pub const DEFAULT_MERGE_MESSAGE: &str = "Merge {remote}/{branch} into {branch}";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: repo config overrides global
/// config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (after [`Config::for_repo`])
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load the global configuration.
    ///
    /// An `explicit` path must exist; the standard locations are optional and
    /// defaults are used when none is present.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf()))
            }
            None => Self::load_global()?,
        };

        global.validate()?;

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo: None,
                global_path,
            },
            warnings: Vec::new(),
        })
    }

    /// Derive the configuration for one working copy by layering its repo
    /// config on top of this one.
    pub fn for_repo(&self, work_dir: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let repo = Self::load_repo(work_dir, &mut warnings)?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global: self.global.clone(),
                repo,
                global_path: self.global_path.clone(),
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("FORKSYNC_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("forksync/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".forksync/config.toml"));
        }

        for path in candidates {
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Load repository configuration from standard locations.
    fn load_repo(
        work_dir: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Option<RepoConfig>, ConfigError> {
        let canonical = Self::repo_config_path(work_dir);
        if canonical.exists() {
            return read_toml(&canonical).map(Some);
        }

        let compat = work_dir.join(".forksync.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using in-tree config file. Please move it to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            return read_toml(&compat).map(Some);
        }

        Ok(None)
    }

    /// Get the canonical path for repo config.
    pub fn repo_config_path(work_dir: &Path) -> PathBuf {
        work_dir.join(".git/forksync/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Name of the fork's own remote. Defaults to "origin".
    pub fn own_remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.own_remote.as_deref())
            .or(self.global.own_remote.as_deref())
            .unwrap_or(DEFAULT_OWN_REMOTE)
    }

    /// Name of the upstream remote. Defaults to "upstream".
    pub fn upstream_remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.upstream_remote.as_deref())
            .or(self.global.upstream_remote.as_deref())
            .unwrap_or(DEFAULT_UPSTREAM_REMOTE)
    }

    /// Branch to reconcile. Defaults to "master".
    pub fn branch(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.branch.as_deref())
            .or(self.global.branch.as_deref())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Upstream URL from the repo config, if any.
    pub fn upstream_url(&self) -> Option<&str> {
        self.repo.as_ref().and_then(|r| r.upstream_url.as_deref())
    }

    /// Whether a conflicted merge is left in place. Defaults to `false`.
    pub fn keep_conflicts(&self) -> bool {
        self.global.keep_conflicts.unwrap_or(false)
    }

    /// Number of concurrent workers. Defaults to 1.
    pub fn workers(&self) -> usize {
        self.global.workers.unwrap_or(1)
    }

    /// Merge commit message template.
    pub fn merge_message(&self) -> &str {
        self.global
            .merge_message
            .as_deref()
            .unwrap_or(DEFAULT_MERGE_MESSAGE)
    }

    /// Signature policy, if configured.
    pub fn signature(&self) -> SignatureConfig {
        self.global.signature.clone().unwrap_or_default()
    }

    /// Environment variable holding the push username.
    pub fn username_env(&self) -> &str {
        self.global
            .credentials
            .as_ref()
            .and_then(|c| c.username_env.as_deref())
            .unwrap_or(DEFAULT_USERNAME_ENV)
    }

    /// Environment variable holding the push token.
    pub fn token_env(&self) -> &str {
        self.global
            .credentials
            .as_ref()
            .and_then(|c| c.token_env.as_deref())
            .unwrap_or(DEFAULT_TOKEN_ENV)
    }

    /// Repositories listed in the global config.
    pub fn repos(&self) -> &[RepoEntry] {
        &self.global.repos
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_config(dir: &Path, contents: &str) {
        let path = Config::repo_config_path(dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn defaults_without_files() {
        let config = Config::default();
        assert_eq!(config.own_remote(), "origin");
        assert_eq!(config.upstream_remote(), "upstream");
        assert_eq!(config.branch(), "master");
        assert!(!config.keep_conflicts());
        assert_eq!(config.workers(), 1);
        assert_eq!(config.token_env(), "GITHUB_TOKEN");
        assert_eq!(config.username_env(), "GITHUB_USERNAME");
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "branch = \"main\"\nworkers = 3\n").unwrap();

        let loaded = Config::load(Some(&path)).unwrap().config;
        assert_eq!(loaded.branch(), "main");
        assert_eq!(loaded.workers(), 3);
        assert_eq!(loaded.global_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn repo_config_overrides_global() {
        let temp = TempDir::new().unwrap();
        write_repo_config(temp.path(), "branch = \"develop\"\nupstream_remote = \"source\"\n");

        let global = Config {
            global: GlobalConfig {
                branch: Some("main".into()),
                own_remote: Some("fork".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let scoped = global.for_repo(temp.path()).unwrap();
        assert!(scoped.warnings.is_empty());
        assert_eq!(scoped.config.branch(), "develop");
        assert_eq!(scoped.config.upstream_remote(), "source");
        // Not overridden by the repo file
        assert_eq!(scoped.config.own_remote(), "fork");
    }

    #[test]
    fn in_tree_config_warns() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".forksync.toml"), "branch = \"trunk\"").unwrap();

        let scoped = Config::default().for_repo(temp.path()).unwrap();
        assert_eq!(scoped.config.branch(), "trunk");
        assert_eq!(scoped.warnings.len(), 1);
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write_repo_config(temp.path(), "branch = \"main\"\nfrobnicate = true\n");
        assert!(matches!(
            Config::default().for_repo(temp.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_branch_rejected() {
        let temp = TempDir::new().unwrap();
        write_repo_config(temp.path(), "branch = \"bad..name\"");
        assert!(matches!(
            Config::default().for_repo(temp.path()),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
