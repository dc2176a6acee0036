//! credentials::traits
//!
//! Credential source trait and the owned credential value it produces.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secrets in error messages
//! - Never persist what they hand out
//! - Be thread-safe (Send + Sync), since one source serves every pipeline

use thiserror::Error;

/// Errors from credential lookup.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// A required value is not set.
    #[error("credential not available: {0}")]
    Missing(String),

    /// The remote asked for an authentication type this source cannot supply.
    #[error("unsupported authentication type requested by {url}")]
    Unsupported {
        /// URL of the remote asking for credentials
        url: String,
    },
}

/// Authentication types a remote is willing to accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowedAuth {
    /// Username plus password/token over HTTPS
    pub user_pass: bool,
    /// SSH key (from an agent)
    pub ssh_key: bool,
}

/// A username/token pair handed to a single push.
///
/// The value is owned: each authentication request gets a fresh copy and
/// drops it when the request is answered. `Debug` never shows the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// Create credentials from a username and token.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The token. Do not log or print it.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of push credentials, consulted lazily when a remote asks.
///
/// # Example
///
/// ```
/// use forksync::credentials::{AllowedAuth, CredentialError, CredentialSource, Credentials};
///
/// struct Fixed;
///
/// impl CredentialSource for Fixed {
///     fn credentials(
///         &self,
///         _url: &str,
///         _username_from_url: Option<&str>,
///         _allowed: AllowedAuth,
///     ) -> Result<Credentials, CredentialError> {
///         Ok(Credentials::new("bot", "s3cret"))
///     }
/// }
///
/// let creds = Fixed.credentials("https://example.com/x.git", None, AllowedAuth::default());
/// assert_eq!(creds.unwrap().username(), "bot");
/// ```
pub trait CredentialSource: Send + Sync {
    /// Produce credentials for `url`.
    ///
    /// `username_from_url` is the user embedded in the URL, if any.
    fn credentials(
        &self,
        url: &str,
        username_from_url: Option<&str>,
        allowed: AllowedAuth,
    ) -> Result<Credentials, CredentialError>;
}

/// A source that never has credentials.
///
/// Useful for local or anonymous remotes; any authentication request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn credentials(
        &self,
        url: &str,
        _username_from_url: Option<&str>,
        _allowed: AllowedAuth,
    ) -> Result<Credentials, CredentialError> {
        Err(CredentialError::Missing(format!("no credentials for {url}")))
    }
}
