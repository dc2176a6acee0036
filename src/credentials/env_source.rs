//! credentials::env_source
//!
//! Credentials read from process environment variables.
//!
//! Variables are read at the moment a remote asks for credentials, never
//! earlier and never cached, so a token rotated between two repositories of
//! the same run is picked up.

use super::traits::{AllowedAuth, CredentialError, CredentialSource, Credentials};

/// Reads a username and token from two named environment variables.
///
/// When the username variable is unset, the username embedded in the
/// remote URL is used instead.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    username_var: String,
    token_var: String,
}

impl EnvCredentialSource {
    /// Create a source reading `username_var` and `token_var`.
    pub fn new(username_var: impl Into<String>, token_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            token_var: token_var.into(),
        }
    }

    fn read(var: &str) -> Option<String> {
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }
}

impl CredentialSource for EnvCredentialSource {
    fn credentials(
        &self,
        url: &str,
        username_from_url: Option<&str>,
        allowed: AllowedAuth,
    ) -> Result<Credentials, CredentialError> {
        if !allowed.user_pass && !allowed.ssh_key {
            return Err(CredentialError::Unsupported {
                url: url.to_string(),
            });
        }

        let username = Self::read(&self.username_var)
            .or_else(|| username_from_url.map(String::from))
            .ok_or_else(|| CredentialError::Missing(format!("${} is not set", self.username_var)))?;

        // SSH agent auth needs no token.
        if !allowed.user_pass {
            return Ok(Credentials::new(username, String::new()));
        }

        let token = Self::read(&self.token_var)
            .ok_or_else(|| CredentialError::Missing(format!("${} is not set", self.token_var)))?;

        Ok(Credentials::new(username, token))
    }
}
