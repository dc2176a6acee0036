//! credentials
//!
//! Push-time credential lookup.
//!
//! # Architecture
//!
//! The publish step never reads credentials from the repository or from
//! disk. It holds a [`CredentialSource`] and asks it for an owned
//! [`Credentials`] value each time the remote requests authentication:
//!
//! - [`EnvCredentialSource`]: reads two environment variables (default)
//! - [`NoCredentials`]: for local or anonymous remotes
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - `Credentials` redacts its token in `Debug` output
//! - Nothing is persisted

mod env_source;
mod traits;

pub use env_source::EnvCredentialSource;
pub use traits::{AllowedAuth, CredentialError, CredentialSource, Credentials, NoCredentials};
