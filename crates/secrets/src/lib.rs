//! Secret resolution contract for cfgprov
//!
//! A stream-processing worker resolves placeholders such as
//! `${secretsManager:prod/db:password}` in its configuration by asking a
//! [`ConfigProvider`] for the entries stored at a path. This crate holds the
//! provider-agnostic pieces of that contract:
//!
//! - [`ConfigProvider`]: what the host framework calls
//! - [`SecretStore`]: the seam a provider uses to reach a remote secret store
//! - [`ConfigData`]: resolved entries plus the TTL the host re-resolves after
//! - [`ProviderError`]: configuration and lookup failures
//! - [`parse`]: turning a secret body into a flat key/value map
//!
//! Provider implementations are in separate crates:
//! - cfgprov-aws: `AwsSecretsManagerProvider`, `AwsProviderConfig`

mod error;
pub mod parse;
mod types;

pub use error::{LookupErrorKind, ProviderError, Result, StoreError};
pub use parse::{ParseError, ParserMode, parse_secret_body};
pub use types::{ConfigData, SecretPayload, SecretRequest, SecureSecret};

use async_trait::async_trait;
use std::collections::HashSet;

/// Backend that fetches raw secret payloads by path.
///
/// Implementations classify their native failures into a [`StoreError`];
/// they never retry and never cache.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the current value of the secret at `path`.
    async fn get_secret_value(&self, path: &str) -> std::result::Result<SecretPayload, StoreError>;
}

/// Pluggable configuration provider called by the host framework.
///
/// The host resolves indirect configuration references at startup and again
/// whenever a returned [`ConfigData::ttl`] expires. Construction (the
/// `configure` step) belongs to each implementation, since it needs
/// provider-specific settings and usually async client setup.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider identifier used in logs and errors.
    ///
    /// Examples: `"aws"`
    fn provider_name(&self) -> &'static str;

    /// Resolve every entry stored at `path`.
    async fn get(&self, path: &str) -> Result<ConfigData> {
        self.get_keys(path, &HashSet::new()).await
    }

    /// Resolve the given entries stored at `path`.
    ///
    /// An empty `keys` set means every entry. If any requested key is absent,
    /// the whole call fails; partial results are never returned.
    async fn get_keys(&self, path: &str, keys: &HashSet<String>) -> Result<ConfigData>;

    /// Release the remote client. Calling it again is a no-op.
    fn close(&mut self);
}
