//! Request, payload and result types for secret resolution
//!
//! - [`SecureSecret`]: a resolved value that auto-zeros on drop
//! - [`SecretRequest`]: a path plus the keys wanted from it
//! - [`SecretPayload`]: the raw answer of a secret store
//! - [`ConfigData`]: the resolved key/value map handed back to the host

use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// A resolved secret value with automatic memory zeroing on drop.
///
/// Debug and Display output show `[REDACTED]`; call [`expose`](Self::expose)
/// to read the value.
#[derive(Clone)]
pub struct SecureSecret {
    inner: SecretString,
}

impl SecureSecret {
    /// Move a string into secure storage
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Expose the secret value for use.
    ///
    /// The caller must not log or persist the returned value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Get the length of the secret value without exposing it.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Check if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A single lookup: which secret, and which of its fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    /// Identifier of the remote secret (name or ARN)
    pub path: String,
    /// Requested field names; empty means every field
    pub keys: HashSet<String>,
}

impl SecretRequest {
    /// Request every field of the secret at `path`
    #[must_use]
    pub fn all(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            keys: HashSet::new(),
        }
    }

    /// Request only the given fields of the secret at `path`
    #[must_use]
    pub fn with_keys<I, K>(path: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            path: path.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether every field was requested
    #[must_use]
    pub fn wants_all(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Raw answer of a secret store for one path.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretPayload {
    /// Path the payload was fetched for
    pub path: String,
    /// Fully qualified identifier reported by the store
    pub arn: Option<String>,
    /// Friendly name reported by the store
    pub name: Option<String>,
    /// Secret body; `None` when the secret is stored as binary
    pub secret_string: Option<String>,
}

impl SecretPayload {
    /// Payload carrying a string body
    #[must_use]
    pub fn new(path: impl Into<String>, secret_string: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            arn: None,
            name: None,
            secret_string: Some(secret_string.into()),
        }
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretPayload")
            .field("path", &self.path)
            .field("arn", &self.arn)
            .field("name", &self.name)
            .field(
                "secret_string",
                &self.secret_string.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Resolved secret entries together with their validity lifetime.
///
/// The host framework substitutes the entries into its configuration and
/// re-resolves the path once `ttl` has elapsed.
#[derive(Clone)]
pub struct ConfigData {
    entries: HashMap<String, SecureSecret>,
    ttl: Duration,
}

impl ConfigData {
    /// Wrap plain values into secure storage
    #[must_use]
    pub fn new(entries: HashMap<String, String>, ttl: Duration) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k, SecureSecret::new(v)))
                .collect(),
            ttl,
        }
    }

    /// Get an entry by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecureSecret> {
        self.entries.get(key)
    }

    /// Check if an entry exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entry keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Validity lifetime of the entries
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Validity lifetime in milliseconds, saturating at `u64::MAX`
    #[must_use]
    pub fn ttl_ms(&self) -> u64 {
        u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX)
    }

    /// Convert to a plain map for substitution into the host configuration.
    ///
    /// This exposes every value; the result must not be logged.
    #[must_use]
    pub fn into_plain_map(self) -> HashMap<String, String> {
        self.entries
            .into_iter()
            .map(|(k, v)| (k, v.expose().to_string()))
            .collect()
    }
}

impl std::fmt::Debug for ConfigData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("ConfigData")
            .field("keys", &keys)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_secret_debug_is_redacted() {
        let secret = SecureSecret::new("my-super-secret-password".to_string());
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "my-super-secret-password");
        assert_eq!(secret.len(), 24);
    }

    #[test]
    fn test_request_with_no_keys_wants_all() {
        let request = SecretRequest::all("prod/db");
        assert!(request.wants_all());

        let request = SecretRequest::with_keys("prod/db", ["username"]);
        assert!(!request.wants_all());
        assert!(request.keys.contains("username"));
    }

    #[test]
    fn test_payload_debug_hides_body() {
        let payload = SecretPayload::new("prod/db", r#"{"password":"hunter2"}"#);
        let debug = format!("{payload:?}");
        assert!(debug.contains("prod/db"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_config_data_exposes_entries_and_ttl() {
        let data = ConfigData::new(
            HashMap::from([("username".to_string(), "alice".to_string())]),
            Duration::from_secs(60),
        );

        assert_eq!(data.len(), 1);
        assert!(data.contains("username"));
        assert_eq!(data.get("username").map(SecureSecret::expose), Some("alice"));
        assert_eq!(data.ttl_ms(), 60_000);

        let debug = format!("{data:?}");
        assert!(debug.contains("username"));
        assert!(!debug.contains("alice"));

        let plain = data.into_plain_map();
        assert_eq!(plain.get("username"), Some(&"alice".to_string()));
    }
}
