//! Error types shared by every cfgprov provider

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failed secret lookup.
///
/// Remote failures of every flavour are reported through
/// [`ProviderError::Lookup`]; the kind preserves what actually went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    /// The secret path does not exist, or a requested key is absent from it
    NotFound,
    /// The key-management service refused to decrypt the secret
    Decryption,
    /// The secret store reported a service-side failure
    Service,
    /// The request never got a usable answer (network, timeout, client setup)
    Transport,
    /// The secret exists but its body cannot be turned into a flat string map
    UnsupportedPayload,
}

impl LookupErrorKind {
    /// Short, stable label used in messages and log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Decryption => "decryption failure",
            Self::Service => "service error",
            Self::Transport => "transport error",
            Self::UnsupportedPayload => "unsupported payload",
        }
    }
}

impl std::fmt::Display for LookupErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`SecretStore`](crate::SecretStore) backend.
///
/// Backends classify their native failures into a [`LookupErrorKind`] and keep
/// the original message for diagnostics. The provider attaches the path when
/// converting it into a [`ProviderError`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct StoreError {
    /// Failure category
    pub kind: LookupErrorKind,
    /// Message of the underlying cause
    pub message: String,
}

impl StoreError {
    /// Create a store error of the given kind
    pub fn new(kind: LookupErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The requested secret does not exist
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::NotFound, message)
    }

    /// The secret could not be decrypted
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Decryption, message)
    }

    /// The store failed on its side
    pub fn service(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Service, message)
    }

    /// The store could not be reached
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LookupErrorKind::Transport, message)
    }
}

/// Main error type for configuration providers
#[derive(Error, Debug, Diagnostic)]
pub enum ProviderError {
    /// Missing or invalid provider settings, detected while configuring
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cfgprov::config::invalid))]
    Configuration {
        /// What is wrong with the settings
        message: String,
    },

    /// A secret could not be resolved
    #[error("Failed to resolve secret at path '{path}' ({kind}): {message}")]
    #[diagnostic(code(cfgprov::lookup::failed))]
    Lookup {
        /// Secret path that was requested
        path: String,
        /// Failure category
        kind: LookupErrorKind,
        /// Message of the original cause
        message: String,
    },

    /// The provider was used after `close`
    #[error("Provider '{provider}' has been closed")]
    #[diagnostic(
        code(cfgprov::closed),
        help("configure a new provider instance instead of reusing a closed one")
    )]
    Closed {
        /// Provider name
        provider: &'static str,
    },
}

impl ProviderError {
    /// Create a configuration error with a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a lookup error for a path
    pub fn lookup(path: impl Into<String>, kind: LookupErrorKind, message: impl Into<String>) -> Self {
        Self::Lookup {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// A requested key is missing from an otherwise resolved secret
    pub fn key_not_found(path: &str, key: &str) -> Self {
        Self::lookup(
            path,
            LookupErrorKind::NotFound,
            format!("key '{key}' not found at path '{path}'"),
        )
    }

    /// Attach the requested path to a backend failure
    pub fn from_store(path: impl Into<String>, error: StoreError) -> Self {
        Self::lookup(path, error.kind, error.message)
    }

    /// Lookup category, if this is a lookup failure
    #[must_use]
    pub const fn lookup_kind(&self) -> Option<LookupErrorKind> {
        match self {
            Self::Lookup { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether this error was raised while validating settings
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
