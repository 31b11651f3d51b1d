//! AWS Secrets Manager provider for cfgprov
//!
//! Resolves `${secretsManager:<path>:<key>}` style references in a worker's
//! configuration against AWS Secrets Manager:
//! - Settings validation and client construction via the [`config`] and
//!   [`client`] modules
//! - Secret lookups via [`AwsSecretsManagerProvider`]

pub mod client;
pub mod config;
mod provider;
pub mod region;

// Re-export main types for convenience
pub use client::{
    CallerIdentity, IdentityService, SecretsManagerStore, StsIdentity, build_clients,
    build_identity_client, build_secret_client,
};
pub use config::{AwsProviderConfig, StaticCredentials, settings_definitions};
pub use provider::AwsSecretsManagerProvider;
