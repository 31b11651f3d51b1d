//! Command implementations

use crate::cli::{CliError, ProviderArgs};
use cfgprov_aws::{AwsSecretsManagerProvider, settings_definitions};
use cfgprov_secrets::{ConfigData, ConfigProvider};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

const REDACTED: &str = "[REDACTED]";

/// Output of `cfgprov resolve`
#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    path: &'a str,
    ttl_ms: u64,
    entries: BTreeMap<String, String>,
}

/// Configure the provider from `args`, resolve `keys` at `path` and render
/// the result as JSON.
///
/// # Errors
/// Returns a configuration error for invalid settings and a lookup error when
/// the secret cannot be resolved.
pub async fn resolve(
    args: ProviderArgs,
    path: &str,
    keys: &[String],
    show_values: bool,
) -> Result<String, CliError> {
    let settings = args.into_settings();
    tracing::debug!(path, keys = keys.len(), settings = settings.len(), "Resolving secret path");
    let mut provider = AwsSecretsManagerProvider::configure(&settings).await?;

    let keys: HashSet<String> = keys.iter().cloned().collect();
    let result = provider.get_keys(path, &keys).await;
    provider.close();

    if let Ok(data) = &result {
        tracing::debug!(path, entries = data.len(), "Resolved secret path");
    }

    render_resolved(path, result?, show_values)
}

/// Render resolved entries, redacting values unless `show_values` is set.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn render_resolved(path: &str, data: ConfigData, show_values: bool) -> Result<String, CliError> {
    let ttl_ms = data.ttl_ms();
    let entries: BTreeMap<String, String> = if show_values {
        data.into_plain_map().into_iter().collect()
    } else {
        data.keys()
            .map(|key| (key.clone(), REDACTED.to_string()))
            .collect()
    };

    Ok(serde_json::to_string_pretty(&ResolveOutput {
        path,
        ttl_ms,
        entries,
    })?)
}

/// Render the table of recognized settings as JSON.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn options() -> Result<String, CliError> {
    tracing::debug!("Listing provider settings");
    Ok(serde_json::to_string_pretty(settings_definitions())?)
}
