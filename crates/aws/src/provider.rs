//! AWS Secrets Manager configuration provider

use crate::client::{IdentityService, SecretsManagerStore, build_clients};
use crate::config::AwsProviderConfig;
use async_trait::async_trait;
use cfgprov_secrets::{
    ConfigData, ConfigProvider, LookupErrorKind, ProviderError, Result, SecretRequest, SecretStore,
    parse_secret_body,
};
use std::collections::{HashMap, HashSet};

const PROVIDER_NAME: &str = "aws";

/// Resolves configuration references against AWS Secrets Manager.
///
/// Every lookup is one `GetSecretValue` round trip: the body is parsed into a
/// flat map, filtered to the requested keys and returned with the configured
/// TTL. Nothing is cached and nothing is retried; the host framework decides
/// when to ask again.
///
/// The store is a type parameter so the lookup logic runs unchanged against
/// an in-memory [`SecretStore`] in tests.
pub struct AwsSecretsManagerProvider<S = SecretsManagerStore> {
    store: Option<S>,
    config: AwsProviderConfig,
}

impl<S> std::fmt::Debug for AwsSecretsManagerProvider<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerProvider")
            .field("region", &self.config.region())
            .field(
                "credentials",
                &if self.config.uses_ambient_credentials() {
                    "ambient"
                } else {
                    "static"
                },
            )
            .field("closed", &self.store.is_none())
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManagerProvider<SecretsManagerStore> {
    /// Validate raw settings and connect to Secrets Manager.
    ///
    /// Looks up the caller identity once so the log shows which principal and
    /// account the provider runs as. That lookup is diagnostic only: its
    /// failure is logged and configuration continues.
    ///
    /// # Errors
    /// Returns [`ProviderError::Configuration`] if the settings are invalid.
    pub async fn configure(settings: &HashMap<String, String>) -> Result<Self> {
        let config = AwsProviderConfig::from_settings(settings).inspect_err(|e| {
            tracing::error!(error = %e, "Failed to configure AWS Secrets Manager provider");
        })?;

        let (store, identity) = build_clients(&config).await;
        Ok(Self::connect(store, &identity, config).await)
    }
}

impl<S: SecretStore> AwsSecretsManagerProvider<S> {
    /// Create a provider around an already built store
    #[must_use]
    pub const fn new(store: S, config: AwsProviderConfig) -> Self {
        Self {
            store: Some(store),
            config,
        }
    }

    /// Create a provider and log which principal it authenticates as
    pub async fn connect<I>(store: S, identity: &I, config: AwsProviderConfig) -> Self
    where
        I: IdentityService + ?Sized,
    {
        match identity.caller_identity().await {
            Ok(caller) => tracing::info!(
                arn = caller.arn.as_deref().unwrap_or("<unknown>"),
                account = caller.account.as_deref().unwrap_or("<unknown>"),
                "AWS Secrets Manager provider connected"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "Unable to get information about caller identity"
            ),
        }
        Self::new(store, config)
    }

    /// Validated configuration
    #[must_use]
    pub const fn config(&self) -> &AwsProviderConfig {
        &self.config
    }

    /// Whether [`close`](ConfigProvider::close) has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.store.is_none()
    }

    /// Fetch, parse and filter one secret.
    ///
    /// # Errors
    /// Returns [`ProviderError::Lookup`] when the store fails, the body cannot
    /// be parsed, or a requested key is absent, and [`ProviderError::Closed`]
    /// after `close`.
    pub async fn fetch(&self, request: &SecretRequest) -> Result<ConfigData> {
        let path = request.path.as_str();
        let store = self.store.as_ref().ok_or(ProviderError::Closed {
            provider: PROVIDER_NAME,
        })?;

        tracing::debug!(path, keys = request.keys.len(), "Resolving secret");

        let payload = store.get_secret_value(path).await.map_err(|e| {
            log_store_failure(path, e.kind, &e.message);
            ProviderError::from_store(path, e)
        })?;

        tracing::debug!(
            path,
            arn = payload.arn.as_deref().unwrap_or("<unknown>"),
            name = payload.name.as_deref().unwrap_or("<unknown>"),
            "Processing secret"
        );

        let body = payload.secret_string.ok_or_else(|| {
            ProviderError::lookup(
                path,
                LookupErrorKind::UnsupportedPayload,
                "secret has no string value (may be binary)",
            )
        })?;

        let mut entries = parse_secret_body(self.config.parser(), &body).map_err(|e| {
            ProviderError::lookup(path, LookupErrorKind::UnsupportedPayload, e.to_string())
        })?;

        if request.wants_all() {
            return Ok(ConfigData::new(entries, self.config.secret_ttl()));
        }

        // Sorted so the reported missing key does not depend on set order
        let mut wanted: Vec<&String> = request.keys.iter().collect();
        wanted.sort();

        let mut selected = HashMap::with_capacity(wanted.len());
        for key in wanted {
            let value = entries.remove(key).ok_or_else(|| {
                tracing::error!(path, key = %key, "Key entry not found in secret");
                ProviderError::key_not_found(path, key)
            })?;
            selected.insert(key.clone(), value);
        }

        Ok(ConfigData::new(selected, self.config.secret_ttl()))
    }
}

fn log_store_failure(path: &str, kind: LookupErrorKind, message: &str) {
    match kind {
        LookupErrorKind::NotFound => {
            tracing::error!(path, cause = message, "Secret not found");
        }
        LookupErrorKind::Decryption => {
            tracing::error!(path, cause = message, "Unable to decrypt secret, check KMS permissions");
        }
        LookupErrorKind::Service => {
            tracing::error!(path, cause = message, "Service exception while querying for secret");
        }
        LookupErrorKind::Transport | LookupErrorKind::UnsupportedPayload => {
            tracing::error!(path, cause = message, kind = %kind, "Client exception while querying for secret");
        }
    }
}

#[async_trait]
impl<S: SecretStore> ConfigProvider for AwsSecretsManagerProvider<S> {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn get_keys(&self, path: &str, keys: &HashSet<String>) -> Result<ConfigData> {
        let request = SecretRequest {
            path: path.to_string(),
            keys: keys.clone(),
        };
        self.fetch(&request).await
    }

    fn close(&mut self) {
        if self.store.take().is_some() {
            tracing::debug!(region = self.config.region(), "AWS Secrets Manager provider closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CallerIdentity;
    use cfgprov_secrets::{ParserMode, SecretPayload, StoreError};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MemoryStore {
        secrets: HashMap<String, SecretPayload>,
        failures: HashMap<String, StoreError>,
        requests: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        fn with_secret(mut self, path: &str, body: &str) -> Self {
            self.secrets
                .insert(path.to_string(), SecretPayload::new(path, body));
            self
        }

        fn with_failure(mut self, path: &str, error: StoreError) -> Self {
            self.failures.insert(path.to_string(), error);
            self
        }
    }

    #[async_trait]
    impl SecretStore for MemoryStore {
        async fn get_secret_value(
            &self,
            path: &str,
        ) -> std::result::Result<SecretPayload, StoreError> {
            self.requests.lock().unwrap().push(path.to_string());
            if let Some(err) = self.failures.get(path) {
                return Err(err.clone());
            }
            self.secrets
                .get(path)
                .cloned()
                .ok_or_else(|| StoreError::not_found("Secrets Manager can't find the specified secret."))
        }
    }

    struct FixedIdentity(std::result::Result<CallerIdentity, StoreError>);

    #[async_trait]
    impl IdentityService for FixedIdentity {
        async fn caller_identity(&self) -> std::result::Result<CallerIdentity, StoreError> {
            self.0.clone()
        }
    }

    fn config() -> AwsProviderConfig {
        AwsProviderConfig::new("us-east-1")
            .unwrap()
            .with_secret_ttl(Duration::from_secs(300))
    }

    const CREDENTIALS: &str = r#"{"username":"alice","password":"s3cr3t"}"#;

    #[tokio::test]
    async fn test_fetch_all_keys_issues_one_request() {
        let store = MemoryStore::default().with_secret("prod/db", CREDENTIALS);
        let provider = AwsSecretsManagerProvider::new(store, config());

        let data = provider.fetch(&SecretRequest::all("prod/db")).await.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.ttl(), Duration::from_secs(300));

        let requests = provider.store.as_ref().unwrap().requests.lock().unwrap().clone();
        assert_eq!(requests, vec!["prod/db".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_key_reports_first_in_sorted_order() {
        let store = MemoryStore::default().with_secret("prod/db", CREDENTIALS);
        let provider = AwsSecretsManagerProvider::new(store, config());

        let err = provider
            .fetch(&SecretRequest::with_keys("prod/db", ["zeta", "alpha", "username"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("key 'alpha' not found at path 'prod/db'"));
    }

    #[tokio::test]
    async fn test_binary_secret_is_unsupported() {
        let mut store = MemoryStore::default();
        store.secrets.insert(
            "prod/cert".to_string(),
            SecretPayload {
                path: "prod/cert".to_string(),
                arn: None,
                name: None,
                secret_string: None,
            },
        );
        let provider = AwsSecretsManagerProvider::new(store, config());

        let err = provider.get("prod/cert").await.unwrap_err();
        assert_eq!(err.lookup_kind(), Some(LookupErrorKind::UnsupportedPayload));
        assert!(err.to_string().contains("prod/cert"));
    }

    #[tokio::test]
    async fn test_strict_parser_rejects_nested_values() {
        let store = MemoryStore::default().with_secret("prod/app", r#"{"db":{"user":"a"}}"#);
        let provider =
            AwsSecretsManagerProvider::new(store, config().with_parser(ParserMode::Json));

        let err = provider.get("prod/app").await.unwrap_err();
        assert_eq!(err.lookup_kind(), Some(LookupErrorKind::UnsupportedPayload));
        assert!(err.to_string().contains("'db'"));
    }

    #[tokio::test]
    async fn test_store_failures_keep_their_kind() {
        let store = MemoryStore::default()
            .with_failure("prod/down", StoreError::service("InternalServiceError"))
            .with_failure("prod/net", StoreError::transport("dispatch failure"));
        let provider = AwsSecretsManagerProvider::new(store, config());

        let err = provider.get("prod/down").await.unwrap_err();
        assert_eq!(err.lookup_kind(), Some(LookupErrorKind::Service));

        let err = provider.get("prod/net").await.unwrap_err();
        assert_eq!(err.lookup_kind(), Some(LookupErrorKind::Transport));
        assert!(err.to_string().contains("prod/net"));
    }

    #[tokio::test]
    async fn test_connect_survives_identity_failure() {
        let identity = FixedIdentity(Err(StoreError::transport("no route to sts")));
        let provider =
            AwsSecretsManagerProvider::connect(MemoryStore::default(), &identity, config()).await;
        assert!(!provider.is_closed());

        let identity = FixedIdentity(Ok(CallerIdentity {
            arn: Some("arn:aws:iam::123456789012:user/worker".to_string()),
            account: Some("123456789012".to_string()),
        }));
        let provider =
            AwsSecretsManagerProvider::connect(MemoryStore::default(), &identity, config()).await;
        assert_eq!(provider.config().region(), "us-east-1");
    }

    #[tokio::test]
    async fn test_lookup_after_close_fails() {
        let store = MemoryStore::default().with_secret("prod/db", CREDENTIALS);
        let mut provider = AwsSecretsManagerProvider::new(store, config());

        provider.close();
        provider.close();
        assert!(provider.is_closed());

        let err = provider.get("prod/db").await.unwrap_err();
        assert!(matches!(err, ProviderError::Closed { provider: "aws" }));
    }

    #[test]
    fn test_debug_shows_credential_source_only() {
        let provider = AwsSecretsManagerProvider::new(MemoryStore::default(), config());
        let debug = format!("{provider:?}");
        assert!(debug.contains("us-east-1"));
        assert!(debug.contains("ambient"));
    }
}
