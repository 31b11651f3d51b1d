//! Secrets Manager and STS clients

use crate::config::AwsProviderConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_secretsmanager::config::Credentials;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use cfgprov_secrets::{LookupErrorKind, SecretPayload, SecretStore, StoreError};
use secrecy::ExposeSecret;

/// Name the SDK reports for credentials taken from the provider settings
const STATIC_CREDENTIALS_SOURCE: &str = "cfgprov-static";

/// Load the shared SDK configuration for the configured region and
/// credential source.
pub async fn load_sdk_config(config: &AwsProviderConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region().to_string()));

    if let Some(credentials) = config.credentials() {
        tracing::debug!(
            access_key_id = credentials.access_key_id(),
            "Using static credentials from provider settings"
        );
        loader = loader.credentials_provider(Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key().expose_secret(),
            None,
            None,
            STATIC_CREDENTIALS_SOURCE,
        ));
    } else {
        tracing::debug!("Credentials will be resolved from environment, profile or instance role");
    }

    loader.load().await
}

/// Build the Secrets Manager client for `config`
pub async fn build_secret_client(config: &AwsProviderConfig) -> SecretsManagerStore {
    SecretsManagerStore::new(&load_sdk_config(config).await)
}

/// Build the STS client used to report which principal is authenticating
pub async fn build_identity_client(config: &AwsProviderConfig) -> StsIdentity {
    StsIdentity::new(&load_sdk_config(config).await)
}

/// Build both clients from a single SDK configuration load
pub async fn build_clients(config: &AwsProviderConfig) -> (SecretsManagerStore, StsIdentity) {
    let sdk_config = load_sdk_config(config).await;
    (SecretsManagerStore::new(&sdk_config), StsIdentity::new(&sdk_config))
}

/// [`SecretStore`] backed by AWS Secrets Manager `GetSecretValue`
#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    /// Create a store from a loaded SDK configuration
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret_value(&self, path: &str) -> Result<SecretPayload, StoreError> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(path)
            .send()
            .await
            .map_err(|e| classify_get_secret_error(&e))?;

        Ok(SecretPayload {
            path: path.to_string(),
            arn: response.arn().map(str::to_string),
            name: response.name().map(str::to_string),
            secret_string: response.secret_string().map(str::to_string),
        })
    }
}

/// Sort a `GetSecretValue` failure into a lookup category.
///
/// Missing secrets and KMS refusals get their own kinds; any other modeled
/// or unmodeled service answer is a service error, and everything that never
/// produced a service answer is a transport error.
pub fn classify_get_secret_error<R>(err: &SdkError<GetSecretValueError, R>) -> StoreError
where
    R: std::fmt::Debug,
{
    let kind = match err {
        SdkError::ServiceError(context) => match context.err() {
            GetSecretValueError::ResourceNotFoundException(_) => LookupErrorKind::NotFound,
            GetSecretValueError::DecryptionFailure(_) => LookupErrorKind::Decryption,
            _ => LookupErrorKind::Service,
        },
        _ => LookupErrorKind::Transport,
    };

    StoreError::new(kind, DisplayErrorContext(err).to_string())
}

/// Principal the provider authenticates as
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    /// ARN of the calling principal
    pub arn: Option<String>,
    /// Account the principal belongs to
    pub account: Option<String>,
}

/// Reports which principal the configured credentials resolve to.
///
/// Used only for a startup log line; failures never stop the provider.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Ask who the current credentials belong to
    async fn caller_identity(&self) -> Result<CallerIdentity, StoreError>;
}

/// [`IdentityService`] backed by STS `GetCallerIdentity`
#[derive(Debug, Clone)]
pub struct StsIdentity {
    client: aws_sdk_sts::Client,
}

impl StsIdentity {
    /// Create an STS client from a loaded SDK configuration
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityService for StsIdentity {
    async fn caller_identity(&self) -> Result<CallerIdentity, StoreError> {
        let response = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                let kind = match &e {
                    aws_sdk_sts::error::SdkError::ServiceError(_) => LookupErrorKind::Service,
                    _ => LookupErrorKind::Transport,
                };
                StoreError::new(kind, aws_sdk_sts::error::DisplayErrorContext(&e).to_string())
            })?;

        Ok(CallerIdentity {
            arn: response.arn().map(str::to_string),
            account: response.account().map(str::to_string),
        })
    }
}
