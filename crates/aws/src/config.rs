//! Provider settings and their validation

use crate::region::is_known_region;
use cfgprov_secrets::{ParserMode, ProviderError, Result};
use secrecy::SecretString;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Region of the Secrets Manager endpoint, e.g. `us-east-1`
pub const REGION: &str = "cloud.region";
/// Access key id; overrides ambient credential discovery when non-blank
pub const ACCESS_KEY: &str = "cloud.access.key";
/// Secret access key paired with [`ACCESS_KEY`]
pub const ACCESS_SECRET: &str = "cloud.access.secret";
/// Validity lifetime of resolved secrets, in milliseconds
pub const SECRET_TTL_MS: &str = "cloud.secret.ttl.ms";
/// Secret body parser, `legacy` or `json`
pub const SECRET_PARSER: &str = "cloud.secret.parser";

/// TTL reported when [`SECRET_TTL_MS`] is not set (30 days)
pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// How much an option matters to a typical deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Must be reviewed for every deployment
    High,
    /// Usually left at its default
    Low,
}

/// Description of one recognized setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingDefinition {
    /// Setting key
    pub name: &'static str,
    /// Value type as the host framework understands it
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Default value, `None` when the setting is required
    pub default: Option<&'static str>,
    /// Relevance of the setting
    pub importance: Importance,
    /// Operator-facing documentation
    pub documentation: &'static str,
}

const DEFINITIONS: &[SettingDefinition] = &[
    SettingDefinition {
        name: REGION,
        kind: "string",
        default: None,
        importance: Importance::High,
        documentation: "The cloud region, for example 'us-east-1'. Mandatory.",
    },
    SettingDefinition {
        name: ACCESS_KEY,
        kind: "string",
        default: Some(""),
        importance: Importance::Low,
        documentation: "Access key id for AWS services. Use only when an instance role, task role or environment credentials are not suitable.",
    },
    SettingDefinition {
        name: ACCESS_SECRET,
        kind: "password",
        default: Some(""),
        importance: Importance::Low,
        documentation: "Secret access key. Required when 'cloud.access.key' is set, and only then.",
    },
    SettingDefinition {
        name: SECRET_TTL_MS,
        kind: "long",
        default: Some("2592000000"),
        importance: Importance::Low,
        documentation: "Time in ms during which a resolved secret is considered valid. When it expires the secret is fetched again. Default 30 days.",
    },
    SettingDefinition {
        name: SECRET_PARSER,
        kind: "string",
        default: Some("legacy"),
        importance: Importance::Low,
        documentation: "How secret bodies are parsed: 'legacy' for substring extraction, 'json' for strict flat JSON objects with string values.",
    },
];

/// All settings recognized by the provider
#[must_use]
pub const fn settings_definitions() -> &'static [SettingDefinition] {
    DEFINITIONS
}

/// Static access key pair supplied in the settings
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
}

impl StaticCredentials {
    /// Create a key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: SecretString) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key,
        }
    }

    /// Access key id; not secret and safe to log
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Secret access key
    #[must_use]
    pub const fn secret_access_key(&self) -> &SecretString {
        &self.secret_access_key
    }
}

/// Validated provider configuration.
///
/// Built once from the raw settings the host framework passes to the provider
/// and never changed afterwards.
#[derive(Debug, Clone)]
pub struct AwsProviderConfig {
    region: String,
    credentials: Option<StaticCredentials>,
    secret_ttl: Duration,
    parser: ParserMode,
}

impl AwsProviderConfig {
    /// Configuration using ambient credentials and default TTL and parser
    ///
    /// # Errors
    /// Returns a configuration error if `region` is not a recognized region.
    pub fn new(region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        validate_region(&region)?;
        Ok(Self {
            region,
            credentials: None,
            secret_ttl: DEFAULT_SECRET_TTL,
            parser: ParserMode::default(),
        })
    }

    /// Use a static key pair instead of ambient credential discovery
    #[must_use]
    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the TTL reported with resolved secrets
    #[must_use]
    pub fn with_secret_ttl(mut self, secret_ttl: Duration) -> Self {
        self.secret_ttl = secret_ttl;
        self
    }

    /// Override the secret body parser
    #[must_use]
    pub fn with_parser(mut self, parser: ParserMode) -> Self {
        self.parser = parser;
        self
    }

    /// Validate raw provider settings.
    ///
    /// Blank values count as absent. Unknown keys are ignored, since the host
    /// passes the provider's whole settings sub-tree. No network calls are
    /// made.
    ///
    /// # Errors
    /// Returns a configuration error when the region is missing or unknown,
    /// when only one half of the access key pair is given, or when the TTL or
    /// parser value is malformed.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<Self> {
        for key in settings.keys() {
            if !DEFINITIONS.iter().any(|def| def.name == key.as_str()) {
                tracing::debug!(key = %key, "Ignoring unrecognized provider setting");
            }
        }

        let region = non_blank(settings, REGION)
            .ok_or_else(|| ProviderError::configuration(format!("'{REGION}' must be set")))?;

        let mut config = Self::new(region)?;
        tracing::info!(region = %config.region, "AWS Secrets Manager provider region selected");

        match (non_blank(settings, ACCESS_KEY), raw_non_blank(settings, ACCESS_SECRET)) {
            (Some(access_key_id), Some(secret)) => {
                config.credentials = Some(StaticCredentials::new(
                    access_key_id,
                    SecretString::from(secret.to_string()),
                ));
            }
            (Some(_), None) => {
                return Err(ProviderError::configuration(format!(
                    "'{ACCESS_SECRET}' is required when '{ACCESS_KEY}' is set"
                )));
            }
            (None, Some(_)) => {
                return Err(ProviderError::configuration(format!(
                    "'{ACCESS_KEY}' is required when '{ACCESS_SECRET}' is set"
                )));
            }
            (None, None) => {}
        }

        if let Some(raw) = non_blank(settings, SECRET_TTL_MS) {
            let millis: u64 = raw.parse().map_err(|_| {
                ProviderError::configuration(format!(
                    "invalid value '{raw}' for '{SECRET_TTL_MS}': expected a non-negative integer"
                ))
            })?;
            config.secret_ttl = Duration::from_millis(millis);
        }

        if let Some(raw) = non_blank(settings, SECRET_PARSER) {
            config.parser = raw.parse().map_err(|e: String| {
                ProviderError::configuration(format!("invalid value for '{SECRET_PARSER}': {e}"))
            })?;
        }

        Ok(config)
    }

    /// Region the clients are bound to
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Static key pair, `None` for ambient credential discovery
    #[must_use]
    pub const fn credentials(&self) -> Option<&StaticCredentials> {
        self.credentials.as_ref()
    }

    /// Whether credentials come from the environment, profile or instance role
    #[must_use]
    pub const fn uses_ambient_credentials(&self) -> bool {
        self.credentials.is_none()
    }

    /// TTL reported with every resolved secret
    #[must_use]
    pub const fn secret_ttl(&self) -> Duration {
        self.secret_ttl
    }

    /// Secret body parser
    #[must_use]
    pub const fn parser(&self) -> ParserMode {
        self.parser
    }
}

fn validate_region(region: &str) -> Result<()> {
    if is_known_region(region) {
        Ok(())
    } else {
        tracing::error!(region = %region, "Invalid region specified");
        Err(ProviderError::configuration(format!(
            "invalid region '{region}' specified for '{REGION}'"
        )))
    }
}

fn non_blank<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Like [`non_blank`] but returns the value untrimmed
fn raw_non_blank<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}
