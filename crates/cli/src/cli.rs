//! Command-line definitions and error mapping

use cfgprov_aws::config::{ACCESS_KEY, ACCESS_SECRET, REGION, SECRET_PARSER, SECRET_TTL_MS};
use cfgprov_secrets::ProviderError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use std::collections::HashMap;
use std::io::{self, Write};
use thiserror::Error;

/// Exit code for success
pub const EXIT_OK: u8 = 0;
/// Invalid flags or provider settings
pub const EXIT_CONFIG: u8 = 2;
/// The secret could not be resolved
pub const EXIT_LOOKUP: u8 = 3;

/// CLI error types with exit code mapping
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Invalid flags or provider settings (exit code 2)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cfgprov::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Resolution failed (exit code 3)
    #[error("Lookup error: {message}")]
    #[diagnostic(code(cfgprov::cli::lookup))]
    Lookup {
        /// The error message
        message: String,
    },
    /// Anything else (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(cfgprov::cli::other))]
    Other {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an unexpected error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<ProviderError> for CliError {
    fn from(err: ProviderError) -> Self {
        match err {
            // Keep only the message to avoid "Configuration error: Configuration error:"
            ProviderError::Configuration { message } => Self::config_with_help(
                message,
                format!("Run `cfgprov options` to list settings, e.g. --region or --set {REGION}=us-east-1"),
            ),
            other => Self::Lookup {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::other(format!("failed to render output: {err}"))
    }
}

/// Map CLI error to its exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> u8 {
    match err {
        CliError::Config { .. } => EXIT_CONFIG,
        CliError::Lookup { .. } | CliError::Other { .. } => EXIT_LOOKUP,
    }
}

/// Print the error with miette's human-friendly report
#[allow(clippy::print_stderr)]
pub fn render_error(err: CliError) {
    let report = Report::new(err);
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Logging verbosity
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose
    Trace,
    /// Lookup progress and credential source
    Debug,
    /// Region and caller identity
    Info,
    /// Only problems
    #[default]
    Warn,
    /// Only failures
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Resolve configuration secrets the way a worker's provider would.
#[derive(Parser, Debug)]
#[command(name = "cfgprov")]
#[command(about = "Resolve configuration secrets from AWS Secrets Manager")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity; `RUST_LOG` takes precedence when set.
    #[arg(
        short = 'L',
        long,
        global = true,
        default_value = "warn",
        value_enum,
        help = "Set logging level"
    )]
    pub level: LogLevel,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the entries stored at a secret path.
    #[command(about = "Resolve the entries stored at a secret path")]
    Resolve {
        /// Provider settings.
        #[command(flatten)]
        provider: ProviderArgs,

        /// Secret name or ARN.
        #[arg(value_name = "PATH")]
        path: String,

        /// Keys to resolve; every key when omitted.
        #[arg(value_name = "KEY")]
        keys: Vec<String>,

        /// Print resolved values instead of `[REDACTED]`.
        #[arg(long, help = "Print resolved values instead of [REDACTED]")]
        show_values: bool,
    },

    /// List the settings the provider understands.
    #[command(about = "List the settings the provider understands")]
    Options,
}

/// Provider settings, each also readable from the environment.
#[derive(Args, Debug, Default)]
pub struct ProviderArgs {
    /// Region of the Secrets Manager endpoint.
    #[arg(long, env = "CFGPROV_REGION")]
    pub region: Option<String>,

    /// Static access key id.
    #[arg(long, env = "CFGPROV_ACCESS_KEY")]
    pub access_key: Option<String>,

    /// Static secret access key.
    #[arg(long, env = "CFGPROV_ACCESS_SECRET", hide_env_values = true)]
    pub access_secret: Option<String>,

    /// TTL reported with resolved secrets, in milliseconds.
    #[arg(long, env = "CFGPROV_SECRET_TTL_MS")]
    pub secret_ttl_ms: Option<String>,

    /// Secret body parser, `legacy` or `json`.
    #[arg(long, env = "CFGPROV_SECRET_PARSER")]
    pub secret_parser: Option<String>,

    /// Raw provider setting; applied after the flags above.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_setting)]
    pub overrides: Vec<(String, String)>,
}

impl ProviderArgs {
    /// Build the raw settings map the provider validates
    #[must_use]
    pub fn into_settings(self) -> HashMap<String, String> {
        let mut settings = HashMap::new();
        for (key, value) in [
            (REGION, self.region),
            (ACCESS_KEY, self.access_key),
            (ACCESS_SECRET, self.access_secret),
            (SECRET_TTL_MS, self.secret_ttl_ms),
            (SECRET_PARSER, self.secret_parser),
        ] {
            if let Some(value) = value {
                settings.insert(key.to_string(), value);
            }
        }
        settings.extend(self.overrides);
        settings
    }
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("setting key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse command-line arguments
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgprov_secrets::LookupErrorKind;

    const ENV_VARS: [&str; 5] = [
        "CFGPROV_REGION",
        "CFGPROV_ACCESS_KEY",
        "CFGPROV_ACCESS_SECRET",
        "CFGPROV_SECRET_TTL_MS",
        "CFGPROV_SECRET_PARSER",
    ];

    fn parse_clean(args: &[&str]) -> Cli {
        temp_env::with_vars_unset(ENV_VARS, || Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_resolve_flags_become_settings() {
        let cli = parse_clean(&[
            "cfgprov",
            "resolve",
            "--region",
            "us-east-1",
            "--secret-ttl-ms",
            "1000",
            "--set",
            "cloud.secret.parser=json",
            "prod/db",
            "username",
            "password",
        ]);

        let Commands::Resolve {
            provider,
            path,
            keys,
            show_values,
        } = cli.command
        else {
            panic!("expected resolve command");
        };
        assert_eq!(path, "prod/db");
        assert_eq!(keys, vec!["username", "password"]);
        assert!(!show_values);

        let settings = provider.into_settings();
        assert_eq!(settings.get(REGION).map(String::as_str), Some("us-east-1"));
        assert_eq!(settings.get(SECRET_TTL_MS).map(String::as_str), Some("1000"));
        assert_eq!(settings.get(SECRET_PARSER).map(String::as_str), Some("json"));
        assert!(!settings.contains_key(ACCESS_KEY));
    }

    #[test]
    fn test_settings_are_read_from_environment() {
        temp_env::with_vars(
            [
                ("CFGPROV_REGION", Some("eu-west-1")),
                ("CFGPROV_ACCESS_KEY", Some("AKIAEXAMPLE")),
                ("CFGPROV_ACCESS_SECRET", Some("wJalrXUtnFEMI")),
            ],
            || {
                let cli = Cli::try_parse_from(["cfgprov", "resolve", "prod/db"]).unwrap();
                let Commands::Resolve { provider, .. } = cli.command else {
                    panic!("expected resolve command");
                };
                let settings = provider.into_settings();
                assert_eq!(settings.get(REGION).map(String::as_str), Some("eu-west-1"));
                assert_eq!(settings.get(ACCESS_KEY).map(String::as_str), Some("AKIAEXAMPLE"));
                assert_eq!(
                    settings.get(ACCESS_SECRET).map(String::as_str),
                    Some("wJalrXUtnFEMI")
                );
            },
        );
    }

    #[test]
    fn test_set_overrides_win_over_flags() {
        let cli = parse_clean(&[
            "cfgprov",
            "resolve",
            "--region",
            "us-east-1",
            "--set",
            "cloud.region=us-west-2",
            "prod/db",
        ]);
        let Commands::Resolve { provider, .. } = cli.command else {
            panic!("expected resolve command");
        };
        let settings = provider.into_settings();
        assert_eq!(settings.get(REGION).map(String::as_str), Some("us-west-2"));
    }

    #[test]
    fn test_malformed_set_is_rejected() {
        assert!(parse_setting("no-equals").is_err());
        assert!(parse_setting("=value").is_err());
        assert_eq!(
            parse_setting("a.b=c=d"),
            Ok(("a.b".to_string(), "c=d".to_string()))
        );
    }

    #[test]
    fn test_provider_errors_map_to_exit_codes() {
        let err = CliError::from(ProviderError::configuration("invalid region 'x'"));
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
        assert_eq!(err.to_string(), "Configuration error: invalid region 'x'");

        let err = CliError::from(ProviderError::lookup(
            "prod/db",
            LookupErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(exit_code_for(&err), EXIT_LOOKUP);
        assert!(err.to_string().contains("prod/db"));
    }

    #[test]
    fn test_default_log_level_is_warn() {
        let cli = parse_clean(&["cfgprov", "options"]);
        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.level.as_directive(), "warn");
    }
}
