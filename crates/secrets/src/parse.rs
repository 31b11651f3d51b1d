//! Secret body parsing
//!
//! Secret stores hand back a JSON object as one string. Two parsers turn it
//! into a flat `key -> value` map:
//!
//! - [`ParserMode::Legacy`] reproduces the substring-based extraction earlier
//!   deployments rely on, including its mis-handling of commas inside values
//!   and of non-string fields.
//! - [`ParserMode::Json`] decodes the body as a real JSON object and rejects
//!   anything that is not a string field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// How secret bodies are turned into key/value maps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserMode {
    /// Substring extraction, compatible with existing deployments
    #[default]
    Legacy,
    /// Strict JSON object decoding restricted to string values
    Json,
}

impl ParserMode {
    /// Setting value for this mode
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ParserMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown secret parser '{other}', expected 'legacy' or 'json'"
            )),
        }
    }
}

/// Why a body was rejected by the strict parser
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not valid JSON
    #[error("secret body is not valid JSON: {0}")]
    InvalidJson(String),

    /// The body is valid JSON but not an object
    #[error("secret body is a JSON {found}, expected an object")]
    NotAnObject {
        /// JSON type that was found
        found: &'static str,
    },

    /// A field holds something other than a string
    #[error("field '{key}' holds a JSON {found}, only string values are supported")]
    NonStringField {
        /// Offending field
        key: String,
        /// JSON type that was found
        found: &'static str,
    },
}

/// Parse a secret body with the given mode.
///
/// # Errors
///
/// Only [`ParserMode::Json`] can fail; the legacy parser accepts any input.
pub fn parse_secret_body(
    mode: ParserMode,
    body: &str,
) -> Result<HashMap<String, String>, ParseError> {
    match mode {
        ParserMode::Legacy => Ok(parse_legacy(body)),
        ParserMode::Json => parse_json(body),
    }
}

/// Substring-based extraction of `"key":"value"` pairs.
///
/// Takes the text after the first `{` and before the last `}`, splits it on
/// `,` (dropping empty tokens), and for every token reads the key between the
/// first `"` and the first `":`, and the value between the first `:"` and the
/// next `"`. A comma inside a quoted value splits the pair in two, and fields
/// that are not JSON strings come out empty or truncated.
#[must_use]
pub fn parse_legacy(body: &str) -> HashMap<String, String> {
    let after_open = substring_after(body, "{");
    let inner = after_open
        .rfind('}')
        .map_or(after_open, |end| &after_open[..end]);

    inner
        .split(',')
        .filter(|token| !token.is_empty())
        .map(|pair| {
            tracing::trace!(len = pair.len(), "Processing secret pair");
            let key = substring_after(substring_before(pair, "\":"), "\"");
            let value = substring_before(substring_after(pair, ":\""), "\"");
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Strict decoding of a flat JSON object with string values.
///
/// # Errors
///
/// Fails on invalid JSON, a non-object body, or any non-string field.
pub fn parse_json(body: &str) -> Result<HashMap<String, String>, ParseError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(ParseError::NotAnObject {
            found: json_type(&value),
        });
    };

    fields
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            other => Err(ParseError::NonStringField {
                key,
                found: json_type(&other),
            }),
        })
        .collect()
}

/// Text after the first `sep`, or empty when `sep` is absent
fn substring_after<'a>(s: &'a str, sep: &str) -> &'a str {
    s.find(sep).map_or("", |idx| &s[idx + sep.len()..])
}

/// Text before the first `sep`, or all of `s` when `sep` is absent
fn substring_before<'a>(s: &'a str, sep: &str) -> &'a str {
    s.find(sep).map_or(s, |idx| &s[..idx])
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
