//! Configuration schema types.
//!
//! One struct per section. Every field has a default, so any section or
//! key may be omitted from a file. Unknown keys are rejected.

use serde::{Deserialize, Serialize};
use sluice_telemetry::{LogConfig, LogFormat};
use std::collections::BTreeMap;

fn default_true() -> bool {
    true
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `EnvFilter` directive (e.g. `info`, `warn,sluice_middleware=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into a subscriber configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ansi_enabled: self.ansi_enabled,
            include_location: self.include_location,
            span_events: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Header authentication section.
///
/// # Example
///
/// ```toml
/// [auth]
/// enabled = true
/// status_code = 401
///
/// [auth.required_headers]
/// Key = "123"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Register the header authentication unit.
    #[serde(default)]
    pub enabled: bool,

    /// Header name to required value. Names compare exactly.
    #[serde(default)]
    pub required_headers: BTreeMap<String, String>,

    /// Rejection status, `401` or `403`.
    #[serde(default = "default_auth_status")]
    pub status_code: u16,

    /// Rejection message. The unit's built-in message is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            required_headers: BTreeMap::new(),
            status_code: default_auth_status(),
            message: None,
        }
    }
}

fn default_auth_status() -> u16 {
    401
}

/// Catch-all cleanup section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CleanupConfig {
    /// Register the cleanup unit.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Embed the failed response in the stack trace.
    #[serde(default = "default_true")]
    pub include_response: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_response: true,
        }
    }
}

/// Static response headers section. The unit is registered when the map
/// is non-empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponseHeadersConfig {
    /// Header name to value.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Base64 body decoding section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BodyDecodingConfig {
    /// Register the body decoding unit.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for BodyDecodingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Error envelope section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ErrorResponseConfig {
    /// Register the error envelope unit.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Render server-class errors too. Development only.
    #[serde(default)]
    pub expose_internal_errors: bool,
}

impl Default for ErrorResponseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expose_internal_errors: false,
        }
    }
}
