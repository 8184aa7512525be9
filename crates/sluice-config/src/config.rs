//! Main configuration types.
//!
//! This module provides the top-level [`SluiceConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{
    AuthConfig, BodyDecodingConfig, CleanupConfig, ConfigError, ErrorResponseConfig,
    LoggingConfig, ResponseHeadersConfig,
};

/// Complete pipeline configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use sluice_config::SluiceConfig;
///
/// let config = SluiceConfig::default();
/// assert!(config.cleanup.enabled);
/// assert!(!config.auth.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SluiceConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Header authentication.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Catch-all error handling.
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Static response headers.
    #[serde(default)]
    pub response_headers: ResponseHeadersConfig,

    /// Base64 body decoding.
    #[serde(default)]
    pub body_decoding: BodyDecodingConfig,

    /// Error envelope rendering.
    #[serde(default)]
    pub error_response: ErrorResponseConfig,
}

impl SluiceConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_config::{AuthConfig, SluiceConfig};
    ///
    /// let config = SluiceConfig::builder()
    ///     .auth(AuthConfig {
    ///         enabled: true,
    ///         required_headers: [("Key".to_string(), "123".to_string())].into(),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.auth.enabled);
    /// ```
    #[must_use]
    pub fn builder() -> SluiceConfigBuilder {
        SluiceConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `logging.level` is not a valid filter directive
    /// - `auth.status_code` is neither 401 nor 403
    /// - a header name in `auth` or `response_headers` is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            sluice_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if !matches!(self.auth.status_code, 401 | 403) {
            return Err(ConfigError::invalid_value(
                "auth.status_code",
                format!("must be 401 or 403, got {}", self.auth.status_code),
            ));
        }

        if self.auth.enabled && self.auth.required_headers.is_empty() {
            return Err(ConfigError::validation_error(
                "auth.required_headers must not be empty when auth is enabled",
            ));
        }

        validate_header_names("auth.required_headers", self.auth.required_headers.keys())?;
        validate_header_names("response_headers.headers", self.response_headers.headers.keys())?;

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level
    /// - Server-class errors rendered as envelopes
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_config::SluiceConfig;
    ///
    /// let config = SluiceConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = sluice_telemetry::LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.error_response.expose_internal_errors = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Server-class errors left to the catch-all
    /// - Stack traces without the failed response body
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_config::SluiceConfig;
    ///
    /// let config = SluiceConfig::production();
    /// assert_eq!(config.logging.format, sluice_telemetry::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = sluice_telemetry::LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.error_response.expose_internal_errors = false;
        config.cleanup.include_response = false;

        config
    }
}

fn validate_header_names<'a>(
    field: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> Result<(), ConfigError> {
    for name in names {
        if name.trim().is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_value(
                field,
                format!("invalid header name '{name}'"),
            ));
        }
    }
    Ok(())
}

/// Builder for [`SluiceConfig`].
#[derive(Debug, Default)]
pub struct SluiceConfigBuilder {
    logging: Option<LoggingConfig>,
    auth: Option<AuthConfig>,
    cleanup: Option<CleanupConfig>,
    response_headers: Option<ResponseHeadersConfig>,
    body_decoding: Option<BodyDecodingConfig>,
    error_response: Option<ErrorResponseConfig>,
}

impl SluiceConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the authentication configuration.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the cleanup configuration.
    #[must_use]
    pub fn cleanup(mut self, cleanup: CleanupConfig) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set the response headers configuration.
    #[must_use]
    pub fn response_headers(mut self, response_headers: ResponseHeadersConfig) -> Self {
        self.response_headers = Some(response_headers);
        self
    }

    /// Set the body decoding configuration.
    #[must_use]
    pub fn body_decoding(mut self, body_decoding: BodyDecodingConfig) -> Self {
        self.body_decoding = Some(body_decoding);
        self
    }

    /// Set the error response configuration.
    #[must_use]
    pub fn error_response(mut self, error_response: ErrorResponseConfig) -> Self {
        self.error_response = Some(error_response);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> SluiceConfig {
        SluiceConfig {
            logging: self.logging.unwrap_or_default(),
            auth: self.auth.unwrap_or_default(),
            cleanup: self.cleanup.unwrap_or_default(),
            response_headers: self.response_headers.unwrap_or_default(),
            body_decoding: self.body_decoding.unwrap_or_default(),
            error_response: self.error_response.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<SluiceConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
