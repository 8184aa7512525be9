//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, SluiceConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values or a preset
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// A file replaces the whole configuration; keys it omits take their
/// default values, not the preset's.
///
/// # Example
///
/// ```no_run
/// use sluice_config::ConfigLoader;
///
/// # fn main() -> Result<(), sluice_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("sluice.toml")?
///     .with_env_prefix("SLUICE")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: SluiceConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SluiceConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` starts from, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SluiceConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = SluiceConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = SluiceConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format
    /// (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [auth]
    ///     enabled = true
    ///     required_headers = { Key = "123" }
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.auth.enabled);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example:
    /// - `SLUICE__LOGGING__LEVEL=debug`
    /// - `SLUICE__AUTH__REQUIRED_HEADERS=Key=123,Tenant=acme`
    /// - `SLUICE__CLEANUP__INCLUDE_RESPONSE=false`
    ///
    /// Header maps are given as comma-separated `Name=value` pairs and
    /// replace the loaded map.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file into the process environment.
    ///
    /// A missing `.env` file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::validation_error(format!(
                "failed to load .env file: {e}"
            ))),
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override cannot be parsed or validation
    /// fails.
    pub fn load(mut self) -> Result<SluiceConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without applying overrides or validating.
    #[must_use]
    pub fn load_unvalidated(self) -> SluiceConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<SluiceConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let section_prefix = format!("{prefix}__");
        let vars: BTreeMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(&section_prefix))
            .collect();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let bool_value = || {
            parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
        };

        match parts.as_slice() {
            // Logging section
            ["LOGGING", "ENABLED"] => self.config.logging.enabled = bool_value()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "ANSI_ENABLED"] => self.config.logging.ansi_enabled = bool_value()?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = bool_value()?;
            }

            // Auth section
            ["AUTH", "ENABLED"] => self.config.auth.enabled = bool_value()?,
            ["AUTH", "STATUS_CODE"] => {
                self.config.auth.status_code = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["AUTH", "MESSAGE"] => {
                self.config.auth.message = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["AUTH", "REQUIRED_HEADERS"] => {
                self.config.auth.required_headers = parse_header_list(key, value)?;
            }

            // Cleanup section
            ["CLEANUP", "ENABLED"] => self.config.cleanup.enabled = bool_value()?,
            ["CLEANUP", "INCLUDE_RESPONSE"] => {
                self.config.cleanup.include_response = bool_value()?;
            }

            // Response headers section
            ["RESPONSE_HEADERS", "HEADERS"] => {
                self.config.response_headers.headers = parse_header_list(key, value)?;
            }

            // Body decoding section
            ["BODY_DECODING", "ENABLED"] => self.config.body_decoding.enabled = bool_value()?,

            // Error response section
            ["ERROR_RESPONSE", "ENABLED"] => self.config.error_response.enabled = bool_value()?,
            ["ERROR_RESPONSE", "EXPOSE_INTERNAL_ERRORS"] => {
                self.config.error_response.expose_internal_errors = bool_value()?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `Name=value,Other=value` into a header map. Names keep their case.
fn parse_header_list(key: &str, value: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(name, v)| (name.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| ConfigError::env_parse_error(key, "expected 'Name=value' pairs"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_telemetry::LogFormat;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, SluiceConfig::default());
    }

    #[test]
    fn test_loader_with_defaults() {
        let config = ConfigLoader::new()
            .with_development()
            .with_defaults()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_loader_with_presets() {
        let dev = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(dev.logging.format, LogFormat::Pretty);

        let prod = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(!prod.cleanup.include_response);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [auth]
            enabled = true
            status_code = 403

            [auth.required_headers]
            Key = "123"

            [response_headers.headers]
            X-Frame-Options = "DENY"
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.auth.status_code, 403);
        assert_eq!(config.auth.required_headers["Key"], "123");
        assert_eq!(config.response_headers.headers["X-Frame-Options"], "DENY");
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"cleanup": {"include_response": false}, "logging": {"level": "warn"}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();

        assert!(!config.cleanup.include_response);
        assert!(config.cleanup.enabled);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("a: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[body_decoding]\nenabled = false").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert!(!config.body_decoding.enabled);
    }

    #[test]
    fn test_loader_with_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"error_response": {{"expose_internal_errors": true}}}}"#).unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert!(config.error_response.expose_internal_errors);
    }

    #[test]
    fn test_loader_with_file_unknown_field() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cleanup]\nverbose = true").unwrap();

        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_with_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/sluice.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/sluice.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, SluiceConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[auth]\nstatus_code = 418", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_loader_load_unvalidated() {
        let config = ConfigLoader::new()
            .with_string("[auth]\nstatus_code = 418", "toml")
            .unwrap()
            .load_unvalidated();

        assert_eq!(config.auth.status_code, 418);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_dotenv_without_file() {
        assert!(ConfigLoader::new().with_dotenv().is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("No"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_parse_header_list() {
        let headers = parse_header_list("K", "Key=123, Tenant = acme ,").unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Key"], "123");
        assert_eq!(headers["Tenant"], "acme");

        assert!(parse_header_list("K", "").unwrap().is_empty());
        assert!(parse_header_list("K", "Key").is_err());
    }

    // Overrides are exercised through apply_env_var directly; mutating the
    // process environment would race with other tests.

    #[test]
    fn test_apply_env_var_logging() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__LOGGING__LEVEL", "debug", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__FORMAT", "pretty", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__ANSI_ENABLED", "yes", "TEST").unwrap();
        loader.apply_env_var("TEST__LOGGING__INCLUDE_LOCATION", "1", "TEST").unwrap();

        assert_eq!(loader.config.logging.level, "debug");
        assert_eq!(loader.config.logging.format, LogFormat::Pretty);
        assert!(loader.config.logging.ansi_enabled);
        assert!(loader.config.logging.include_location);
    }

    #[test]
    fn test_apply_env_var_auth() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__AUTH__ENABLED", "true", "TEST").unwrap();
        loader.apply_env_var("TEST__AUTH__REQUIRED_HEADERS", "Key=123", "TEST").unwrap();
        loader.apply_env_var("TEST__AUTH__STATUS_CODE", "403", "TEST").unwrap();
        loader.apply_env_var("TEST__AUTH__MESSAGE", "denied", "TEST").unwrap();

        let auth = &loader.config.auth;
        assert!(auth.enabled);
        assert_eq!(auth.required_headers["Key"], "123");
        assert_eq!(auth.status_code, 403);
        assert_eq!(auth.message.as_deref(), Some("denied"));
    }

    #[test]
    fn test_apply_env_var_units() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__CLEANUP__INCLUDE_RESPONSE", "off", "TEST").unwrap();
        loader.apply_env_var("TEST__BODY_DECODING__ENABLED", "false", "TEST").unwrap();
        loader.apply_env_var("TEST__ERROR_RESPONSE__EXPOSE_INTERNAL_ERRORS", "true", "TEST").unwrap();
        loader
            .apply_env_var("TEST__RESPONSE_HEADERS__HEADERS", "X-Frame-Options=DENY", "TEST")
            .unwrap();

        assert!(!loader.config.cleanup.include_response);
        assert!(!loader.config.body_decoding.enabled);
        assert!(loader.config.error_response.expose_internal_errors);
        assert_eq!(loader.config.response_headers.headers["X-Frame-Options"], "DENY");
    }

    #[test]
    fn test_apply_env_var_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("TEST__CLEANUP__ENABLED", "maybe", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__AUTH__STATUS_CODE", "four", "TEST").is_err());
        assert!(loader.apply_env_var("TEST__LOGGING__FORMAT", "xml", "TEST").is_err());
        assert!(loader.apply_env_var("OTHER__CLEANUP__ENABLED", "true", "TEST").is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TEST__METRICS__ENABLED", "true", "TEST").unwrap();
        assert_eq!(loader.config, SluiceConfig::default());
    }
}
