//! Typed configuration for Sluice pipelines.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! [`SluiceConfig`] has one section per stock middleware unit plus logging.
//!
//! # Example
//!
//! ```no_run
//! use sluice_config::ConfigLoader;
//!
//! # fn main() -> Result<(), sluice_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("sluice.toml")?
//!     .with_env_prefix("SLUICE")
//!     .load()?;
//!
//! println!("auth enabled: {}", config.auth.enabled);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [auth]
//! enabled = true
//! status_code = 401
//!
//! [auth.required_headers]
//! Key = "123"
//!
//! [cleanup]
//! enabled = true
//! include_response = true
//!
//! [response_headers.headers]
//! X-Frame-Options = "DENY"
//!
//! [body_decoding]
//! enabled = true
//!
//! [error_response]
//! enabled = true
//! expose_internal_errors = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `SLUICE__LOGGING__LEVEL=debug`
//! - `SLUICE__AUTH__REQUIRED_HEADERS=Key=123`
//! - `SLUICE__CLEANUP__ENABLED=false`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use sluice_telemetry::LogFormat;
