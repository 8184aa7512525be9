//! Structured logging for Sluice.
//!
//! Everything in Sluice reports through `tracing`. This crate installs the
//! subscriber that turns those events into output:
//!
//! - **JSON**: one object per line, for log shippers
//! - **Pretty**: multi-line human-readable output, for development
//!
//! The level is an `EnvFilter` directive, so per-module levels such as
//! `info,sluice_middleware=debug` work.
//!
//! # Example
//!
//! ```
//! use sluice_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig {
//!     enabled: false,
//!     ..LogConfig::default()
//! };
//! init_logging(&config).unwrap();
//!
//! tracing::info!(unit = "cleanup", "error resolved");
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
