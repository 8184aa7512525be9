//! Error types for Sluice.
//!
//! [`SluiceError`] is the error value threaded through every pipeline phase.
//! The executor never looks inside it; only its presence drives control flow.
//! Middleware units are free to inspect [`SluiceError::category`] to decide
//! whether they can turn the error into a response.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`SluiceError`].
pub type SluiceResult<T> = Result<T, SluiceError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request validation errors (malformed body, bad parameters).
    Validation,
    /// Authentication errors (missing or mismatched credentials).
    Authentication,
    /// Authorization errors (permission denied).
    Authorization,
    /// Resource not found.
    NotFound,
    /// Conflict (e.g., concurrent modification).
    Conflict,
    /// Request timeout.
    Timeout,
    /// External service errors (downstream failures).
    External,
    /// Internal errors, including handler failures with no better category.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::External => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if errors of this category are the caller's fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation
                | Self::Authentication
                | Self::Authorization
                | Self::NotFound
                | Self::Conflict
        )
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Timeout => "TIMEOUT",
            Self::External => "EXTERNAL_SERVICE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Standard error type for Sluice.
///
/// # Example
///
/// ```
/// use sluice_core::{ErrorCategory, SluiceError};
///
/// let err = SluiceError::authentication("header Key value does not match");
/// assert_eq!(err.category(), ErrorCategory::Authentication);
///
/// let wrapped = err.context("request rejected");
/// assert_eq!(wrapped.category(), ErrorCategory::Authentication);
/// assert_eq!(
///     wrapped.to_string(),
///     "request rejected: Authentication error: header Key value does not match"
/// );
/// ```
#[derive(Error, Debug)]
pub enum SluiceError {
    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Conflict error.
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// Timeout.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// External service error.
    #[error("External service error: {message}")]
    External {
        /// Human-readable error message.
        message: String,
        /// The name of the external service.
        service: Option<String>,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Another error wrapped with added context.
    #[error("{message}: {source}")]
    Context {
        /// The added context.
        message: String,
        /// The wrapped error.
        #[source]
        source: Box<SluiceError>,
    },
}

impl SluiceError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an external service error.
    #[must_use]
    pub fn external(message: impl Into<String>, service: Option<impl Into<String>>) -> Self {
        Self::External {
            message: message.into(),
            service: service.map(Into::into),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Wraps this error with additional context.
    ///
    /// The category of the wrapped error is preserved.
    #[must_use]
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// Returns the error category.
    ///
    /// Context wrappers report the category of the innermost error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::External { .. } => ErrorCategory::External,
            Self::Internal { .. } => ErrorCategory::Internal,
            Self::Context { source, .. } => source.category(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let category = self.category();
        ErrorEnvelope {
            error: ErrorDetail {
                code: category.code().to_string(),
                message: self.to_string(),
                category,
            },
        }
    }
}

impl From<serde_json::Error> for SluiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with_source("JSON serialization failed", err)
    }
}

/// Serializable error envelope for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}
