//! Error envelope middleware.
//!
//! Converts categorized errors into the standard error envelope:
//!
//! ```json
//! {
//!   "error": {
//!     "code": "NOT_FOUND",
//!     "message": "Not found: user 42",
//!     "category": "not_found"
//!   }
//! }
//! ```
//!
//! Only client-class categories are converted by default. Server-class
//! errors are left for the catch-all unit unless
//! [`expose_internal_errors`](ErrorResponseMiddleware::expose_internal_errors)
//! is enabled.

use crate::middleware::Middleware;
use sluice_core::{Outcome, Response, SluiceError};

/// Middleware that renders errors as JSON envelopes.
#[derive(Debug, Clone, Default)]
pub struct ErrorResponseMiddleware {
    expose_internal_errors: bool,
}

impl ErrorResponseMiddleware {
    /// Creates a unit that converts client errors only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether server-class errors are converted too.
    ///
    /// **Warning**: error messages reach the caller verbatim. Only enable
    /// this in development environments.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    fn converts(&self, error: &SluiceError) -> bool {
        error.category().is_client_error() || self.expose_internal_errors
    }
}

impl Middleware for ErrorResponseMiddleware {
    fn name(&self) -> &'static str {
        "error_response"
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        let Outcome { response, error } = outcome;
        let error = match error {
            Some(error) if self.converts(&error) => error,
            error => return Outcome { response, error },
        };

        match Response::json(error.status_code().as_u16(), &error.to_envelope()) {
            Ok(envelope) => Outcome::resolved(envelope),
            Err(err) => Outcome::failed(response, SluiceError::from(err)),
        }
    }
}
