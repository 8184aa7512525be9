//! Request/response logging middleware.
//!
//! Emits one `tracing` event per phase the invocation passes through. It
//! never changes the values it sees. Register it first so it logs the
//! request as received and the response as finally returned.

use crate::middleware::Middleware;
use sluice_core::{Failure, Outcome, Request, Response, SluiceError};

/// Pass-through unit that logs every phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    /// Creates the unit.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn modify_request(&self, request: Request) -> Result<Request, SluiceError> {
        tracing::info!(
            http_method = %request.http_method,
            path = %request.path,
            headers = request.headers.len(),
            body_bytes = request.body.len(),
            "request received"
        );
        Ok(request)
    }

    fn modify_response(&self, response: Response) -> Result<Response, Failure> {
        tracing::info!(
            status_code = response.status_code,
            body_bytes = response.body.len(),
            "response sent"
        );
        Ok(response)
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        match &outcome.error {
            Some(error) => tracing::warn!(
                category = ?error.category(),
                error = %error,
                "request failed"
            ),
            None => tracing::info!(
                status_code = outcome.response.status_code,
                "request failed, error already resolved"
            ),
        }
        outcome
    }
}
