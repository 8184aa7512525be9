//! Header-based authentication middleware.
//!
//! Compares a fixed set of request headers against expected values. A
//! mismatch aborts the request phase with an authentication error, which the
//! same unit later converts into a JSON rejection during the error phase:
//!
//! ```json
//! { "error": "Unauthenticated, header Key value does not match" }
//! ```
//!
//! Header names are compared exactly. A missing header compares as the empty
//! string.

use crate::middleware::Middleware;
use http::StatusCode;
use sluice_core::{ErrorCategory, Outcome, Request, Response, SluiceError};
use std::collections::BTreeMap;

/// Message returned to the caller when authentication fails.
pub const DEFAULT_AUTH_MESSAGE: &str = "Unauthenticated, header Key value does not match";

/// Middleware that rejects requests whose headers do not match.
///
/// # Example
///
/// ```
/// use sluice_core::{Handler, HandlerResult, Request, Response};
/// use sluice_middleware::Pipeline;
/// use sluice_middleware::stages::{CleanupMiddleware, HeaderAuthMiddleware};
///
/// let wrapped = Pipeline::builder()
///     .middleware(HeaderAuthMiddleware::new().require("Key", "123"))
///     .middleware(CleanupMiddleware::new())
///     .build()
///     .wrap(|_req: Request| -> HandlerResult { Ok(Response::ok("hello")) });
///
/// let denied = wrapped.handle(Request::default().with_header("Key", "wrong")).unwrap();
/// assert_eq!(denied.status_code, 401);
///
/// let allowed = wrapped.handle(Request::default().with_header("Key", "123")).unwrap();
/// assert_eq!(allowed.body, "hello");
/// ```
#[derive(Debug, Clone)]
pub struct HeaderAuthMiddleware {
    required: BTreeMap<String, String>,
    status: StatusCode,
    message: String,
}

impl Default for HeaderAuthMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderAuthMiddleware {
    /// Creates a unit with no required headers; every request passes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            required: BTreeMap::new(),
            status: StatusCode::UNAUTHORIZED,
            message: DEFAULT_AUTH_MESSAGE.to_string(),
        }
    }

    /// Creates a unit from a header map.
    #[must_use]
    pub fn with_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(Self::new(), |auth, (name, value)| auth.require(name, value))
    }

    /// Requires `name` to carry exactly `value`.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.required.insert(name.into(), value.into());
        self
    }

    /// Sets the rejection status. Defaults to `401 Unauthorized`.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the rejection message placed in the `error` field.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the name of the first header that does not match.
    fn first_mismatch(&self, request: &Request) -> Option<&str> {
        self.required
            .iter()
            .find(|(name, expected)| request.header(name).unwrap_or_default() != expected.as_str())
            .map(|(name, _)| name.as_str())
    }

    fn rejection(&self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        Response::new(self.status.as_u16())
            .with_header(http::header::CONTENT_TYPE.as_str(), "application/json")
            .with_body(body.to_string())
    }
}

impl Middleware for HeaderAuthMiddleware {
    fn name(&self) -> &'static str {
        "header_auth"
    }

    fn modify_request(&self, request: Request) -> Result<Request, SluiceError> {
        match self.first_mismatch(&request) {
            None => Ok(request),
            Some(header) => {
                tracing::warn!(header, "request rejected, header value does not match");
                Err(SluiceError::authentication(self.message.clone()))
            }
        }
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        match &outcome.error {
            Some(error) if error.category() == ErrorCategory::Authentication => {
                Outcome::resolved(self.rejection())
            }
            _ => outcome,
        }
    }
}
