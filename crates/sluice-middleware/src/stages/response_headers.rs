//! Static response headers.

use crate::middleware::Middleware;
use sluice_core::{Failure, Outcome, Response};
use std::collections::BTreeMap;

/// Adds a fixed set of headers to outgoing responses.
///
/// Headers are merged into every response that passes through the response
/// phase, and into error responses already resolved by a unit registered
/// before this one. Register it after the units whose error responses it
/// should decorate; the catch-all carries its own copy through
/// [`CleanupMiddleware::with_headers`](super::CleanupMiddleware::with_headers). Headers the response already carries are never
/// overridden; names compare case-insensitively.
///
/// # Example
///
/// ```
/// use sluice_core::Response;
/// use sluice_middleware::Middleware;
/// use sluice_middleware::stages::ResponseHeadersMiddleware;
///
/// let headers = ResponseHeadersMiddleware::new()
///     .header("Access-Control-Allow-Origin", "*");
///
/// let response = headers.modify_response(Response::new(200)).unwrap();
/// assert_eq!(response.header_ignore_case("access-control-allow-origin"), Some("*"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseHeadersMiddleware {
    headers: BTreeMap<String, String>,
}

impl ResponseHeadersMiddleware {
    /// Creates a unit with no headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a unit from a header map.
    #[must_use]
    pub fn with_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn merge(&self, mut response: Response) -> Response {
        for (name, value) in &self.headers {
            if response.header_ignore_case(name).is_none() {
                response.headers.insert(name.clone(), value.clone());
            }
        }
        response
    }
}

impl Middleware for ResponseHeadersMiddleware {
    fn name(&self) -> &'static str {
        "response_headers"
    }

    fn modify_response(&self, response: Response) -> Result<Response, Failure> {
        Ok(self.merge(response))
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        if outcome.is_resolved() {
            Outcome::resolved(self.merge(outcome.response))
        } else {
            outcome
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::SluiceError;

    fn cors() -> ResponseHeadersMiddleware {
        ResponseHeadersMiddleware::with_headers([
            ("Access-Control-Allow-Origin", "*"),
            ("Cache-Control", "no-store"),
        ])
    }

    #[test]
    fn test_adds_headers() {
        let response = cors().modify_response(Response::ok("hi")).unwrap();
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(response.header("Cache-Control"), Some("no-store"));
        assert_eq!(response.body, "hi");
    }

    #[test]
    fn test_existing_header_wins() {
        let response = Response::new(200).with_header("cache-control", "max-age=60");
        let response = cors().modify_response(response).unwrap();

        assert_eq!(response.header_ignore_case("Cache-Control"), Some("max-age=60"));
        assert!(!response.headers.contains_key("Cache-Control"));
    }

    #[test]
    fn test_merges_into_resolved_error_response() {
        let outcome = cors().on_error(Outcome::resolved(Response::new(401)));
        assert_eq!(outcome.response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_unresolved_error_untouched() {
        let outcome = cors().on_error(Outcome::failed(
            Response::default(),
            SluiceError::internal("boom"),
        ));
        assert!(!outcome.is_resolved());
        assert!(outcome.response.headers.is_empty());
    }
}
