//! Catch-all error middleware.
//!
//! Register this unit last. Any error still outstanding when the error phase
//! reaches it becomes a `500` response:
//!
//! ```json
//! {
//!   "stackTrace": "Unhandled error. Response received by final error handle middleware : '{...}' : Internal error: boom"
//! }
//! ```
//!
//! The trace embeds the serialized response that was current when the error
//! occurred. Outcomes already resolved by an earlier unit pass through.
//!
//! Nothing runs after this unit in the error phase, so static headers the
//! `500` should carry are configured on it directly.

use crate::middleware::Middleware;
use http::StatusCode;
use serde::Serialize;
use sluice_core::{Outcome, Response, SluiceError};
use std::collections::BTreeMap;

const TRACE_PREFIX: &str = "Unhandled error. Response received by final error handle middleware";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupBody {
    stack_trace: String,
}

/// Converts any unresolved error into a `500` JSON response.
#[derive(Debug, Clone)]
pub struct CleanupMiddleware {
    include_response: bool,
    headers: BTreeMap<String, String>,
}

impl Default for CleanupMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupMiddleware {
    /// Creates a cleanup unit that embeds the failed response in its trace.
    #[must_use]
    pub fn new() -> Self {
        Self {
            include_response: true,
            headers: BTreeMap::new(),
        }
    }

    /// Sets whether the serialized response is embedded in the trace.
    #[must_use]
    pub fn include_response(mut self, include: bool) -> Self {
        self.include_response = include;
        self
    }

    /// Adds static headers to the `500` response.
    ///
    /// `Content-Type` stays `application/json` whatever the map says.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(name, value)| (name.into(), value.into())));
        self
    }

    fn decorate(&self, mut response: Response) -> Response {
        for (name, value) in &self.headers {
            if response.header_ignore_case(name).is_none() {
                response.headers.insert(name.clone(), value.clone());
            }
        }
        response
    }

    fn trace(&self, response: &Response, error: SluiceError) -> String {
        let context = if self.include_response {
            // Response has only string and integer fields.
            let snapshot = serde_json::to_string(response).unwrap_or_default();
            format!("{TRACE_PREFIX} : '{snapshot}' ")
        } else {
            TRACE_PREFIX.to_string()
        };
        error.context(context).to_string()
    }
}

impl Middleware for CleanupMiddleware {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        let Outcome { response, error } = outcome;
        let Some(error) = error else {
            return Outcome::resolved(response);
        };

        let body = CleanupBody {
            stack_trace: self.trace(&response, error),
        };
        let status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();

        match Response::json(status, &body) {
            Ok(resolved) => Outcome::resolved(self.decorate(resolved)),
            Err(err) => Outcome::failed(response, SluiceError::from(err)),
        }
    }
}
