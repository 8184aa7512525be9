//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every unit in a
//! [`Pipeline`](crate::Pipeline) implements. A unit takes part in up to three
//! phases of an invocation:
//!
//! | Phase    | Method             | Order                        |
//! |----------|--------------------|------------------------------|
//! | Request  | `modify_request`   | registration order           |
//! | Response | `modify_response`  | reverse registration order   |
//! | Error    | `on_error`         | registration order, all units |
//!
//! Every phase method has a pass-through default, so a unit only overrides the
//! phases it cares about.
//!
//! # Example
//!
//! ```
//! use sluice_core::{Failure, Response};
//! use sluice_middleware::Middleware;
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn modify_response(&self, response: Response) -> Result<Response, Failure> {
//!         Ok(response.with_header("X-Powered-By", "sluice"))
//!     }
//! }
//! ```

use sluice_core::{Failure, Outcome, Request, Response, SluiceError};
use std::sync::Arc;

/// The core middleware trait.
///
/// # Invariants
///
/// - Units are shared read-only across concurrent invocations; any state they
///   hold is configuration fixed at construction.
/// - `on_error` runs for every registered unit once an error occurs, even if
///   an earlier unit already resolved it. Implementations MUST return a
///   resolved outcome unchanged.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this unit, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Transforms the inbound request.
    ///
    /// Returning an error aborts the rest of the request phase and the
    /// terminal handler. The error phase starts from `Response::default()`.
    fn modify_request(&self, request: Request) -> Result<Request, SluiceError> {
        Ok(request)
    }

    /// Transforms the outbound response.
    ///
    /// Only called once the handler and the whole request phase succeeded.
    /// A failure skips the remaining response-phase units; its response is
    /// what the error phase starts from.
    fn modify_response(&self, response: Response) -> Result<Response, Failure> {
        Ok(response)
    }

    /// Resolves or forwards an error.
    ///
    /// Return [`Outcome::resolved`] with a complete replacement response to
    /// clear the error, or return the outcome (possibly with a wrapped error)
    /// to hand it to the next unit.
    fn on_error(&self, outcome: Outcome) -> Outcome {
        outcome
    }
}

/// A type-erased middleware that can be stored in a pipeline.
pub type BoxedMiddleware = Arc<dyn Middleware>;

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn modify_request(&self, request: Request) -> Result<Request, SluiceError> {
        (**self).modify_request(request)
    }

    fn modify_response(&self, response: Response) -> Result<Response, Failure> {
        (**self).modify_response(response)
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        (**self).on_error(outcome)
    }
}

type RequestFn = Box<dyn Fn(Request) -> Result<Request, SluiceError> + Send + Sync>;
type ResponseFn = Box<dyn Fn(Response) -> Result<Response, Failure> + Send + Sync>;
type ErrorFn = Box<dyn Fn(Outcome) -> Outcome + Send + Sync>;

/// A middleware built from closures.
///
/// Phases without a closure pass their input through.
///
/// # Example
///
/// ```
/// use sluice_core::{Outcome, Response};
/// use sluice_middleware::{FnMiddleware, Middleware};
///
/// let teapot = FnMiddleware::new("teapot")
///     .request_phase(|req| Ok(req.with_header("X-Seen", "1")))
///     .error_phase(|outcome| {
///         if outcome.is_resolved() {
///             return outcome;
///         }
///         Outcome::resolved(Response::new(418))
///     });
///
/// assert_eq!(teapot.name(), "teapot");
/// ```
pub struct FnMiddleware {
    name: &'static str,
    request: Option<RequestFn>,
    response: Option<ResponseFn>,
    error: Option<ErrorFn>,
}

impl FnMiddleware {
    /// Creates a pass-through function-based middleware.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            request: None,
            response: None,
            error: None,
        }
    }

    /// Sets the request-phase closure.
    #[must_use]
    pub fn request_phase<F>(mut self, f: F) -> Self
    where
        F: Fn(Request) -> Result<Request, SluiceError> + Send + Sync + 'static,
    {
        self.request = Some(Box::new(f));
        self
    }

    /// Sets the response-phase closure.
    #[must_use]
    pub fn response_phase<F>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Result<Response, Failure> + Send + Sync + 'static,
    {
        self.response = Some(Box::new(f));
        self
    }

    /// Sets the error-phase closure.
    #[must_use]
    pub fn error_phase<F>(mut self, f: F) -> Self
    where
        F: Fn(Outcome) -> Outcome + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for FnMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl Middleware for FnMiddleware {
    fn name(&self) -> &'static str {
        self.name
    }

    fn modify_request(&self, request: Request) -> Result<Request, SluiceError> {
        match &self.request {
            Some(f) => f(request),
            None => Ok(request),
        }
    }

    fn modify_response(&self, response: Response) -> Result<Response, Failure> {
        match &self.response {
            Some(f) => f(response),
            None => Ok(response),
        }
    }

    fn on_error(&self, outcome: Outcome) -> Outcome {
        match &self.error {
            Some(f) => f(outcome),
            None => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named;

    impl Middleware for Named {
        fn name(&self) -> &'static str {
            "named"
        }
    }

    #[test]
    fn test_default_phases_pass_through() {
        let mw = Named;
        let request = Request::new("GET", "/").with_header("Key", "123");
        assert_eq!(mw.modify_request(request.clone()).unwrap(), request);

        let response = Response::new(200).with_body("ok");
        assert_eq!(mw.modify_response(response.clone()).unwrap(), response);

        let outcome = mw.on_error(Outcome::failed(Response::default(), SluiceError::internal("x")));
        assert!(!outcome.is_resolved());
    }

    #[test]
    fn test_fn_middleware_phases() {
        let mw = FnMiddleware::new("fn")
            .request_phase(|req| Ok(req.with_header("X-Step", "request")))
            .response_phase(|res| Ok(res.with_header("X-Step", "response")))
            .error_phase(|_| Outcome::resolved(Response::new(503)));

        let request = mw.modify_request(Request::default()).unwrap();
        assert_eq!(request.header("X-Step"), Some("request"));

        let response = mw.modify_response(Response::new(200)).unwrap();
        assert_eq!(response.header("X-Step"), Some("response"));

        let outcome = mw.on_error(Outcome::failed(Response::default(), SluiceError::internal("x")));
        assert!(outcome.is_resolved());
        assert_eq!(outcome.response.status_code, 503);
    }

    #[test]
    fn test_fn_middleware_request_error() {
        let mw = FnMiddleware::new("reject")
            .request_phase(|_| Err(SluiceError::validation("nope")));
        assert!(mw.modify_request(Request::default()).is_err());
    }

    #[test]
    fn test_arc_middleware_delegates() {
        let mw: BoxedMiddleware = Arc::new(Named);
        assert_eq!(mw.name(), "named");
        assert_eq!(Arc::clone(&mw).name(), "named");
    }
}
