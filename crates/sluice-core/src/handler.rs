//! Handler contract and the values threaded through a pipeline invocation.
//!
//! A terminal handler and the handler returned by wrapping it share one
//! signature: `Request -> Result<Response, Failure>`. A [`Failure`] keeps the
//! response produced so far next to the error, because the error phase
//! receives both.

use crate::{Request, Response, SluiceError};
use std::fmt;

/// Result returned by handlers and wrapped handlers.
pub type HandlerResult = Result<Response, Failure>;

/// An error together with the response state at the point it occurred.
///
/// Handlers that have no partial response can simply return a
/// [`SluiceError`]; it converts into a `Failure` carrying
/// `Response::default()`, so `?` works inside handlers.
///
/// # Example
///
/// ```
/// use sluice_core::{Failure, HandlerResult, Request, Response, SluiceError};
///
/// fn lookup(_request: Request) -> Result<String, SluiceError> {
///     Err(SluiceError::not_found("user 42"))
/// }
///
/// fn handler(request: Request) -> HandlerResult {
///     let name = lookup(request)?;
///     Ok(Response::ok(name))
/// }
///
/// let failure = handler(Request::default()).unwrap_err();
/// assert_eq!(failure.response, Response::default());
/// ```
#[derive(Debug)]
pub struct Failure {
    /// The response as of the failure.
    pub response: Response,
    /// The error.
    pub error: SluiceError,
}

impl Failure {
    /// Creates a failure with the given partial response.
    #[must_use]
    pub fn new(response: Response, error: SluiceError) -> Self {
        Self { response, error }
    }
}

impl From<SluiceError> for Failure {
    fn from(error: SluiceError) -> Self {
        Self::new(Response::default(), error)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// The response/error pair threaded through the error phase.
///
/// `error: None` means an earlier unit resolved the error and `response` is
/// final. Units that receive a resolved outcome should pass it through.
#[derive(Debug)]
pub struct Outcome {
    /// The current response.
    pub response: Response,
    /// The outstanding error, if any.
    pub error: Option<SluiceError>,
}

impl Outcome {
    /// An outcome with an outstanding error.
    #[must_use]
    pub fn failed(response: Response, error: SluiceError) -> Self {
        Self {
            response,
            error: Some(error),
        }
    }

    /// An outcome whose error has been resolved into `response`.
    #[must_use]
    pub fn resolved(response: Response) -> Self {
        Self {
            response,
            error: None,
        }
    }

    /// Returns true if no error is outstanding.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.error.is_none()
    }

    /// Converts back into a handler result.
    pub fn into_result(self) -> HandlerResult {
        match self.error {
            None => Ok(self.response),
            Some(error) => Err(Failure::new(self.response, error)),
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::failed(failure.response, failure.error)
    }
}

/// A request handler.
///
/// Implemented for every `Fn(Request) -> HandlerResult` closure or function,
/// and by the wrapped handler a pipeline produces, so wrapped handlers can be
/// wrapped again.
///
/// Handlers are shared read-only across concurrent invocations, hence the
/// `Send + Sync` bound.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn handle(&self, request: Request) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(Request) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, request: Request) -> HandlerResult {
        self(request)
    }
}
