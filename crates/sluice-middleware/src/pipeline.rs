//! Middleware pipeline and executor.
//!
//! A [`Pipeline`] collects middleware units in registration order. Wrapping
//! a terminal handler consumes the pipeline and yields a [`WrappedHandler`]
//! with the same [`Handler`] signature. Each call runs the executor fresh:
//!
//! ```text
//! Request → [A.req → B.req → C.req] → Handler → [C.res → B.res → A.res] → Response
//!                │                       │              │
//!                └───────────────────────┴──────────────┴──→ [A.err → B.err → C.err]
//! ```
//!
//! - The first failure in the request, handler or response phase stops that
//!   phase and jumps to the error phase.
//! - The error phase always visits every registered unit in registration
//!   order, whichever phase failed and whether or not an earlier unit
//!   resolved the error.
//!
//! Consuming the pipeline on `wrap` freezes the unit list: the wrapped
//! handler shares it read-only, so concurrent invocations need no lock.

use crate::middleware::{BoxedMiddleware, Middleware};
use crate::observer::{Phase, PipelineObserver, TracingObserver};
use sluice_core::{Handler, HandlerResult, Outcome, Request, Response};
use std::fmt;
use std::sync::Arc;

/// An ordered, append-only list of middleware units.
///
/// # Example
///
/// ```
/// use sluice_core::{HandlerResult, Request, Response, SluiceError};
/// use sluice_core::Handler;
/// use sluice_middleware::Pipeline;
/// use sluice_middleware::stages::CleanupMiddleware;
///
/// fn handler(_request: Request) -> HandlerResult {
///     Err(SluiceError::internal("boom").into())
/// }
///
/// let mut pipeline = Pipeline::new();
/// pipeline.add_middleware(CleanupMiddleware::new());
/// let wrapped = pipeline.wrap(handler);
///
/// let response = wrapped.handle(Request::default()).unwrap();
/// assert_eq!(response.status_code, 500);
/// ```
pub struct Pipeline {
    middlewares: Vec<BoxedMiddleware>,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    /// Creates an empty pipeline reporting to a [`TracingObserver`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(TracingObserver)
    }

    /// Creates an empty pipeline reporting to the given observer.
    #[must_use]
    pub fn with_observer<O: PipelineObserver>(observer: O) -> Self {
        Self {
            middlewares: Vec::new(),
            observer: Arc::new(observer),
        }
    }

    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Appends a unit.
    pub fn add_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends several units, preserving their order.
    pub fn add_middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.middlewares.extend(middlewares);
        self
    }

    /// Returns the unit names in registration order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns true if no unit is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Wraps a terminal handler.
    ///
    /// The pipeline is consumed; its unit list can no longer change.
    #[must_use]
    pub fn wrap<H: Handler>(self, handler: H) -> WrappedHandler<H> {
        WrappedHandler {
            middlewares: self.middlewares.into(),
            observer: self.observer,
            handler: Arc::new(handler),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("middlewares", &self.middleware_names())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`] by chaining.
///
/// # Example
///
/// ```
/// use sluice_middleware::Pipeline;
/// use sluice_middleware::stages::{CleanupMiddleware, HeaderAuthMiddleware};
///
/// let pipeline = Pipeline::builder()
///     .middleware(HeaderAuthMiddleware::new().require("Key", "123"))
///     .middleware(CleanupMiddleware::new())
///     .build();
///
/// assert_eq!(pipeline.middleware_names(), vec!["header_auth", "cleanup"]);
/// ```
pub struct PipelineBuilder {
    middlewares: Vec<BoxedMiddleware>,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
            observer: None,
        }
    }

    /// Appends a unit.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Appends an already boxed unit.
    #[must_use]
    pub fn boxed(mut self, middleware: BoxedMiddleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Sets the observer. Defaults to [`TracingObserver`].
    #[must_use]
    pub fn observer<O: PipelineObserver>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            middlewares: self.middlewares,
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(TracingObserver)),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A terminal handler with middleware applied.
///
/// Cloning is cheap and clones share the frozen unit list.
pub struct WrappedHandler<H> {
    middlewares: Arc<[BoxedMiddleware]>,
    observer: Arc<dyn PipelineObserver>,
    handler: Arc<H>,
}

impl<H> Clone for WrappedHandler<H> {
    fn clone(&self) -> Self {
        Self {
            middlewares: Arc::clone(&self.middlewares),
            observer: Arc::clone(&self.observer),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H> fmt::Debug for WrappedHandler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedHandler")
            .field("middlewares", &self.middleware_names())
            .finish_non_exhaustive()
    }
}

impl<H> WrappedHandler<H> {
    /// Returns the unit names in registration order.
    #[must_use]
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|mw| mw.name()).collect()
    }

    /// Runs every unit's `on_error` in registration order.
    fn handle_error(&self, mut outcome: Outcome) -> Outcome {
        for mw in self.middlewares.iter() {
            let was_resolved = outcome.is_resolved();
            outcome = mw.on_error(outcome);
            if !was_resolved && outcome.is_resolved() {
                self.observer.error_resolved(mw.name(), &outcome.response);
            }
        }

        if let Some(error) = &outcome.error {
            self.observer.error_unresolved(error);
        }

        outcome
    }
}

impl<H: Handler> Handler for WrappedHandler<H> {
    fn handle(&self, mut request: Request) -> HandlerResult {
        let _span = tracing::debug_span!("pipeline", units = self.middlewares.len()).entered();

        for mw in self.middlewares.iter() {
            request = match mw.modify_request(request) {
                Ok(request) => request,
                Err(error) => {
                    self.observer.phase_failed(Phase::Request, Some(mw.name()), &error);
                    return self
                        .handle_error(Outcome::failed(Response::default(), error))
                        .into_result();
                }
            };
        }

        let mut response = match self.handler.handle(request) {
            Ok(response) => response,
            Err(failure) => {
                self.observer.phase_failed(Phase::Handler, None, &failure.error);
                return self.handle_error(failure.into()).into_result();
            }
        };

        for mw in self.middlewares.iter().rev() {
            response = match mw.modify_response(response) {
                Ok(response) => response,
                Err(failure) => {
                    self.observer
                        .phase_failed(Phase::Response, Some(mw.name()), &failure.error);
                    return self.handle_error(failure.into()).into_result();
                }
            };
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use sluice_core::{Failure, SluiceError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    /// A test middleware that records every phase it takes part in.
    struct Recorder {
        name: &'static str,
        log: Log,
        fail_request: bool,
        fail_response: bool,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail_request: false,
                fail_response: false,
            }
        }

        fn failing_request(mut self) -> Self {
            self.fail_request = true;
            self
        }

        fn failing_response(mut self) -> Self {
            self.fail_response = true;
            self
        }

        fn record(&self, phase: &str) {
            self.log.lock().unwrap().push(format!("{}.{phase}", self.name));
        }
    }

    impl Middleware for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn modify_request(&self, request: Request) -> Result<Request, sluice_core::SluiceError> {
            self.record("req");
            if self.fail_request {
                return Err(SluiceError::validation(self.name));
            }
            Ok(request)
        }

        fn modify_response(&self, response: Response) -> Result<Response, Failure> {
            self.record("res");
            if self.fail_response {
                let partial = response.with_header("X-Failed-In", self.name);
                return Err(Failure::new(partial, SluiceError::internal(self.name)));
            }
            Ok(response)
        }

        fn on_error(&self, outcome: Outcome) -> Outcome {
            self.record("err");
            outcome
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn ok_handler(_request: Request) -> HandlerResult {
        Ok(Response::new(200).with_body("handler"))
    }

    #[test]
    fn test_success_returns_handler_response() {
        let log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline
            .add_middleware(Recorder::new("a", &log))
            .add_middleware(Recorder::new("b", &log));

        let response = pipeline.wrap(ok_handler).handle(Request::default()).unwrap();
        assert_eq!(response, Response::new(200).with_body("handler"));
        assert_eq!(entries(&log), vec!["a.req", "b.req", "b.res", "a.res"]);
    }

    #[test]
    fn test_response_phase_runs_in_reverse() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .middleware(Recorder::new("a", &log))
            .middleware(Recorder::new("b", &log))
            .middleware(Recorder::new("c", &log))
            .build();

        pipeline.wrap(ok_handler).handle(Request::default()).unwrap();

        let responses: Vec<_> = entries(&log)
            .into_iter()
            .filter(|e| e.ends_with(".res"))
            .collect();
        assert_eq!(responses, vec!["c.res", "b.res", "a.res"]);
    }

    #[test]
    fn test_request_failure_short_circuits() {
        let log = Log::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = Arc::clone(&calls);

        let pipeline = Pipeline::builder()
            .middleware(Recorder::new("a", &log))
            .middleware(Recorder::new("b", &log).failing_request())
            .middleware(Recorder::new("c", &log))
            .build();

        let wrapped = pipeline.wrap(move |_req: Request| -> HandlerResult {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response::new(200))
        });

        let failure = wrapped.handle(Request::default()).unwrap_err();
        assert_eq!(failure.response, Response::default());
        assert_eq!(failure.error.to_string(), "Validation error: b");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            entries(&log),
            vec!["a.req", "b.req", "a.err", "b.err", "c.err"]
        );
    }

    #[test]
    fn test_handler_failure_enters_error_phase_with_handler_response() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .middleware(Recorder::new("a", &log))
            .middleware(Recorder::new("b", &log))
            .build();

        let wrapped = pipeline.wrap(|_req: Request| -> HandlerResult {
            Err(Failure::new(
                Response::new(200).with_body("eee"),
                SluiceError::internal("Mock error"),
            ))
        });

        let failure = wrapped.handle(Request::default()).unwrap_err();
        assert_eq!(failure.response.body, "eee");
        assert_eq!(entries(&log), vec!["a.req", "b.req", "a.err", "b.err"]);
    }

    #[test]
    fn test_response_failure_skips_remaining_response_units() {
        let log = Log::default();
        let pipeline = Pipeline::builder()
            .middleware(Recorder::new("a", &log))
            .middleware(Recorder::new("b", &log).failing_response())
            .middleware(Recorder::new("c", &log))
            .build();

        let failure = pipeline
            .wrap(ok_handler)
            .handle(Request::default())
            .unwrap_err();

        assert_eq!(failure.response.header("X-Failed-In"), Some("b"));
        assert_eq!(
            entries(&log),
            vec!["a.req", "b.req", "c.req", "c.res", "b.res", "a.err", "b.err", "c.err"]
        );
    }

    #[test]
    fn test_zero_units_propagate_handler_error() {
        let wrapped = Pipeline::new().wrap(|_req: Request| -> HandlerResult {
            Err(SluiceError::internal("boom").into())
        });

        let failure = wrapped.handle(Request::default()).unwrap_err();
        assert_eq!(failure.error.to_string(), "Internal error: boom");
    }

    #[test]
    fn test_error_phase_visits_units_after_resolution() {
        let seen_resolved = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen_resolved);

        let pipeline = Pipeline::builder()
            .middleware(
                FnMiddleware::new("resolver")
                    .error_phase(|_| Outcome::resolved(Response::new(418))),
            )
            .middleware(FnMiddleware::new("observer").error_phase(move |outcome| {
                if outcome.is_resolved() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                outcome
            }))
            .build();

        let response = pipeline
            .wrap(|_req: Request| -> HandlerResult { Err(SluiceError::internal("x").into()) })
            .handle(Request::default())
            .unwrap();

        assert_eq!(response.status_code, 418);
        assert_eq!(seen_resolved.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_from_on_error_feeds_next_unit() {
        let pipeline = Pipeline::builder()
            .middleware(FnMiddleware::new("wrapper").error_phase(|outcome| {
                let Outcome { response, error } = outcome;
                Outcome {
                    response,
                    error: error.map(|e| e.context("wrapped by first unit")),
                }
            }))
            .middleware(FnMiddleware::new("reporter").error_phase(|outcome| {
                let message = outcome
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                Outcome::resolved(Response::new(500).with_body(message))
            }))
            .build();

        let response = pipeline
            .wrap(|_req: Request| -> HandlerResult { Err(SluiceError::internal("boom").into()) })
            .handle(Request::default())
            .unwrap();

        assert_eq!(response.body, "wrapped by first unit: Internal error: boom");
    }

    #[test]
    fn test_request_modifications_thread_through() {
        let pipeline = Pipeline::builder()
            .middleware(
                FnMiddleware::new("first")
                    .request_phase(|req| Ok(req.with_header("X-Trail", "first"))),
            )
            .middleware(FnMiddleware::new("second").request_phase(|req| {
                let trail = format!("{},second", req.header("X-Trail").unwrap_or_default());
                Ok(req.with_header("X-Trail", trail))
            }))
            .build();

        let response = pipeline
            .wrap(|req: Request| -> HandlerResult {
                Ok(Response::ok(req.header("X-Trail").unwrap_or_default()))
            })
            .handle(Request::default())
            .unwrap();

        assert_eq!(response.body, "first,second");
    }

    #[derive(Default)]
    struct CountingObserver {
        failed: AtomicUsize,
        resolved: AtomicUsize,
        unresolved: AtomicUsize,
    }

    impl PipelineObserver for Arc<CountingObserver> {
        fn phase_failed(&self, _phase: Phase, _unit: Option<&'static str>, _error: &SluiceError) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }

        fn error_resolved(&self, _unit: &'static str, _response: &Response) {
            self.resolved.fetch_add(1, Ordering::SeqCst);
        }

        fn error_unresolved(&self, _error: &SluiceError) {
            self.unresolved.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_observer_receives_events() {
        let observer = Arc::new(CountingObserver::default());

        let unresolved = Pipeline::with_observer(Arc::clone(&observer))
            .wrap(|_req: Request| -> HandlerResult { Err(SluiceError::internal("x").into()) });
        assert!(unresolved.handle(Request::default()).is_err());

        let resolved = Pipeline::builder()
            .observer(Arc::clone(&observer))
            .middleware(
                FnMiddleware::new("fix").error_phase(|_| Outcome::resolved(Response::new(500))),
            )
            .build()
            .wrap(|_req: Request| -> HandlerResult { Err(SluiceError::internal("x").into()) });
        assert!(resolved.handle(Request::default()).is_ok());

        assert_eq!(observer.failed.load(Ordering::SeqCst), 2);
        assert_eq!(observer.resolved.load(Ordering::SeqCst), 1);
        assert_eq!(observer.unresolved.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrapped_handler_can_be_wrapped_again() {
        let log = Log::default();
        let inner = Pipeline::builder()
            .middleware(Recorder::new("inner", &log))
            .build()
            .wrap(ok_handler);
        let outer = Pipeline::builder()
            .middleware(Recorder::new("outer", &log))
            .build()
            .wrap(inner);

        outer.handle(Request::default()).unwrap();
        assert_eq!(
            entries(&log),
            vec!["outer.req", "inner.req", "inner.res", "outer.res"]
        );
    }

    #[test]
    fn test_add_middlewares_preserves_order() {
        let mut pipeline = Pipeline::default();
        pipeline.add_middlewares(vec![
            Arc::new(FnMiddleware::new("one")) as BoxedMiddleware,
            Arc::new(FnMiddleware::new("two")),
        ]);
        pipeline.add_middleware(FnMiddleware::new("three"));

        assert_eq!(pipeline.len(), 3);
        assert!(!pipeline.is_empty());
        assert_eq!(pipeline.middleware_names(), vec!["one", "two", "three"]);

        let wrapped = pipeline.wrap(ok_handler);
        assert_eq!(wrapped.clone().middleware_names(), vec!["one", "two", "three"]);
    }
}
