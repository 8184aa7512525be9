//! # Sluice Middleware
//!
//! Middleware pipeline for wrapping request handlers.
//!
//! A [`Pipeline`] holds an ordered list of [`Middleware`] units. Wrapping a
//! terminal handler produces a handler with the same signature that runs:
//!
//! ```text
//! Request → A.req → B.req → C.req → Handler
//!                                      ↓
//! Response ← A.res ← B.res ← C.res ←───┘
//!
//! on any failure: A.err → B.err → C.err
//! ```
//!
//! | Phase    | Order                       | On failure                      |
//! |----------|-----------------------------|---------------------------------|
//! | Request  | registration                | skip rest and handler, go Error |
//! | Handler  | -                           | go Error                        |
//! | Response | reverse registration        | skip rest, go Error             |
//! | Error    | registration, every unit    | next unit sees the new error    |
//!
//! Register a catch-all such as [`stages::CleanupMiddleware`] last so that
//! no error escapes the wrapped handler.
//!
//! ## Example
//!
//! ```
//! use sluice_core::{Handler, HandlerResult, Request, Response, SluiceError};
//! use sluice_middleware::Pipeline;
//! use sluice_middleware::stages::{CleanupMiddleware, HeaderAuthMiddleware};
//!
//! fn handler(request: Request) -> HandlerResult {
//!     if request.body.is_empty() {
//!         return Err(SluiceError::internal("empty body").into());
//!     }
//!     Ok(Response::ok(request.body))
//! }
//!
//! let wrapped = Pipeline::builder()
//!     .middleware(HeaderAuthMiddleware::new().require("Key", "123"))
//!     .middleware(CleanupMiddleware::new())
//!     .build()
//!     .wrap(handler);
//!
//! let request = Request::default().with_header("Key", "123");
//! let response = wrapped.handle(request).unwrap();
//! assert_eq!(response.status_code, 500);
//! ```

#![doc(html_root_url = "https://docs.rs/sluice-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod observer;
pub mod pipeline;
pub mod stages;

// Re-export main types at crate root
pub use middleware::{BoxedMiddleware, FnMiddleware, Middleware};
pub use observer::{NoopObserver, Phase, PipelineObserver, TracingObserver};
pub use pipeline::{Pipeline, PipelineBuilder, WrappedHandler};
