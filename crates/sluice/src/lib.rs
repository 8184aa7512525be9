//! # Sluice
//!
//! Composable request/response middleware pipelines.
//!
//! Sluice wraps a terminal handler `Request -> Result<Response, Failure>` in
//! an ordered list of middleware units. Each unit may rewrite the request on
//! the way in, rewrite the response on the way out, and turn errors into
//! responses.
//!
//! ## Quick Start
//!
//! ```
//! use sluice::prelude::*;
//!
//! fn hello(request: Request) -> HandlerResult {
//!     Ok(Response::ok(format!("hello {}", request.body)))
//! }
//!
//! let mut config = SluiceConfig::default();
//! config.auth.enabled = true;
//! config.auth.required_headers.insert("Key".to_string(), "123".to_string());
//! config.validate().unwrap();
//!
//! let handler = sluice::build_pipeline(&config).wrap(hello);
//!
//! let ok = handler.handle(Request::default().with_header("Key", "123").with_body("world"));
//! assert_eq!(ok.unwrap().body, "hello world");
//!
//! let denied = handler.handle(Request::default()).unwrap();
//! assert_eq!(denied.status_code, 401);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Logging → Base64 → Auth → Headers → Errors → Cleanup → Handler
//!                                                                     ↓
//! Response ← Logging ← Base64 ← Auth ← Headers ← Errors ← Cleanup ←───┘
//! ```
//!
//! On failure every unit's error handler runs front to back, so cleanup
//! only sees errors the earlier units left unresolved.

#![doc(html_root_url = "https://docs.rs/sluice/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod setup;

pub use setup::{build_pipeline, init_logging};

// Re-export core types
pub use sluice_core as core;

// Re-export middleware types
pub use sluice_middleware as middleware;

// Re-export configuration types
pub use sluice_config as config;

// Re-export telemetry types
pub use sluice_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use sluice::prelude::*;
///
/// let pipeline = Pipeline::builder()
///     .middleware(CleanupMiddleware::new())
///     .build();
/// assert_eq!(pipeline.len(), 1);
/// ```
pub mod prelude {
    pub use sluice_core::{
        ErrorCategory, Failure, Handler, HandlerResult, Outcome, Request, Response, SluiceError,
        SluiceResult,
    };

    pub use sluice_middleware::stages::{
        Base64BodyMiddleware, CleanupMiddleware, ErrorResponseMiddleware, HeaderAuthMiddleware,
        LoggingMiddleware, ResponseHeadersMiddleware,
    };
    pub use sluice_middleware::{
        FnMiddleware, Middleware, Pipeline, PipelineBuilder, PipelineObserver, WrappedHandler,
    };

    pub use sluice_config::{ConfigLoader, SluiceConfig};
}
