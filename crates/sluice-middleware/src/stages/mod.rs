//! Stock middleware units.
//!
//! Each unit is an independent [`Middleware`](crate::Middleware)
//! implementer. A typical registration order is:
//!
//! 1. [`logging`] - log request, response and error phases
//! 2. [`body_decoding`] - decode base64 request bodies
//! 3. [`auth`] - reject requests with mismatched headers
//! 4. [`error_response`] - render categorized errors as envelopes
//! 5. [`response_headers`] - add static response headers
//! 6. [`cleanup`] - turn anything left into a `500` (always last)

pub mod auth;
pub mod body_decoding;
pub mod cleanup;
pub mod error_response;
pub mod logging;
pub mod response_headers;

// Re-export main types
pub use auth::{HeaderAuthMiddleware, DEFAULT_AUTH_MESSAGE};
pub use body_decoding::Base64BodyMiddleware;
pub use cleanup::CleanupMiddleware;
pub use error_response::ErrorResponseMiddleware;
pub use logging::LoggingMiddleware;
pub use response_headers::ResponseHeadersMiddleware;
