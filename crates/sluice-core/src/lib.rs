//! # Sluice Core
//!
//! Core types shared by every Sluice crate:
//!
//! - [`Request`] / [`Response`] - API-gateway style proxy records
//! - [`SluiceError`] - Categorized error threaded through the pipeline as a value
//! - [`Handler`] - The terminal handler contract (and the wrapped handler's)
//! - [`Failure`] - An error paired with the response produced so far
//! - [`Outcome`] - The response/error state threaded through the error phase

#![doc(html_root_url = "https://docs.rs/sluice-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod handler;
mod types;

pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, SluiceError, SluiceResult};
pub use handler::{Failure, Handler, HandlerResult, Outcome};
pub use types::{Request, Response};
