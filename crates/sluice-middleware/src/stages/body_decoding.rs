//! Base64 request body decoding.
//!
//! Gateways deliver binary or non-UTF-8 payloads base64 encoded and set
//! `isBase64Encoded`. This unit decodes such bodies so handlers always see
//! plain text.

use crate::middleware::Middleware;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sluice_core::{Request, SluiceError};

/// Decodes base64 request bodies.
///
/// Requests without the flag pass through untouched. A body that is not
/// valid base64, or does not decode to UTF-8, fails the request phase with a
/// validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64BodyMiddleware;

impl Base64BodyMiddleware {
    /// Creates the unit.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for Base64BodyMiddleware {
    fn name(&self) -> &'static str {
        "body_decoding"
    }

    fn modify_request(&self, mut request: Request) -> Result<Request, SluiceError> {
        if !request.is_base64_encoded {
            return Ok(request);
        }

        let bytes = STANDARD
            .decode(request.body.trim())
            .map_err(|e| SluiceError::validation(format!("body is not valid base64: {e}")))?;
        request.body = String::from_utf8(bytes)
            .map_err(|e| SluiceError::validation(format!("decoded body is not UTF-8: {e}")))?;
        request.is_base64_encoded = false;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::ErrorCategory;

    #[test]
    fn test_decodes_flagged_body() {
        let request = Base64BodyMiddleware
            .modify_request(Request::default().with_base64_body("aGVsbG8gd29ybGQ="))
            .unwrap();
        assert_eq!(request.body, "hello world");
        assert!(!request.is_base64_encoded);
    }

    #[test]
    fn test_plain_body_untouched() {
        let request = Request::default().with_body("aGVsbG8=");
        assert_eq!(
            Base64BodyMiddleware.modify_request(request.clone()).unwrap(),
            request
        );
    }

    #[test]
    fn test_invalid_base64_is_validation_error() {
        let error = Base64BodyMiddleware
            .modify_request(Request::default().with_base64_body("not base64!"))
            .unwrap_err();
        assert_eq!(error.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_non_utf8_is_validation_error() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let error = Base64BodyMiddleware
            .modify_request(Request::default().with_base64_body(encoded))
            .unwrap_err();
        assert!(error.to_string().contains("UTF-8"));
    }
}
