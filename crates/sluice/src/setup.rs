//! Building pipelines and logging from configuration.

use http::StatusCode;
use sluice_config::SluiceConfig;
use sluice_middleware::stages::{
    Base64BodyMiddleware, CleanupMiddleware, ErrorResponseMiddleware, HeaderAuthMiddleware,
    LoggingMiddleware, ResponseHeadersMiddleware,
};
use sluice_middleware::Pipeline;
use sluice_telemetry::TelemetryResult;

/// Builds a pipeline of the stock units enabled in `config`.
///
/// Units are registered in this order, skipping disabled ones:
///
/// 1. logging (when `logging.enabled`)
/// 2. base64 body decoding
/// 3. header authentication
/// 4. error envelopes
/// 5. static response headers (when the map is non-empty)
/// 6. cleanup
///
/// Cleanup is always last so it only sees errors nothing else resolved.
/// Static headers follow the error envelopes so they decorate them in the
/// error phase, and cleanup adds the same headers to its `500`.
/// Further units can be appended to the returned pipeline, but appending
/// after cleanup means they run after it in the error phase.
///
/// `config` is expected to be validated; an out-of-range auth status falls
/// back to `401`.
///
/// # Example
///
/// ```
/// use sluice::build_pipeline;
/// use sluice_config::SluiceConfig;
///
/// let pipeline = build_pipeline(&SluiceConfig::default());
/// assert_eq!(
///     pipeline.middleware_names(),
///     vec!["logging", "body_decoding", "error_response", "cleanup"]
/// );
/// ```
#[must_use]
pub fn build_pipeline(config: &SluiceConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();

    if config.logging.enabled {
        pipeline.add_middleware(LoggingMiddleware::new());
    }

    if config.body_decoding.enabled {
        pipeline.add_middleware(Base64BodyMiddleware::new());
    }

    if config.auth.enabled {
        let status =
            StatusCode::from_u16(config.auth.status_code).unwrap_or(StatusCode::UNAUTHORIZED);
        let mut auth =
            HeaderAuthMiddleware::with_headers(&config.auth.required_headers).status(status);
        if let Some(message) = &config.auth.message {
            auth = auth.message(message.clone());
        }
        pipeline.add_middleware(auth);
    }

    if config.error_response.enabled {
        pipeline.add_middleware(
            ErrorResponseMiddleware::new()
                .expose_internal_errors(config.error_response.expose_internal_errors),
        );
    }

    if !config.response_headers.headers.is_empty() {
        pipeline.add_middleware(ResponseHeadersMiddleware::with_headers(
            &config.response_headers.headers,
        ));
    }

    if config.cleanup.enabled {
        pipeline.add_middleware(
            CleanupMiddleware::new()
                .include_response(config.cleanup.include_response)
                .with_headers(&config.response_headers.headers),
        );
    }

    tracing::debug!(units = ?pipeline.middleware_names(), "pipeline built from configuration");
    pipeline
}

/// Installs the global log subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns an error if the level directive is invalid or a subscriber is
/// already installed.
pub fn init_logging(config: &SluiceConfig) -> TelemetryResult<()> {
    sluice_telemetry::init_logging(&config.logging.to_log_config())
}
