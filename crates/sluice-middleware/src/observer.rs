//! Observability hook for the executor.
//!
//! The executor reports phase transitions to a [`PipelineObserver`] supplied
//! when the pipeline is built. Observers see what happens but cannot change
//! it. The default [`TracingObserver`] emits `tracing` events.

use sluice_core::{Response, SluiceError};
use std::fmt;

/// A phase of a single pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Request modifiers, in registration order.
    Request = 1,
    /// The terminal handler.
    Handler = 2,
    /// Response modifiers, in reverse registration order.
    Response = 3,
    /// Error handlers, in registration order over every unit.
    Error = 4,
}

impl Phase {
    /// Returns the phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Handler => "handler",
            Self::Response => "response",
            Self::Error => "error",
        }
    }

    /// Returns all phases in state-machine order.
    #[must_use]
    pub const fn all() -> [Phase; 4] {
        [Self::Request, Self::Handler, Self::Response, Self::Error]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives executor events.
///
/// All methods default to no-ops.
pub trait PipelineObserver: Send + Sync + 'static {
    /// A request, handler or response phase failed and the error phase is
    /// about to start. `unit` is `None` when the terminal handler failed.
    fn phase_failed(&self, _phase: Phase, _unit: Option<&'static str>, _error: &SluiceError) {}

    /// A unit's `on_error` cleared the outstanding error.
    fn error_resolved(&self, _unit: &'static str, _response: &Response) {}

    /// The error phase finished with the error still outstanding.
    fn error_unresolved(&self, _error: &SluiceError) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn phase_failed(&self, phase: Phase, unit: Option<&'static str>, error: &SluiceError) {
        tracing::warn!(
            phase = %phase,
            unit = unit.unwrap_or("handler"),
            category = ?error.category(),
            error = %error,
            "pipeline phase failed, entering error phase"
        );
    }

    fn error_resolved(&self, unit: &'static str, response: &Response) {
        tracing::debug!(
            unit,
            status_code = response.status_code,
            "error resolved into response"
        );
    }

    fn error_unresolved(&self, error: &SluiceError) {
        tracing::error!(
            category = ?error.category(),
            error = %error,
            "error escaped the error phase unresolved"
        );
    }
}
