//! Diagnostics sink passed into the analytics components.
//!
//! Computation stays pure; anything a component wants to report about its
//! own filtering decisions goes through this trait instead of stdout.

pub trait TelemetryPort {
    fn event(&self, component: &str, message: &str);
}

/// Discards everything. The default for library callers and tests.
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn event(&self, _component: &str, _message: &str) {}
}
