//! Telemetry sink that writes to stderr, keeping stdout clean for the
//! JSON payloads the CLI emits.

use crate::ports::telemetry_port::TelemetryPort;

pub struct StderrTelemetry;

impl TelemetryPort for StderrTelemetry {
    fn event(&self, component: &str, message: &str) {
        eprintln!("[{component}] {message}");
    }
}
