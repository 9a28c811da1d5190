//! Port traits decoupling the analytics core from storage, market data,
//! configuration and diagnostics.

pub mod config_port;
pub mod journal_port;
pub mod market_data_port;
pub mod telemetry_port;

pub use config_port::ConfigPort;
pub use journal_port::JournalPort;
pub use market_data_port::MarketDataPort;
pub use telemetry_port::{NoopTelemetry, TelemetryPort};
