//! Logging setup shared by the payhook services.
//! Installs a `tracing` subscriber with an `EnvFilter` and a JSON or text formatter.

mod config;
mod tracing_init;

pub use config::{LogFormat, TelemetryConfig};
pub use tracing_init::{init_telemetry, telemetry_initialised};
