//! Deterministic decision log and run counters.

pub mod logging;
pub mod telemetry;

pub use logging::{JsonLineLogger, LogFile, LogLevel, LogRotationPolicy, LoggingError};
pub use telemetry::PipelineTelemetry;
