pub mod cli;
pub mod config;
pub mod dashboard;
pub mod http;
pub mod log;
pub mod telemetry;

pub use crate::http::{ApiError, TerminologyClient};
pub use crate::telemetry::TelemetrySnapshot;
