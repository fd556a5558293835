//! Local request telemetry for the terminology client.
//!
//! Tracks what *this* process observed: a monotonic attempt counter and a
//! bounded window of recent latencies. This is independent from the
//! server-side statistics returned by `/api/v1/stats`.
//!
//! The counter and the window live behind a single lock so that
//! [`RequestTelemetry::reset`] clears both together and readers never see
//! one cleared without the other.

mod breakdown;
mod window;

use std::time::Instant;

use serde::Serialize;
use tokio::sync::RwLock;

pub use breakdown::LatencyBreakdown;
pub use window::{LATENCY_WINDOW_CAPACITY, LatencyWindow};

#[derive(Debug, Default)]
struct TelemetryState {
    request_count: u64,
    latencies: LatencyWindow,
}

/// Point-in-time copy of the local telemetry, read under one lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub request_count: u64,
    pub average_response_time_ms: u64,
    pub response_times_ms: Vec<u64>,
}

impl TelemetrySnapshot {
    pub fn breakdown(&self) -> LatencyBreakdown {
        LatencyBreakdown::from_samples(&self.response_times_ms)
    }
}

/// Attempt counter plus latency window shared by every call of one client.
#[derive(Debug, Default)]
pub struct RequestTelemetry {
    state: RwLock<TelemetryState>,
}

impl RequestTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a new attempt and returns the start instant owned by that call.
    ///
    /// The attempt is counted even if the call later fails or is dropped
    /// before completing.
    pub async fn begin_request(&self) -> Instant {
        self.state.write().await.request_count += 1;
        Instant::now()
    }

    /// Records the elapsed time since `started` and returns it in milliseconds.
    pub async fn complete_request(&self, started: Instant) -> u64 {
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.record_sample(elapsed_ms).await;
        elapsed_ms
    }

    pub async fn record_sample(&self, elapsed_ms: u64) {
        self.state.write().await.latencies.push(elapsed_ms);
    }

    pub async fn request_count(&self) -> u64 {
        self.state.read().await.request_count
    }

    pub async fn average_response_time(&self) -> u64 {
        self.state.read().await.latencies.average()
    }

    /// Returns a copy of the recorded latencies, oldest first.
    pub async fn response_times(&self) -> Vec<u64> {
        self.state.read().await.latencies.to_vec()
    }

    pub async fn snapshot(&self) -> TelemetrySnapshot {
        let state = self.state.read().await;
        TelemetrySnapshot {
            request_count: state.request_count,
            average_response_time_ms: state.latencies.average(),
            response_times_ms: state.latencies.to_vec(),
        }
    }

    /// Clears the counter and the latency window in one step.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.request_count = 0;
        state.latencies.clear();
    }
}
