//! Periodic polling of the API's health and statistics.
//!
//! Each tick issues the health check and the stats fetch concurrently. A
//! failed call leaves the previous successful value in place (stale but
//! present) and records the error for display; nothing is retried until
//! the next tick.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::http::{ApiError, ApiStats, HealthStatus, TerminologyClient};

/// What each refresh fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTarget {
    HealthAndStats,
    StatsOnly,
}

/// Latest known dashboard data.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub health: Option<HealthStatus>,
    pub stats: Option<ApiStats>,
    pub last_error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub refreshes: u64,
}

impl DashboardState {
    /// Folds one refresh into the state.
    ///
    /// Successful values replace the old ones; failures only set `last_error`.
    pub fn apply(&mut self, health: Option<Result<HealthStatus, ApiError>>, stats: Result<ApiStats, ApiError>) {
        let mut errors = Vec::new();

        match health {
            Some(Ok(health)) => self.health = Some(health),
            Some(Err(e)) => errors.push(e.to_string()),
            None => {},
        }
        match stats {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => errors.push(e.to_string()),
        }

        self.last_error = if errors.is_empty() { None } else { Some(errors.join("; ")) };
        self.refreshed_at = Some(Utc::now());
        self.refreshes += 1;
    }

    pub fn is_connected(&self) -> bool {
        self.last_error.is_none() && (self.health.is_some() || self.stats.is_some())
    }
}

pub struct Dashboard {
    client: Arc<TerminologyClient>,
    target: PollTarget,
    interval: Duration,
    max_refreshes: Option<u64>,
}

impl Dashboard {
    pub fn new(client: Arc<TerminologyClient>, target: PollTarget, interval: Duration) -> Self {
        Self {
            client,
            target,
            interval,
            max_refreshes: None,
        }
    }

    pub fn with_max_refreshes(mut self, max_refreshes: Option<u64>) -> Self {
        self.max_refreshes = max_refreshes;
        self
    }

    /// Runs one refresh.
    pub async fn refresh(&self, state: &mut DashboardState) {
        match self.target {
            PollTarget::HealthAndStats => {
                let (health, stats) = tokio::join!(self.client.check_health(), self.client.get_stats());
                state.apply(Some(health), stats);
            },
            PollTarget::StatsOnly => {
                let stats = self.client.get_stats().await;
                state.apply(None, stats);
            },
        }

        if let Some(error) = &state.last_error {
            warn!(refresh = state.refreshes; "Dashboard refresh failed: {}", error);
        } else {
            debug!(refresh = state.refreshes; "Dashboard refreshed");
        }
    }

    /// Refreshes on every interval tick until the refresh limit is reached
    /// or a shutdown signal arrives. `on_refresh` sees the state after each tick.
    pub async fn run<F>(&self, mut shutdown_rx: broadcast::Receiver<()>, mut on_refresh: F) -> DashboardState
    where
        F: FnMut(&DashboardState),
    {
        let mut state = DashboardState::default();
        let mut interval = tokio::time::interval(self.interval);

        info!(interval_secs = self.interval.as_secs(); "Dashboard started");

        loop {
            if self.max_refreshes.is_some_and(|max| state.refreshes >= max) {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh(&mut state).await;
                    on_refresh(&state);
                }
                _ = shutdown_rx.recv() => {
                    info!("Dashboard received shutdown signal.");
                    break;
                }
            }
        }

        state
    }
}

/// Formats an uptime in seconds as `"{h}h {m}m"`, `"{m}m {s}s"` or `"{s}s"`.
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
