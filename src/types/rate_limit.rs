//! The GitHub core rate-limit window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Below this many remaining calls, outbound work waits for the reset.
pub const LOW_WATER_MARK: u64 = 10;

/// Slack added on top of the reported reset time.
pub const RESET_SLACK: Duration = Duration::from_secs(1);

/// Remaining quota for the core REST API, as reported by `GET /rate_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitWindow {
    pub remaining: u64,
    pub limit: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitWindow {
    pub fn is_exhausted(&self) -> bool {
        self.remaining < LOW_WATER_MARK
    }

    /// How long a caller must wait before making another call at `now`.
    ///
    /// Zero while the window has headroom. Otherwise the time until reset
    /// plus one second; a reset already in the past yields just the slack.
    pub fn wait_duration(&self, now: DateTime<Utc>) -> Duration {
        if !self.is_exhausted() {
            return Duration::ZERO;
        }
        let until_reset = (self.reset_at - now).to_std().unwrap_or(Duration::ZERO);
        until_reset + RESET_SLACK
    }
}
