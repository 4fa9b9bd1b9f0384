//! Session window containment and clock skew.
//!
//! Server-observed time decides containment. The client's clock is only used
//! to measure drift, which is reported separately: a client can be inside
//! the window and still have a clock nobody should trust.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TimePolicy;
use crate::types::SessionWindow;

/// Result of the time factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCheck {
    /// Server time inside `[start - grace, end + grace]`.
    pub within_window: bool,
    /// Authoritative time of the check.
    pub server_time: DateTime<Utc>,
    /// `|server - client|`, milliseconds. Zero when the client sent no time.
    pub client_drift_ms: i64,
    /// Drift above the policy limit.
    pub drift_flagged: bool,
}

/// Stateless time window verifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindowVerifier {
    policy: TimePolicy,
}

impl TimeWindowVerifier {
    /// Create a verifier with the given policy.
    pub fn new(policy: TimePolicy) -> Self {
        Self { policy }
    }

    /// Grace in effect for a window.
    pub fn grace(&self, window: &SessionWindow) -> Duration {
        let minutes = window
            .grace_minutes
            .unwrap_or(self.policy.default_grace_minutes);
        Duration::minutes(i64::from(minutes))
    }

    /// Inclusive bounds of the acceptance window.
    pub fn bounds(&self, window: &SessionWindow) -> (DateTime<Utc>, DateTime<Utc>) {
        let grace = self.grace(window);
        (window.start - grace, window.end + grace)
    }

    /// Evaluate the time factor.
    pub fn check(
        &self,
        client_time: Option<DateTime<Utc>>,
        window: &SessionWindow,
        server_time: DateTime<Utc>,
    ) -> TimeCheck {
        let (open, close) = self.bounds(window);
        let client_drift_ms = client_time
            .map(|client| (server_time - client).num_milliseconds().abs())
            .unwrap_or(0);

        TimeCheck {
            within_window: server_time >= open && server_time <= close,
            server_time,
            client_drift_ms,
            drift_flagged: client_drift_ms > self.policy.max_clock_drift_ms,
        }
    }
}
