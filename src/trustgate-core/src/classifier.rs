//! Legitimacy classification and event status.
//!
//! The classifier computes its own additive suspicion score from the primary
//! factors of a verification outcome plus the subject's recent history. It
//! is independent of the pass/fail score: an event can pass verification and
//! still be classified suspicious because of what came before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anomaly::HistoricalEvent;
use crate::config::{AnomalyPolicy, ClassifierWeights};
use crate::geo::in_boundary_band;
use crate::scoring::VerificationOutcome;
use crate::time_window::TimeWindowVerifier;
use crate::types::SessionWindow;

/// Counts over a subject's recent events, supplied by the history store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySummary {
    /// Events considered.
    pub total_events: u32,
    /// Events that ended present or late.
    pub attended: u32,
    /// Events that ended flagged.
    pub flagged: u32,
    /// Check-ins followed by losing the session network.
    pub wifi_disconnect_after_checkin: u32,
    /// Check-ins from just inside the geofence edge.
    pub boundary_checkins: u32,
    /// Mean seconds between window open and check-in, when known.
    pub average_checkin_delay_secs: Option<f64>,
}

impl HistorySummary {
    /// Summarize a subject's past events.
    ///
    /// Events without a verified network count as post-check-in disconnects.
    /// The mean delay is taken over events that recorded one.
    pub fn from_events(events: &[HistoricalEvent], policy: &AnomalyPolicy) -> Self {
        let mut summary = Self {
            total_events: saturating_u32(events.len()),
            ..Self::default()
        };
        let mut delay_sum = 0.0;
        let mut delay_count = 0u32;

        for event in events {
            match event.status {
                Some(EventStatus::Present | EventStatus::Late) => summary.attended += 1,
                Some(EventStatus::Flagged) => summary.flagged += 1,
                None => {},
            }
            if !event.network_verified {
                summary.wifi_disconnect_after_checkin += 1;
            }
            let radius = event.geofence_radius_m.unwrap_or(policy.default_radius_m);
            if in_boundary_band(event.geofence_distance_m, radius, policy.boundary_band_fraction) {
                summary.boundary_checkins += 1;
            }
            if let Some(delay) = event.checkin_delay_secs {
                delay_sum += delay;
                delay_count += 1;
            }
        }

        if delay_count > 0 {
            summary.average_checkin_delay_secs = Some(delay_sum / f64::from(delay_count));
        }
        summary
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Three-way legitimacy verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Legitimacy {
    /// Nothing notable.
    Legitimate,
    /// Minor anomalies, keep monitoring.
    Suspicious,
    /// Needs review.
    Flagged,
}

/// Classifier output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Verdict band.
    pub verdict: Legitimacy,
    /// Suspicion score, 0-100.
    pub score: u8,
    /// Band explanation citing the score.
    pub reason: String,
    /// One entry per applied penalty.
    pub patterns: Vec<String>,
}

/// Combines a verification outcome with history into a verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventClassifier {
    weights: ClassifierWeights,
}

impl EventClassifier {
    /// Create a classifier with the given weights.
    pub fn new(weights: ClassifierWeights) -> Self {
        Self { weights }
    }

    /// Classify one event.
    pub fn classify(
        &self,
        outcome: &VerificationOutcome,
        history: Option<&HistorySummary>,
    ) -> Classification {
        let w = &self.weights;
        let mut score: u32 = 0;
        let mut patterns = Vec::new();

        if !outcome.geo.within_geofence {
            score = score.saturating_add(w.outside_geofence);
            patterns.push("Location outside the session geofence".to_string());
        }
        if !outcome.network.is_verified() {
            score = score.saturating_add(w.network_unverified);
            patterns.push("Not connected to a session network".to_string());
        }
        if !outcome.device.is_registered {
            score = score.saturating_add(w.device_unregistered);
            patterns.push("Unregistered device used for check-in".to_string());
        }
        if !outcome.time.within_window {
            score = score.saturating_add(w.outside_window);
            patterns.push("Check-in outside the session window".to_string());
        }

        if let Some(hist) = history {
            if hist.flagged > w.prior_flags_over {
                score = score.saturating_add(w.prior_flags);
                patterns.push(format!("Previously flagged {} times", hist.flagged));
            }
            if hist.wifi_disconnect_after_checkin > w.wifi_disconnects_over {
                score = score.saturating_add(w.wifi_disconnects);
                patterns.push(format!(
                    "Network disconnected shortly after check-in {} times",
                    hist.wifi_disconnect_after_checkin
                ));
            }
            if hist.boundary_checkins > w.boundary_checkins_over {
                score = score.saturating_add(w.boundary_checkins);
                patterns.push(format!(
                    "Checked in from the geofence boundary {} times",
                    hist.boundary_checkins
                ));
            }
            if let Some(delay) = hist.average_checkin_delay_secs {
                if delay < w.fast_checkin_secs {
                    score = score.saturating_add(w.fast_checkin);
                    patterns.push(
                        "Suspiciously fast check-in timing (possible automation)".to_string(),
                    );
                }
            }
        }

        // Capped at 100, so the narrowing cast is lossless.
        let score = score.min(100) as u8;
        let (verdict, reason) = if score <= w.legitimate_max {
            (
                Legitimacy::Legitimate,
                format!("All factors verified, no anomalies detected (score: {score}/100)."),
            )
        } else if score <= w.suspicious_max {
            (
                Legitimacy::Suspicious,
                format!("Minor anomalies detected (score: {score}/100). Monitoring."),
            )
        } else {
            (
                Legitimacy::Flagged,
                format!(
                    "Multiple verification failures detected (score: {score}/100). \
                     Manual review recommended."
                ),
            )
        };

        debug!(score, verdict = ?verdict, patterns = patterns.len(), "Event classified");

        Classification {
            verdict,
            score,
            reason,
            patterns,
        }
    }
}

/// Final status of a presence event.
///
/// Assigned once; there are no transitions afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// On time and trusted.
    Present,
    /// Trusted but after the start grace.
    Late,
    /// Failed verification or classified flagged.
    Flagged,
}

/// Derive the event status.
///
/// Flagged if verification failed or the classifier flagged the event;
/// otherwise late when the check-in came after `start + grace`; otherwise
/// present.
pub fn derive_status(
    outcome: &VerificationOutcome,
    classification: &Classification,
    window: &SessionWindow,
    time_verifier: &TimeWindowVerifier,
) -> EventStatus {
    if !outcome.passed || classification.verdict == Legitimacy::Flagged {
        return EventStatus::Flagged;
    }
    if is_late(outcome.time.server_time, window, time_verifier) {
        EventStatus::Late
    } else {
        EventStatus::Present
    }
}

fn is_late(
    checked_in_at: DateTime<Utc>,
    window: &SessionWindow,
    time_verifier: &TimeWindowVerifier,
) -> bool {
    checked_in_at > window.start + time_verifier.grace(window)
}
