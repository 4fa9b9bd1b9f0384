//! Aggregate trust score over the four presence factors.
//!
//! ## Scoring Rules
//!
//! Start at 100 and subtract a fixed penalty for every failed or risky
//! factor, floored at 0. The outcome passes when the score reaches the
//! policy threshold. Every applied penalty is listed, in evaluation order.

use std::fmt;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use trustgate_crypto::sha256_hex;

use crate::config::ScoringWeights;
use crate::device::DeviceCheck;
use crate::geo::GeoCheck;
use crate::network::{NetworkCheck, NetworkStatus};
use crate::time_window::TimeCheck;

/// A penalty the scorer applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedFactor {
    /// Coordinate outside the geofence.
    OutsideGeofence,
    /// Coordinate looks mocked.
    MockLocation,
    /// Network reading not allow-listed.
    NetworkMismatch,
    /// No network reading.
    NetworkAbsent,
    /// Emulator signature.
    Emulator,
    /// Root or jailbreak signature.
    Rooted,
    /// Fingerprint not the registered one.
    FingerprintMismatch,
    /// Server time outside the session window.
    OutsideWindow,
    /// Client clock drift over the limit.
    ClockDrift,
}

impl FailedFactor {
    /// Penalty under the given weights.
    #[must_use]
    pub fn penalty(&self, weights: &ScoringWeights) -> u32 {
        match self {
            Self::OutsideGeofence => weights.outside_geofence,
            Self::MockLocation => weights.mock_location,
            Self::NetworkMismatch => weights.network_mismatch,
            Self::NetworkAbsent => weights.network_absent,
            Self::Emulator => weights.emulator,
            Self::Rooted => weights.rooted,
            Self::FingerprintMismatch => weights.fingerprint_mismatch,
            Self::OutsideWindow => weights.outside_window,
            Self::ClockDrift => weights.clock_drift,
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::OutsideGeofence => "GPS: Outside geofence",
            Self::MockLocation => "GPS: Mock location detected",
            Self::NetworkMismatch => "Network: Identifier not on the session allow-list",
            Self::NetworkAbsent => "Network: Not connected to a session network",
            Self::Emulator => "Device: Emulator detected",
            Self::Rooted => "Device: Root/jailbreak detected",
            Self::FingerprintMismatch => "Device: Unregistered device",
            Self::OutsideWindow => "Time: Outside session window",
            Self::ClockDrift => "Time: Significant clock drift detected",
        }
    }
}

impl fmt::Display for FailedFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Full result of verifying one presence claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    /// Location factor.
    pub geo: GeoCheck,
    /// Network factor.
    pub network: NetworkCheck,
    /// Device factor.
    pub device: DeviceCheck,
    /// Time factor.
    pub time: TimeCheck,
    /// Aggregate score, 0-100.
    pub score: u8,
    /// Score reached the pass threshold.
    pub passed: bool,
    /// Every penalty applied, in evaluation order.
    pub failed_factors: Vec<FailedFactor>,
}

impl VerificationOutcome {
    /// Failure reasons as display strings.
    pub fn failure_reasons(&self) -> Vec<String> {
        self.failed_factors.iter().map(ToString::to_string).collect()
    }
}

/// Fuses the four factor checks into one score.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateScorer {
    weights: ScoringWeights,
}

impl AggregateScorer {
    /// Create a scorer with the given weights.
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Factors that incur a penalty, in evaluation order.
    pub fn failed_factors(
        geo: &GeoCheck,
        network: &NetworkCheck,
        device: &DeviceCheck,
        time: &TimeCheck,
    ) -> Vec<FailedFactor> {
        let mut failed = Vec::new();

        if !geo.within_geofence {
            failed.push(FailedFactor::OutsideGeofence);
        }
        if geo.is_mock_location {
            failed.push(FailedFactor::MockLocation);
        }
        match network.status {
            NetworkStatus::Verified => {},
            NetworkStatus::Mismatch => failed.push(FailedFactor::NetworkMismatch),
            NetworkStatus::Absent => failed.push(FailedFactor::NetworkAbsent),
        }
        if device.is_emulator {
            failed.push(FailedFactor::Emulator);
        }
        if device.is_rooted {
            failed.push(FailedFactor::Rooted);
        }
        if !device.fingerprint_match {
            failed.push(FailedFactor::FingerprintMismatch);
        }
        if !time.within_window {
            failed.push(FailedFactor::OutsideWindow);
        }
        if time.drift_flagged {
            failed.push(FailedFactor::ClockDrift);
        }

        failed
    }

    /// Score a set of failed factors, clamped to 0..=100.
    pub fn score_factors(&self, failed: &[FailedFactor]) -> u8 {
        let deducted: i64 = failed
            .iter()
            .map(|f| i64::from(f.penalty(&self.weights)))
            .sum();
        // Clamped to 0..=100, so the narrowing cast is lossless.
        (100 - deducted).clamp(0, 100) as u8
    }

    /// Build the aggregate outcome.
    pub fn score(
        &self,
        geo: GeoCheck,
        network: NetworkCheck,
        device: DeviceCheck,
        time: TimeCheck,
    ) -> VerificationOutcome {
        let failed_factors = Self::failed_factors(&geo, &network, &device, &time);
        let score = self.score_factors(&failed_factors);

        VerificationOutcome {
            geo,
            network,
            device,
            time,
            score,
            passed: score >= self.weights.pass_threshold,
            failed_factors,
        }
    }
}

#[derive(Serialize)]
struct VerificationDigest<'a> {
    gps: bool,
    wifi: bool,
    device: bool,
    time: bool,
    score: u8,
    timestamp: &'a str,
}

/// Digest of an outcome for the external ledger.
///
/// Binds the four factor verdicts, the score and the server time. No
/// coordinates or identifiers enter the digest.
pub fn verification_hash(outcome: &VerificationOutcome) -> String {
    let timestamp = outcome
        .time
        .server_time
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let digest = VerificationDigest {
        gps: outcome.geo.within_geofence,
        wifi: outcome.network.is_verified(),
        device: outcome.device.fingerprint_match,
        time: outcome.time.within_window,
        score: outcome.score,
        timestamp: &timestamp,
    };
    // Serializing a struct of bools, an integer and a string cannot fail.
    let payload = serde_json::to_vec(&digest).unwrap_or_default();
    sha256_hex(&payload)
}
