//! Policy configuration for the trust engine.
//!
//! Every weight, threshold and band cutoff used by the verifiers, scorers and
//! detectors lives here. `Default` reproduces the reference policy; any field
//! can be overridden from a JSON policy file, missing fields keep their
//! defaults.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Complete trust policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Geofence and location plausibility.
    pub geo: GeoPolicy,
    /// Session window and clock skew.
    pub time: TimePolicy,
    /// Pass/fail scoring penalties.
    pub scoring: ScoringWeights,
    /// Legitimacy classification penalties and bands.
    pub classifier: ClassifierWeights,
    /// Cross-event anomaly detection.
    pub anomaly: AnomalyPolicy,
    /// Leave claim risk assessment.
    pub risk: RiskPolicy,
    /// Selective-disclosure proofs.
    pub proof: ProofPolicy,
}

impl PolicyConfig {
    /// Parse a policy from JSON, filling unspecified fields with defaults.
    ///
    /// Values that parse but cannot be used (a non-positive proof lifetime)
    /// are rejected as data errors.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let policy: Self = serde_json::from_str(json)?;
        policy
            .validate()
            .map_err(<serde_json::Error as serde::de::Error>::custom)?;
        Ok(policy)
    }

    /// Check values that deserialize but would break an operation.
    pub fn validate(&self) -> Result<(), VerifyError> {
        self.proof.ttl().map(|_| ())
    }
}

/// Geofence and location plausibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPolicy {
    /// Mean Earth radius for haversine distance, meters.
    pub earth_radius_m: f64,
    /// Reported accuracy below this is implausibly precise, meters.
    pub min_plausible_accuracy_m: f64,
    /// Reported accuracy above this is too coarse to trust, meters.
    pub max_plausible_accuracy_m: f64,
}

impl Default for GeoPolicy {
    fn default() -> Self {
        Self {
            earth_radius_m: 6_371_000.0,
            min_plausible_accuracy_m: 1.0,
            max_plausible_accuracy_m: 500.0,
        }
    }
}

/// Session window policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimePolicy {
    /// Grace applied when a session window does not specify one, minutes.
    pub default_grace_minutes: u32,
    /// Client/server drift above this is flagged, milliseconds.
    pub max_clock_drift_ms: i64,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            default_grace_minutes: 5,
            max_clock_drift_ms: 60_000,
        }
    }
}

/// Penalties subtracted from 100 by the aggregate scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Coordinate outside the geofence.
    pub outside_geofence: u32,
    /// Coordinate looks mocked.
    pub mock_location: u32,
    /// Network reading present but not allow-listed.
    pub network_mismatch: u32,
    /// No network reading at all.
    pub network_absent: u32,
    /// Emulator signature found.
    pub emulator: u32,
    /// Root or jailbreak signature found.
    pub rooted: u32,
    /// Fingerprint differs from the registered one.
    pub fingerprint_mismatch: u32,
    /// Server time outside the session window.
    pub outside_window: u32,
    /// Client clock drift above the limit.
    pub clock_drift: u32,
    /// Minimum score that passes.
    pub pass_threshold: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            outside_geofence: 30,
            mock_location: 25,
            network_mismatch: 20,
            network_absent: 10,
            emulator: 30,
            rooted: 15,
            fingerprint_mismatch: 15,
            outside_window: 20,
            clock_drift: 10,
            pass_threshold: 60,
        }
    }
}

/// Additive penalties and bands for legitimacy classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierWeights {
    /// Coordinate outside the geofence.
    pub outside_geofence: u32,
    /// Network not verified (mismatch or absent).
    pub network_unverified: u32,
    /// Device fingerprint not registered.
    pub device_unregistered: u32,
    /// Outside the session window.
    pub outside_window: u32,
    /// Added when prior flagged events exceed `prior_flags_over`.
    pub prior_flags: u32,
    /// Prior flagged count must exceed this.
    pub prior_flags_over: u32,
    /// Added when post-check-in network disconnects exceed `wifi_disconnects_over`.
    pub wifi_disconnects: u32,
    /// Disconnect count must exceed this.
    pub wifi_disconnects_over: u32,
    /// Added when boundary check-ins exceed `boundary_checkins_over`.
    pub boundary_checkins: u32,
    /// Boundary check-in count must exceed this.
    pub boundary_checkins_over: u32,
    /// Added when the mean check-in delay is below `fast_checkin_secs`.
    pub fast_checkin: u32,
    /// Delay below which check-ins look automated, seconds.
    pub fast_checkin_secs: f64,
    /// Highest score classified legitimate.
    pub legitimate_max: u8,
    /// Highest score classified suspicious.
    pub suspicious_max: u8,
}

impl Default for ClassifierWeights {
    fn default() -> Self {
        Self {
            outside_geofence: 30,
            network_unverified: 20,
            device_unregistered: 15,
            outside_window: 10,
            prior_flags: 15,
            prior_flags_over: 3,
            wifi_disconnects: 20,
            wifi_disconnects_over: 5,
            boundary_checkins: 15,
            boundary_checkins_over: 3,
            fast_checkin: 10,
            fast_checkin_secs: 1.0,
            legitimate_max: 20,
            suspicious_max: 50,
        }
    }
}

/// Cross-event anomaly detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyPolicy {
    /// Unverified-network events needed for a finding.
    pub unverified_network_min: usize,
    /// Unverified-network events at which the finding becomes high.
    pub unverified_network_high: usize,
    /// Half-width of the boundary band as a fraction of the radius.
    pub boundary_band_fraction: f64,
    /// Radius assumed for events that do not carry one, meters.
    pub default_radius_m: f64,
    /// Boundary events needed for a finding.
    pub boundary_min: usize,
    /// Events needed before timing regularity is considered.
    pub timing_min_events: usize,
    /// Mean suspicion score above which a finding is raised.
    pub elevated_average: f64,
    /// Mean suspicion score above which the finding is high.
    pub elevated_average_high: f64,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            unverified_network_min: 3,
            unverified_network_high: 5,
            boundary_band_fraction: 0.2,
            default_radius_m: 100.0,
            boundary_min: 3,
            timing_min_events: 5,
            elevated_average: 40.0,
            elevated_average_high: 60.0,
        }
    }
}

/// Leave claim risk policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    /// Correlation rate above which the date pattern is high.
    pub correlation_high: f64,
    /// Correlation rate above which the date pattern is medium.
    pub correlation_medium: f64,
    /// Multiple of the class average that counts as a frequency anomaly.
    pub frequency_multiple: f64,
    /// Ratio above which the frequency pattern is high.
    pub ratio_high: f64,
    /// Ratio above which the frequency pattern is medium.
    pub ratio_medium: f64,
    /// Score added for a high-severity date correlation.
    pub correlation_high_add: u32,
    /// Score added for a high-severity frequency anomaly.
    pub frequency_high_add: u32,
    /// Score added for a medium-severity pattern.
    pub medium_add: u32,
    /// Score added for a low-severity pattern.
    pub low_add: u32,
    /// Score added when a leave starts on Monday or Friday.
    pub weekday_add: u32,
    /// Highest score auto-approved.
    pub auto_approve_max: u8,
    /// Highest score sent to manual review.
    pub manual_review_max: u8,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            correlation_high: 0.7,
            correlation_medium: 0.4,
            frequency_multiple: 2.0,
            ratio_high: 5.0,
            ratio_medium: 3.0,
            correlation_high_add: 35,
            frequency_high_add: 30,
            medium_add: 20,
            low_add: 10,
            weekday_add: 10,
            auto_approve_max: 25,
            manual_review_max: 60,
        }
    }
}

/// Selective-disclosure proof policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofPolicy {
    /// Proof lifetime after generation, seconds.
    pub ttl_secs: i64,
}

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
        }
    }
}

impl ProofPolicy {
    /// Proof lifetime; must be positive and representable.
    pub fn ttl(&self) -> Result<Duration, VerifyError> {
        if self.ttl_secs <= 0 {
            return Err(VerifyError::invalid_policy(format!(
                "proof ttl_secs must be positive, got {}",
                self.ttl_secs
            )));
        }
        Duration::try_seconds(self.ttl_secs).ok_or_else(|| {
            VerifyError::invalid_policy(format!("proof ttl_secs {} is out of range", self.ttl_secs))
        })
    }
}
