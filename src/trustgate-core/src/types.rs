//! Input records supplied by the session and history stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Severity shared by anomaly findings, risk patterns and risk levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth recording.
    Low,
    /// Worth a look.
    Medium,
    /// Worth acting on.
    High,
}

impl Severity {
    /// Lower-case label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claimed position with the client's reported accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude, degrees.
    pub latitude: f64,
    /// Longitude, degrees.
    pub longitude: f64,
    /// Reported accuracy radius, meters.
    pub accuracy_m: f64,
}

impl Coordinate {
    /// Reject non-finite or out-of-range values.
    pub fn validate(&self) -> Result<(), VerifyError> {
        validate_lat_lng(self.latitude, self.longitude).map_err(VerifyError::invalid_coordinate)?;
        if !self.accuracy_m.is_finite() || self.accuracy_m < 0.0 {
            return Err(VerifyError::invalid_coordinate(
                "accuracy must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Circular region a presence claim must originate from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    /// Center latitude, degrees.
    pub latitude: f64,
    /// Center longitude, degrees.
    pub longitude: f64,
    /// Radius, meters.
    pub radius_m: f64,
}

impl Geofence {
    /// Reject a malformed center or a non-positive radius.
    pub fn validate(&self) -> Result<(), VerifyError> {
        validate_lat_lng(self.latitude, self.longitude).map_err(VerifyError::invalid_geofence)?;
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(VerifyError::invalid_geofence("radius must be positive"));
        }
        Ok(())
    }
}

fn validate_lat_lng(lat: f64, lng: f64) -> Result<(), &'static str> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err("latitude and longitude must be finite");
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err("latitude out of range");
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err("longitude out of range");
    }
    Ok(())
}

/// Local network the client reports being associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReading {
    /// Access point identifier (BSSID).
    pub network_id: String,
    /// Network name, informational only.
    #[serde(default)]
    pub ssid: Option<String>,
    /// Signal strength, dBm.
    #[serde(default)]
    pub signal_strength: Option<i32>,
}

/// Client device identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque fingerprint computed on the client.
    pub fingerprint: String,
    /// User agent string.
    #[serde(default)]
    pub user_agent: String,
    /// Platform string.
    #[serde(default)]
    pub platform: String,
}

/// Scheduled session interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Scheduled start.
    pub start: DateTime<Utc>,
    /// Scheduled end.
    pub end: DateTime<Utc>,
    /// Grace on both sides, minutes. Falls back to the policy default.
    #[serde(default)]
    pub grace_minutes: Option<u32>,
}

impl SessionWindow {
    /// Reject a window that ends before it starts.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.end < self.start {
            return Err(VerifyError::invalid_interval("session ends before it starts"));
        }
        Ok(())
    }
}

/// Everything the session store knows about a session and the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    /// Session identifier, informational.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Where check-ins must come from.
    pub geofence: Geofence,
    /// Allow-listed network identifiers.
    #[serde(default)]
    pub allowed_networks: Vec<String>,
    /// When check-ins are accepted.
    #[serde(default)]
    pub window: Option<SessionWindow>,
    /// Fingerprint registered on the subject's profile, if any.
    #[serde(default)]
    pub registered_fingerprint: Option<String>,
}

/// A single presence claim as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRequest {
    /// Claimed position.
    #[serde(default)]
    pub location: Option<Coordinate>,
    /// Network reading, absent when the client is not associated.
    #[serde(default)]
    pub network: Option<NetworkReading>,
    /// Device identity.
    #[serde(default)]
    pub device: Option<DeviceDescriptor>,
    /// Client clock at submission. Absent means no drift can be measured.
    #[serde(default)]
    pub client_time: Option<DateTime<Utc>>,
}

/// Borrowed, validated parts of a request/session pair.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedInputs<'a> {
    /// Claimed position.
    pub location: &'a Coordinate,
    /// Device identity.
    pub device: &'a DeviceDescriptor,
    /// Session window.
    pub window: &'a SessionWindow,
}

impl VerificationRequest {
    /// Check required fields and ranges before any factor is evaluated.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed field.
    pub fn validate<'a>(
        &'a self,
        session: &'a SessionDescriptor,
    ) -> Result<ValidatedInputs<'a>, VerifyError> {
        let location = self.location.as_ref().ok_or(VerifyError::MissingCoordinate)?;
        let device = self.device.as_ref().ok_or(VerifyError::MissingDevice)?;
        let window = session
            .window
            .as_ref()
            .ok_or(VerifyError::MissingSessionWindow)?;

        location.validate()?;
        session.geofence.validate()?;
        window.validate()?;

        Ok(ValidatedInputs {
            location,
            device,
            window,
        })
    }
}
