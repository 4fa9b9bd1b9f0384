//! Error types for verification operations.
//!
//! Only malformed input is an error. A failed factor, an anomaly or a risky
//! leave claim is an ordinary result value.

use thiserror::Error;

/// Errors that reject a request before any verdict is computed.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Request carried no coordinate.
    #[error("Missing coordinate")]
    MissingCoordinate,

    /// Request carried no device descriptor.
    #[error("Missing device descriptor")]
    MissingDevice,

    /// Session has no time window.
    #[error("Missing session window")]
    MissingSessionWindow,

    /// Coordinate is non-finite or out of range.
    #[error("Invalid coordinate: {reason}")]
    InvalidCoordinate {
        /// Reason the coordinate is invalid.
        reason: String,
    },

    /// Geofence is malformed.
    #[error("Invalid geofence: {reason}")]
    InvalidGeofence {
        /// Reason the geofence is invalid.
        reason: String,
    },

    /// A time window or date interval ends before it starts.
    #[error("Invalid interval: {reason}")]
    InvalidInterval {
        /// Reason the interval is invalid.
        reason: String,
    },

    /// A policy value is out of its usable range.
    #[error("Invalid policy: {reason}")]
    InvalidPolicy {
        /// Reason the policy is invalid.
        reason: String,
    },
}

impl VerifyError {
    /// Create an invalid coordinate error.
    #[must_use]
    pub fn invalid_coordinate(reason: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            reason: reason.into(),
        }
    }

    /// Create an invalid geofence error.
    #[must_use]
    pub fn invalid_geofence(reason: impl Into<String>) -> Self {
        Self::InvalidGeofence {
            reason: reason.into(),
        }
    }

    /// Create an invalid interval error.
    #[must_use]
    pub fn invalid_interval(reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            reason: reason.into(),
        }
    }

    /// Create an invalid policy error.
    #[must_use]
    pub fn invalid_policy(reason: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            reason: reason.into(),
        }
    }

    /// Check if this error is a missing required field.
    #[must_use]
    pub fn is_missing_field(&self) -> bool {
        matches!(
            self,
            Self::MissingCoordinate | Self::MissingDevice | Self::MissingSessionWindow
        )
    }
}
