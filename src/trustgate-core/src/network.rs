//! Local network membership.

use serde::{Deserialize, Serialize};

use crate::types::NetworkReading;

/// Outcome of the network factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    /// Reading matches an allow-listed network.
    Verified,
    /// Reading present but not allow-listed.
    Mismatch,
    /// Client reported no network at all.
    Absent,
}

/// Result of the network factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCheck {
    /// Verified, mismatch or absent.
    pub status: NetworkStatus,
    /// Normalized identifier of the matching allow-list entry.
    pub matched_network: Option<String>,
}

impl NetworkCheck {
    /// True only for an allow-listed reading.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.status == NetworkStatus::Verified
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

/// Match a reading against the session allow-list.
///
/// Comparison is exact after trimming and lower-casing both sides.
pub fn verify_network(reading: Option<&NetworkReading>, allowed: &[String]) -> NetworkCheck {
    let Some(reading) = reading else {
        return NetworkCheck {
            status: NetworkStatus::Absent,
            matched_network: None,
        };
    };

    let observed = normalize(&reading.network_id);
    match allowed.iter().map(|a| normalize(a)).find(|a| *a == observed) {
        Some(matched) => NetworkCheck {
            status: NetworkStatus::Verified,
            matched_network: Some(matched),
        },
        None => NetworkCheck {
            status: NetworkStatus::Mismatch,
            matched_network: None,
        },
    }
}
