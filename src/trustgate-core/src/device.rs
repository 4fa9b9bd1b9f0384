//! Client device identity checks.
//!
//! Detects compromised or virtual client environments from the strings the
//! client reports about itself:
//! - Emulators and virtualized Android images
//! - Rooted Android / jailbroken iOS devices
//! - Devices other than the one registered on the subject's profile
//!
//! ## Design Philosophy
//!
//! These are signature scans over self-reported strings, so a determined
//! client can hide them. They catch the default configurations of common
//! emulators and tamper tools, which is where most casual spoofing lives.

use serde::{Deserialize, Serialize};

use crate::types::DeviceDescriptor;

/// Known virtualization signatures, lower case.
pub const EMULATOR_SIGNATURES: &[&str] = &[
    "generic",
    "emulator",
    "sdk_gphone",
    "android sdk",
    "goldfish",
    "ranchu",
    "vbox",
    "genymotion",
    "bluestacks",
    "nox",
    "memu",
];

/// Known root / jailbreak tool signatures, lower case.
pub const ROOT_SIGNATURES: &[&str] = &["supersu", "magisk", "kingroot", "cydia", "substrate"];

/// Result of the device factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCheck {
    /// Fingerprint is the registered one (or none is registered).
    pub is_registered: bool,
    /// Emulator signature found.
    pub is_emulator: bool,
    /// Root or jailbreak signature found.
    pub is_rooted: bool,
    /// Fingerprint equals the registered value.
    pub fingerprint_match: bool,
}

// =============================================================================
// Signature scans
// =============================================================================

fn contains_any(device: &DeviceDescriptor, signatures: &[&str]) -> bool {
    let ua = device.user_agent.to_lowercase();
    let platform = device.platform.to_lowercase();
    signatures
        .iter()
        .any(|sig| ua.contains(sig) || platform.contains(sig))
}

/// Check if the device reports an emulator.
pub fn is_emulator(device: &DeviceDescriptor) -> bool {
    contains_any(device, EMULATOR_SIGNATURES)
}

/// Check if the device reports a root or jailbreak tool.
pub fn is_rooted(device: &DeviceDescriptor) -> bool {
    contains_any(device, ROOT_SIGNATURES)
}

// =============================================================================
// Fingerprint
// =============================================================================

/// Exact fingerprint comparison.
///
/// With nothing registered the device is accepted; first-use registration
/// belongs to the profile service.
pub fn fingerprint_matches(device: &DeviceDescriptor, registered: Option<&str>) -> bool {
    match registered {
        Some(expected) => device.fingerprint == expected,
        None => true,
    }
}

/// Evaluate the device factor.
pub fn verify_device(device: &DeviceDescriptor, registered: Option<&str>) -> DeviceCheck {
    let fingerprint_match = fingerprint_matches(device, registered);
    DeviceCheck {
        is_registered: fingerprint_match,
        is_emulator: is_emulator(device),
        is_rooted: is_rooted(device),
        fingerprint_match,
    }
}
