//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur while handling commitment material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Salt is not valid hex or has the wrong length.
    #[error("Invalid salt: {reason}")]
    InvalidSalt {
        /// Reason the salt is invalid.
        reason: String,
    },

    /// Commitment digest is not a valid SHA-256 hex string.
    #[error("Invalid commitment: {reason}")]
    InvalidCommitment {
        /// Reason the commitment is invalid.
        reason: String,
    },
}

impl CryptoError {
    /// Create an invalid salt error.
    #[must_use]
    pub fn invalid_salt(reason: impl Into<String>) -> Self {
        Self::InvalidSalt {
            reason: reason.into(),
        }
    }

    /// Create an invalid commitment error.
    #[must_use]
    pub fn invalid_commitment(reason: impl Into<String>) -> Self {
        Self::InvalidCommitment {
            reason: reason.into(),
        }
    }
}
