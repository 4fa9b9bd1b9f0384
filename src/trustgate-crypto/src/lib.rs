//! # trustgate-crypto
//!
//! Commitment primitives for trustgate's selective-disclosure proofs.
//!
//! A credential issuer publishes three salted SHA-256 commitments (date range,
//! issuer, credential type). The holder keeps the field values and the salt,
//! and can later show that the values it claims about are the ones committed
//! to without publishing them.
//!
//! ## Scope
//!
//! This is preimage matching, not a zero-knowledge proof system. A prover who
//! simply asserts the derived booleans is not caught by anything in this
//! crate; soundness comes from the verifier trusting the party that ran the
//! comparison.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod commitment;
mod error;
mod types;

pub use commitment::{
    commit, credential_type_commitment, date_range_commitment, issuer_commitment, sha256,
    sha256_hex, CommitmentPreimage,
};
pub use error::CryptoError;
pub use types::{
    Commitment, CommitmentLabel, CredentialCommitments, Salt, DIGEST_LEN, SALT_LEN,
};

/// Constant-time byte comparison.
///
/// Compares two byte slices in constant time to prevent timing attacks.
/// Returns `true` if the slices are equal, `false` otherwise.
///
/// Uses the `subtle` crate's `ConstantTimeEq` trait for the comparison.
/// The length check still returns early, but length is typically not secret.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Generate a fresh holder salt (32 random bytes, hex-encoded).
#[must_use]
pub fn generate_salt() -> Salt {
    Salt::generate()
}
