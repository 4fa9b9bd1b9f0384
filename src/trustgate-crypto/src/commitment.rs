//! Salted hash commitments.
//!
//! A commitment is `SHA-256(label ":" field ":" ... ":" salt)`. Given the same
//! fields and salt the digest is bit-identical; the salt keeps low-entropy
//! fields (dates, issuer names) from being brute-forced out of the public
//! record.
//!
//! ```text
//! date-range : valid_from : valid_to            : salt
//! issuer     : issuer_id  : issuer_name         : salt
//! cred-type  : credential_type                  : salt
//! ```

use sha2::{Digest, Sha256};

use crate::types::{Commitment, CommitmentLabel, CredentialCommitments, Salt, DIGEST_LEN};

/// SHA-256 over raw bytes.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 over raw bytes, lower-case hex.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Commit to an ordered list of field values under a label.
#[must_use]
pub fn commit(label: CommitmentLabel, fields: &[&str], salt: &Salt) -> Commitment {
    let mut hasher = Sha256::new();
    hasher.update(label.as_str().as_bytes());
    for field in fields {
        hasher.update(b":");
        hasher.update(field.as_bytes());
    }
    hasher.update(b":");
    hasher.update(salt.as_str().as_bytes());
    Commitment::from_digest(hasher.finalize().into())
}

/// Commitment to a validity interval.
#[must_use]
pub fn date_range_commitment(valid_from: &str, valid_to: &str, salt: &Salt) -> Commitment {
    commit(CommitmentLabel::DateRange, &[valid_from, valid_to], salt)
}

/// Commitment to an issuer identity.
#[must_use]
pub fn issuer_commitment(issuer_id: &str, issuer_name: &str, salt: &Salt) -> Commitment {
    commit(CommitmentLabel::Issuer, &[issuer_id, issuer_name], salt)
}

/// Commitment to a credential type.
#[must_use]
pub fn credential_type_commitment(credential_type: &str, salt: &Salt) -> Commitment {
    commit(CommitmentLabel::CredentialType, &[credential_type], salt)
}

/// Private field values a credential's commitments are computed over.
#[derive(Debug, Clone, Copy)]
pub struct CommitmentPreimage<'a> {
    /// Start of validity, canonical text form.
    pub valid_from: &'a str,
    /// End of validity, canonical text form.
    pub valid_to: &'a str,
    /// Issuer identifier.
    pub issuer_id: &'a str,
    /// Issuer display name.
    pub issuer_name: &'a str,
    /// Credential type tag.
    pub credential_type: &'a str,
    /// Holder salt shared by all three commitments.
    pub salt: &'a Salt,
}

impl CommitmentPreimage<'_> {
    /// Compute all three commitments.
    ///
    /// Used once at issuance to publish the record, and again by the holder
    /// when proving knowledge of the preimages.
    #[must_use]
    pub fn commitments(&self) -> CredentialCommitments {
        CredentialCommitments {
            date_range: date_range_commitment(self.valid_from, self.valid_to, self.salt),
            issuer: issuer_commitment(self.issuer_id, self.issuer_name, self.salt),
            credential_type: credential_type_commitment(self.credential_type, self.salt),
        }
    }
}
