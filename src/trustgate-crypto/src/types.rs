//! Commitment material types.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Salt length in raw bytes.
pub const SALT_LEN: usize = 32;

/// SHA-256 digest length in raw bytes.
pub const DIGEST_LEN: usize = 32;

/// Domain label mixed into every commitment preimage.
///
/// Labels keep the three commitments of one credential from colliding even
/// when two of them happen to share field text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitmentLabel {
    /// Validity interval of the credential.
    DateRange,
    /// Issuing authority.
    Issuer,
    /// Kind of credential (medical leave, vaccination, ...).
    CredentialType,
}

impl CommitmentLabel {
    /// Preimage prefix for this label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DateRange => "date-range",
            Self::Issuer => "issuer",
            Self::CredentialType => "cred-type",
        }
    }
}

impl fmt::Display for CommitmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holder-side random salt, hex-encoded.
///
/// The salt never leaves the credential holder. `Debug` is redacted so it
/// cannot end up in logs by accident.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Salt(String);

impl Salt {
    /// Generate a fresh salt from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a hex-encoded salt.
    ///
    /// The text is kept as given, since it is hashed verbatim into the
    /// commitment preimages.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::invalid_salt(format!("not hex: {e}")))?;
        if bytes.len() != SALT_LEN {
            return Err(CryptoError::invalid_salt(format!(
                "expected {SALT_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Hex form used inside commitment preimages.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Salt(<redacted>)")
    }
}

impl TryFrom<String> for Salt {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Salt> for String {
    fn from(salt: Salt) -> Self {
        salt.0
    }
}

/// A published SHA-256 commitment, lower-case hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Commitment(String);

impl Commitment {
    /// Wrap a raw digest.
    #[must_use]
    pub fn from_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse a hex-encoded commitment as stored by the commitment store.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let trimmed = s.trim();
        let bytes = hex::decode(trimmed)
            .map_err(|e| CryptoError::invalid_commitment(format!("not hex: {e}")))?;
        if bytes.len() != DIGEST_LEN {
            return Err(CryptoError::invalid_commitment(format!(
                "expected {DIGEST_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against another commitment without early exit on content.
    #[must_use]
    pub fn ct_matches(&self, other: &Self) -> bool {
        crate::constant_time_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Commitment {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Commitment> for String {
    fn from(c: Commitment) -> Self {
        c.0
    }
}

/// The three public commitments published for one credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCommitments {
    /// Commitment to the validity interval.
    pub date_range: Commitment,
    /// Commitment to the issuer identity.
    pub issuer: Commitment,
    /// Commitment to the credential type.
    pub credential_type: Commitment,
}

impl CredentialCommitments {
    /// True iff all three commitments match.
    ///
    /// Every pair is compared before the results are combined.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let date_ok = self.date_range.ct_matches(&other.date_range);
        let issuer_ok = self.issuer.ct_matches(&other.issuer);
        let type_ok = self.credential_type.ct_matches(&other.credential_type);
        date_ok & issuer_ok & type_ok
    }
}
