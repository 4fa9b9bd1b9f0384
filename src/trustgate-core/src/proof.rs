//! Selective-disclosure proofs over committed credentials.
//!
//! ## Flow
//!
//! 1. At issuance the holder's fields and a random salt produce three public
//!    commitments ([`issue_commitments`]).
//! 2. To use the credential the holder supplies the preimages again. The
//!    engine recomputes the commitments, derives four booleans and seals them
//!    in a [`Proof`] with a nonce and an expiry.
//! 3. Anyone holding the proof can check it later with
//!    [`ProofEngine::verify_at`]. Verification inspects the sealed claims and
//!    the clock; it never sees the preimages again.
//!
//! ## Limits
//!
//! The proof blob commits to the *result*, not to the computation. A party
//! that fabricates a `Proof` with all claims set is not detected here; the
//! verifier relies on trusting whoever ran generation.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use trustgate_crypto::{sha256_hex, CommitmentPreimage, CredentialCommitments, Salt};

use crate::config::ProofPolicy;
use crate::error::VerifyError;

/// Date form used inside commitment preimages.
const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Inputs
// =============================================================================

/// The holder's private credential fields.
///
/// Never serialized into a proof or logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateCredential {
    /// First day the credential is valid.
    pub valid_from: NaiveDate,
    /// Last day the credential is valid.
    pub valid_to: NaiveDate,
    /// Issuer identifier.
    pub issuer_id: String,
    /// Issuer display name.
    pub issuer_name: String,
    /// Credential type tag.
    pub credential_type: String,
    /// Holder salt.
    pub salt: Salt,
}

impl PrivateCredential {
    /// Compute the three commitments over these fields.
    pub fn commitments(&self) -> CredentialCommitments {
        let valid_from = self.valid_from.format(DATE_FORMAT).to_string();
        let valid_to = self.valid_to.format(DATE_FORMAT).to_string();
        CommitmentPreimage {
            valid_from: &valid_from,
            valid_to: &valid_to,
            issuer_id: &self.issuer_id,
            issuer_name: &self.issuer_name,
            credential_type: &self.credential_type,
            salt: &self.salt,
        }
        .commitments()
    }

    /// Validity contains `[from, to]`, both ends inclusive.
    pub fn covers(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.valid_from <= from && self.valid_to >= to
    }
}

impl std::fmt::Debug for PrivateCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateCredential")
            .field("credential_type", &self.credential_type)
            .finish_non_exhaustive()
    }
}

/// Public commitments for a new credential.
pub fn issue_commitments(credential: &PrivateCredential) -> CredentialCommitments {
    credential.commitments()
}

/// What the verifier wants proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimParameters {
    /// First requested day.
    pub requested_from: NaiveDate,
    /// Last requested day.
    pub requested_to: NaiveDate,
    /// Issuer identifiers the verifier accepts.
    pub authorized_issuers: Vec<String>,
}

/// Everything needed to generate one proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Credential being used.
    pub credential_id: String,
    /// Holder preimages.
    pub private: PrivateCredential,
    /// Commitments from the commitment store.
    pub commitments: CredentialCommitments,
    /// Claim parameters.
    pub claims: ClaimParameters,
    /// First use, as decided by the caller's usage ledger.
    pub is_first_use: bool,
}

// =============================================================================
// Outputs
// =============================================================================

/// The four disclosed booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofClaims {
    /// Recomputed commitments equal the published ones.
    pub has_valid_credential: bool,
    /// Issuer is on the verifier's list.
    pub from_authorized_issuer: bool,
    /// Validity contains the requested interval.
    pub covers_date_range: bool,
    /// Caller's ledger has no prior use.
    pub is_first_time_use: bool,
}

impl ProofClaims {
    /// All four claims hold.
    pub fn all_true(&self) -> bool {
        self.has_valid_credential
            && self.from_authorized_issuer
            && self.covers_date_range
            && self.is_first_time_use
    }
}

/// A generated proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Proof identifier.
    pub id: String,
    /// Credential the proof is about.
    pub credential_id: String,
    /// Claims sealed at generation.
    pub claims: ProofClaims,
    /// SHA-256 over claims, credential id, nonce and generation time.
    pub proof: String,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
    /// Proof is rejected after this instant.
    pub expires_at: DateTime<Utc>,
}

/// A reason a proof does not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofFailure {
    /// Commitments did not match.
    InvalidCredential,
    /// Issuer not authorized.
    UnauthorizedIssuer,
    /// Requested interval not covered.
    DateRangeNotCovered,
    /// Credential used before.
    AlreadyUsed,
    /// Proof past its expiry.
    Expired,
}

impl ProofFailure {
    /// Human-readable reason.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "Invalid credential",
            Self::UnauthorizedIssuer => "Unauthorized issuer",
            Self::DateRangeNotCovered => "Credential does not cover requested dates",
            Self::AlreadyUsed => "Credential has been used before",
            Self::Expired => "Proof has expired",
        }
    }
}

impl std::fmt::Display for ProofFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Result of checking a proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofVerification {
    /// All claims true and not expired.
    pub is_valid: bool,
    /// The four claims hold.
    pub all_claims_true: bool,
    /// Checked after `expires_at`.
    pub expired: bool,
    /// Claims as sealed.
    pub claims: ProofClaims,
    /// Failing claims in claim order, then expiry.
    pub failures: Vec<ProofFailure>,
}

impl ProofVerification {
    /// Failure reasons as display strings.
    pub fn failure_reasons(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Serialize)]
struct ProofDigest<'a> {
    claims: &'a ProofClaims,
    credential_id: &'a str,
    nonce: &'a str,
    timestamp: i64,
}

/// Generates and checks proofs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofEngine {
    policy: ProofPolicy,
}

impl ProofEngine {
    /// Create an engine with the given policy.
    pub fn new(policy: ProofPolicy) -> Self {
        Self { policy }
    }

    /// Generate a proof now with a fresh nonce.
    pub fn generate(&self, request: &ProofRequest) -> Result<Proof, VerifyError> {
        self.generate_at(request, Utc::now(), &generate_nonce())
    }

    /// Generate a proof at a fixed time with a caller-chosen nonce.
    pub fn generate_at(
        &self,
        request: &ProofRequest,
        now: DateTime<Utc>,
        nonce: &str,
    ) -> Result<Proof, VerifyError> {
        let params = &request.claims;
        if params.requested_to < params.requested_from {
            return Err(VerifyError::invalid_interval(format!(
                "requested interval ends {} before it starts {}",
                params.requested_to, params.requested_from
            )));
        }

        let expires_at = now.checked_add_signed(self.policy.ttl()?).ok_or_else(|| {
            VerifyError::invalid_policy("proof expiry is past the representable time range")
        })?;

        let private = &request.private;
        let claims = ProofClaims {
            has_valid_credential: private.commitments().matches(&request.commitments),
            from_authorized_issuer: params
                .authorized_issuers
                .iter()
                .any(|issuer| *issuer == private.issuer_id),
            covers_date_range: private.covers(params.requested_from, params.requested_to),
            is_first_time_use: request.is_first_use,
        };

        let digest = ProofDigest {
            claims: &claims,
            credential_id: &request.credential_id,
            nonce,
            timestamp: now.timestamp_millis(),
        };
        // Serializing bools, strings and an integer cannot fail.
        let payload = serde_json::to_vec(&digest).unwrap_or_default();
        let proof = sha256_hex(&payload);

        debug!(
            credential_id = %request.credential_id,
            valid = claims.has_valid_credential,
            authorized = claims.from_authorized_issuer,
            covers = claims.covers_date_range,
            first_use = claims.is_first_time_use,
            "Proof generated"
        );

        Ok(Proof {
            id: format!("proof-{}", &proof[..16]),
            credential_id: request.credential_id.clone(),
            claims,
            proof,
            generated_at: now,
            expires_at,
        })
    }

    /// Check a proof against the current time.
    pub fn verify(&self, proof: &Proof) -> ProofVerification {
        self.verify_at(proof, Utc::now())
    }

    /// Check a proof against a fixed time.
    ///
    /// Claims are read as sealed, never recomputed.
    pub fn verify_at(&self, proof: &Proof, now: DateTime<Utc>) -> ProofVerification {
        let claims = proof.claims;
        let mut failures = Vec::new();

        if !claims.has_valid_credential {
            failures.push(ProofFailure::InvalidCredential);
        }
        if !claims.from_authorized_issuer {
            failures.push(ProofFailure::UnauthorizedIssuer);
        }
        if !claims.covers_date_range {
            failures.push(ProofFailure::DateRangeNotCovered);
        }
        if !claims.is_first_time_use {
            failures.push(ProofFailure::AlreadyUsed);
        }

        let expired = now > proof.expires_at;
        if expired {
            failures.push(ProofFailure::Expired);
        }

        let all_claims_true = claims.all_true();
        let is_valid = all_claims_true && !expired;
        if is_valid {
            info!(proof_id = %proof.id, "Proof verified");
        } else {
            warn!(proof_id = %proof.id, failures = failures.len(), expired, "Proof rejected");
        }

        ProofVerification {
            is_valid,
            all_claims_true,
            expired,
            claims,
            failures,
        }
    }
}

fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Key the usage ledger stores to enforce first use.
pub fn usage_hash(credential_id: &str, purpose: &str, at: DateTime<Utc>) -> String {
    sha256_hex(format!("usage:{credential_id}:{purpose}:{}", at.timestamp_millis()).as_bytes())
}
