//! Trust engine facade.
//!
//! This module wires the leaf verifiers into the public operations:
//! 1. Presence verification (geo, network, device, time, then scoring)
//! 2. Legitimacy classification against history
//! 3. Cross-event anomaly detection
//! 4. Leave claim risk assessment
//! 5. Proof generation and verification
//!
//! ## Properties
//!
//! - Pure: no I/O, no shared mutable state; safe to share across threads
//! - Total: every well-formed input yields a verdict, failed factors are data
//! - Private: salts and credential fields never reach a log line

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::anomaly::{AnomalyDetector, AnomalyFinding, HistoricalEvent};
use crate::classifier::{derive_status, Classification, EventClassifier, EventStatus, HistorySummary};
use crate::config::PolicyConfig;
use crate::device::verify_device;
use crate::error::VerifyError;
use crate::geo::GeoVerifier;
use crate::network::verify_network;
use crate::proof::{Proof, ProofEngine, ProofRequest, ProofVerification};
use crate::risk::{LeaveClaim, LeaveHistory, RiskAssessment, RiskAssessor, SensitiveCalendar};
use crate::scoring::{verification_hash, AggregateScorer, VerificationOutcome};
use crate::time_window::TimeWindowVerifier;
use crate::types::{SessionDescriptor, VerificationRequest};

/// Everything the caller records about one presence event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventVerdict {
    /// Session the event was checked against.
    pub session_id: Option<String>,
    /// Factor checks and score.
    pub outcome: VerificationOutcome,
    /// Legitimacy classification.
    pub classification: Classification,
    /// Final status.
    pub status: EventStatus,
    /// Digest for the external ledger.
    pub verification_hash: String,
}

/// The trust engine.
///
/// Primary entry point for all operations. Holds only policy, so a single
/// instance can serve any number of concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct TrustEngine {
    /// Policy the components were built from.
    policy: PolicyConfig,
    geo: GeoVerifier,
    time: TimeWindowVerifier,
    scorer: AggregateScorer,
    classifier: EventClassifier,
    detector: AnomalyDetector,
    assessor: RiskAssessor,
    proofs: ProofEngine,
}

impl TrustEngine {
    /// Create an engine with the default policy.
    pub fn new() -> Self {
        Self::with_policy(PolicyConfig::default())
    }

    /// Create an engine with a custom policy.
    pub fn with_policy(policy: PolicyConfig) -> Self {
        debug!(
            pass_threshold = policy.scoring.pass_threshold,
            proof_ttl_secs = policy.proof.ttl_secs,
            "TrustEngine: building components"
        );
        Self {
            geo: GeoVerifier::new(policy.geo),
            time: TimeWindowVerifier::new(policy.time),
            scorer: AggregateScorer::new(policy.scoring),
            classifier: EventClassifier::new(policy.classifier),
            detector: AnomalyDetector::new(policy.anomaly),
            assessor: RiskAssessor::new(policy.risk),
            proofs: ProofEngine::new(policy.proof),
            policy,
        }
    }

    /// Active policy.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    // =========================================================================
    // Presence
    // =========================================================================

    /// Verify a presence claim against the current server time.
    ///
    /// # Errors
    ///
    /// Returns an input validation error when a required field is missing or
    /// malformed. No outcome is produced in that case.
    pub fn verify_event(
        &self,
        request: &VerificationRequest,
        session: &SessionDescriptor,
    ) -> Result<VerificationOutcome, VerifyError> {
        self.verify_event_at(request, session, Utc::now())
    }

    /// Verify a presence claim at a fixed server time.
    #[instrument(skip_all, fields(session_id = ?session.session_id))]
    pub fn verify_event_at(
        &self,
        request: &VerificationRequest,
        session: &SessionDescriptor,
        server_time: DateTime<Utc>,
    ) -> Result<VerificationOutcome, VerifyError> {
        let inputs = request.validate(session).map_err(|e| {
            warn!("Rejected verification request: {}", e);
            e
        })?;

        let geo = self.geo.check(inputs.location, &session.geofence);
        let network = verify_network(request.network.as_ref(), &session.allowed_networks);
        let device = verify_device(inputs.device, session.registered_fingerprint.as_deref());
        let time = self.time.check(request.client_time, inputs.window, server_time);

        let outcome = self.scorer.score(geo, network, device, time);
        if outcome.passed {
            debug!(score = outcome.score, "Presence verified");
        } else {
            warn!(
                score = outcome.score,
                failed = ?outcome.failed_factors,
                "Presence verification failed"
            );
        }
        Ok(outcome)
    }

    /// Classify a verified event against the subject's history.
    #[instrument(skip_all, fields(score = outcome.score))]
    pub fn classify_event(
        &self,
        outcome: &VerificationOutcome,
        history: Option<&HistorySummary>,
    ) -> Classification {
        self.classifier.classify(outcome, history)
    }

    /// Verify, classify and assign a status in one call.
    ///
    /// # Errors
    ///
    /// Same as [`TrustEngine::verify_event_at`].
    pub fn evaluate_event(
        &self,
        request: &VerificationRequest,
        session: &SessionDescriptor,
        history: Option<&HistorySummary>,
    ) -> Result<EventVerdict, VerifyError> {
        self.evaluate_event_at(request, session, history, Utc::now())
    }

    /// [`TrustEngine::evaluate_event`] at a fixed server time.
    pub fn evaluate_event_at(
        &self,
        request: &VerificationRequest,
        session: &SessionDescriptor,
        history: Option<&HistorySummary>,
        server_time: DateTime<Utc>,
    ) -> Result<EventVerdict, VerifyError> {
        let outcome = self.verify_event_at(request, session, server_time)?;
        let classification = self.classify_event(&outcome, history);

        // verify_event_at already rejected a session without a window.
        let window = session
            .window
            .as_ref()
            .ok_or(VerifyError::MissingSessionWindow)?;
        let status = derive_status(&outcome, &classification, window, &self.time);

        info!(
            session_id = ?session.session_id,
            score = outcome.score,
            verdict = ?classification.verdict,
            status = ?status,
            "Event evaluated"
        );

        Ok(EventVerdict {
            session_id: session.session_id.clone(),
            verification_hash: verification_hash(&outcome),
            outcome,
            classification,
            status,
        })
    }

    /// Summarize a subject's past events for the classifier.
    pub fn summarize_history(&self, events: &[HistoricalEvent]) -> HistorySummary {
        HistorySummary::from_events(events, &self.policy.anomaly)
    }

    // =========================================================================
    // Batch analysis
    // =========================================================================

    /// Scan past events for cross-event patterns.
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn detect_anomalies(&self, events: &[HistoricalEvent]) -> Vec<AnomalyFinding> {
        let findings = self.detector.detect(events);
        info!(findings = findings.len(), "Anomaly scan complete");
        findings
    }

    /// Assess a leave claim.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidInterval`] if the claim ends before it
    /// starts.
    #[instrument(skip_all, fields(from = %claim.from, to = %claim.to))]
    pub fn assess_leave_risk(
        &self,
        claim: &LeaveClaim,
        history: &LeaveHistory,
        calendar: &SensitiveCalendar,
    ) -> Result<RiskAssessment, VerifyError> {
        let assessment = self.assessor.assess(claim, history, calendar)?;
        info!(
            score = assessment.score,
            recommendation = ?assessment.recommendation,
            "Leave risk assessed"
        );
        Ok(assessment)
    }

    // =========================================================================
    // Proofs
    // =========================================================================

    /// Generate a proof now.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::InvalidInterval`] if the requested interval is
    /// inverted.
    #[instrument(skip_all, fields(credential_id = %request.credential_id))]
    pub fn generate_proof(&self, request: &ProofRequest) -> Result<Proof, VerifyError> {
        self.proofs.generate(request)
    }

    /// Generate a proof at a fixed time with a caller-chosen nonce.
    pub fn generate_proof_at(
        &self,
        request: &ProofRequest,
        now: DateTime<Utc>,
        nonce: &str,
    ) -> Result<Proof, VerifyError> {
        self.proofs.generate_at(request, now, nonce)
    }

    /// Check a proof against the current time.
    #[instrument(skip_all, fields(proof_id = %proof.id))]
    pub fn verify_proof(&self, proof: &Proof) -> ProofVerification {
        self.proofs.verify(proof)
    }

    /// Check a proof against a fixed time.
    pub fn verify_proof_at(&self, proof: &Proof, now: DateTime<Utc>) -> ProofVerification {
        self.proofs.verify_at(proof, now)
    }
}
