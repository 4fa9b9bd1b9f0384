//! # trustgate-core
//!
//! Trust scoring for physical-presence claims, anomaly and risk detection
//! over history, and selective-disclosure proofs for committed credentials.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TrustEngine                             │
//! │                                                              │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌──────────┐  │
//! │  │GeoVerifier │ │  Network   │ │   Device   │ │TimeWindow│  │
//! │  │(haversine) │ │(allow-list)│ │(signatures)│ │ (skew)   │  │
//! │  └────────────┘ └────────────┘ └────────────┘ └──────────┘  │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │              AggregateScorer                      │      │
//! │  │        (100 minus penalties, pass at 60)         │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                           │                                  │
//! │                           ▼                                  │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │              EventClassifier                      │      │
//! │  │   (history-aware verdict, present/late/flagged)  │      │
//! │  └──────────────────────────────────────────────────┘      │
//! │                                                              │
//! │  ┌────────────────┐ ┌──────────────┐ ┌──────────────────┐  │
//! │  │AnomalyDetector │ │ RiskAssessor │ │   ProofEngine    │  │
//! │  │ (batch, per    │ │ (leave vs    │ │ (commitments via │  │
//! │  │  subject)      │ │  calendar)   │ │ trustgate-crypto)│  │
//! │  └────────────────┘ └──────────────┘ └──────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Properties
//!
//! - **Pure**: every operation is a function of its arguments; no I/O
//! - **Total**: suspicious input yields a typed verdict, never an error
//! - **Tunable**: every weight and cutoff lives in [`PolicyConfig`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod anomaly;
pub mod classifier;
pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod geo;
pub mod network;
pub mod proof;
pub mod risk;
pub mod scoring;
pub mod time_window;
pub mod types;

pub use anomaly::{AnomalyDetector, AnomalyFinding, AnomalyKind, HistoricalEvent};
pub use classifier::{
    derive_status, Classification, EventClassifier, EventStatus, HistorySummary, Legitimacy,
};
pub use config::{
    AnomalyPolicy, ClassifierWeights, GeoPolicy, PolicyConfig, ProofPolicy, RiskPolicy,
    ScoringWeights, TimePolicy,
};
pub use device::{verify_device, DeviceCheck};
pub use engine::{EventVerdict, TrustEngine};
pub use error::VerifyError;
pub use geo::{haversine_distance, GeoCheck, GeoVerifier};
pub use network::{verify_network, NetworkCheck, NetworkStatus};
pub use proof::{
    issue_commitments, usage_hash, ClaimParameters, PrivateCredential, Proof, ProofClaims,
    ProofEngine, ProofFailure, ProofRequest, ProofVerification,
};
pub use risk::{
    LeaveClaim, LeaveHistory, Recommendation, RiskAssessment, RiskAssessor, RiskPattern,
    RiskPatternKind, SensitiveCalendar,
};
pub use scoring::{verification_hash, AggregateScorer, FailedFactor, VerificationOutcome};
pub use time_window::{TimeCheck, TimeWindowVerifier};
pub use types::{
    Coordinate, DeviceDescriptor, Geofence, NetworkReading, SessionDescriptor, SessionWindow,
    Severity, VerificationRequest,
};

// Commitment primitives callers need to issue credentials.
pub use trustgate_crypto::{generate_salt, Commitment, CredentialCommitments, Salt};
