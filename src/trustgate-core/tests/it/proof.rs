//! Selective-disclosure proof round trips and expiry.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use trustgate_core::{
    issue_commitments, ClaimParameters, PrivateCredential, ProofFailure, ProofRequest, Salt,
    TrustEngine,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn credential(salt: Salt) -> PrivateCredential {
    PrivateCredential {
        valid_from: date(2026, 5, 4),
        valid_to: date(2026, 5, 10),
        issuer_id: "clinic-17".into(),
        issuer_name: "Riverside Clinic".into(),
        credential_type: "medical-certificate".into(),
        salt,
    }
}

fn request_for(private: PrivateCredential, published: &PrivateCredential) -> ProofRequest {
    ProofRequest {
        credential_id: "cred-0091".into(),
        commitments: issue_commitments(published),
        private,
        claims: ClaimParameters {
            requested_from: date(2026, 5, 5),
            requested_to: date(2026, 5, 7),
            authorized_issuers: vec!["clinic-17".into()],
        },
        is_first_use: true,
    }
}

fn salt_from(byte: u8) -> Salt {
    Salt::from_hex(&hex::encode([byte; 32])).unwrap()
}

#[test]
fn honest_holder_round_trip() {
    let engine = TrustEngine::new();
    let published = credential(salt_from(7));
    let proof = engine
        .generate_proof(&request_for(published.clone(), &published))
        .unwrap();

    assert!(proof.claims.has_valid_credential);
    assert!(proof.claims.all_true());
    let result = engine.verify_proof(&proof);
    assert!(result.is_valid);
    assert!(!result.expired);
}

#[test]
fn day_old_proof_is_expired_even_with_true_claims() {
    let engine = TrustEngine::new();
    let published = credential(salt_from(7));
    let generated = Utc.with_ymd_and_hms(2026, 5, 5, 10, 0, 0).unwrap();
    let proof = engine
        .generate_proof_at(&request_for(published.clone(), &published), generated, "n-1")
        .unwrap();

    let result = engine.verify_proof_at(&proof, generated + Duration::hours(24) + Duration::seconds(1));
    assert!(result.all_claims_true);
    assert!(!result.is_valid);
    assert_eq!(result.failures, vec![ProofFailure::Expired]);
    assert!(result.failure_reasons().iter().any(|r| r.contains("expired")));
}

#[test]
fn proof_survives_json_round_trip() {
    let engine = TrustEngine::new();
    let published = credential(salt_from(3));
    let at = Utc.with_ymd_and_hms(2026, 5, 5, 10, 0, 0).unwrap();
    let proof = engine
        .generate_proof_at(&request_for(published.clone(), &published), at, "n-2")
        .unwrap();

    let json = serde_json::to_string(&proof).unwrap();
    assert!(!json.contains("Riverside"));
    let parsed: trustgate_core::Proof = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, proof);
}

/// Which private field to tamper with before regenerating.
#[derive(Debug, Clone, Copy)]
enum Mutation {
    ValidFrom,
    ValidTo,
    IssuerId,
    IssuerName,
    CredentialType,
    Salt,
}

fn mutation() -> impl Strategy<Value = Mutation> {
    prop_oneof![
        Just(Mutation::ValidFrom),
        Just(Mutation::ValidTo),
        Just(Mutation::IssuerId),
        Just(Mutation::IssuerName),
        Just(Mutation::CredentialType),
        Just(Mutation::Salt),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Matching preimages prove validity; any single changed field does not.
    #[test]
    fn single_field_mutation_breaks_validity(
        salt_byte in any::<u8>(),
        which in mutation(),
        suffix in "[a-z0-9]{1,8}",
        shift in 1i64..30,
    ) {
        let engine = TrustEngine::new();
        let at = Utc.with_ymd_and_hms(2026, 5, 5, 10, 0, 0).unwrap();
        let published = credential(salt_from(salt_byte));

        let honest = engine
            .generate_proof_at(&request_for(published.clone(), &published), at, "n")
            .unwrap();
        prop_assert!(honest.claims.has_valid_credential);

        let mut forged = published.clone();
        match which {
            Mutation::ValidFrom => forged.valid_from -= Duration::days(shift),
            Mutation::ValidTo => forged.valid_to += Duration::days(shift),
            Mutation::IssuerId => forged.issuer_id.push_str(&suffix),
            Mutation::IssuerName => forged.issuer_name.push_str(&suffix),
            Mutation::CredentialType => forged.credential_type.push_str(&suffix),
            Mutation::Salt => forged.salt = salt_from(salt_byte.wrapping_add(1)),
        }

        let proof = engine
            .generate_proof_at(&request_for(forged, &published), at, "n")
            .unwrap();
        prop_assert!(!proof.claims.has_valid_credential);
        prop_assert!(!engine.verify_proof_at(&proof, at).is_valid);
    }
}
