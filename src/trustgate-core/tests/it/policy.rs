//! Policy files with extreme values stay non-fatal.

use chrono::{NaiveDate, TimeZone, Utc};

use trustgate_core::{
    issue_commitments, ClaimParameters, LeaveClaim, LeaveHistory, Legitimacy, PolicyConfig,
    PrivateCredential, ProofPolicy, ProofRequest, Recommendation, Salt, SensitiveCalendar,
    TrustEngine, VerifyError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn oversized_classifier_weights_cap_at_100() {
    let policy = PolicyConfig::from_json(
        r#"{"classifier": {"outside_geofence": 4000000000, "network_unverified": 4000000000}}"#,
    )
    .unwrap();
    let engine = TrustEngine::with_policy(policy);

    let outcome = trustgate_core::AggregateScorer::default().score(
        trustgate_core::GeoCheck {
            within_geofence: false,
            distance_m: 400.0,
            accuracy_m: 5.0,
            is_mock_location: false,
        },
        trustgate_core::NetworkCheck {
            status: trustgate_core::NetworkStatus::Absent,
            matched_network: None,
        },
        trustgate_core::DeviceCheck {
            is_registered: true,
            is_emulator: false,
            is_rooted: false,
            fingerprint_match: true,
        },
        trustgate_core::TimeCheck {
            within_window: true,
            server_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 1, 0).unwrap(),
            client_drift_ms: 0,
            drift_flagged: false,
        },
    );

    let c = engine.classify_event(&outcome, None);
    assert_eq!(c.score, 100);
    assert_eq!(c.verdict, Legitimacy::Flagged);
}

#[test]
fn oversized_risk_adds_cap_at_100() {
    let policy =
        PolicyConfig::from_json(r#"{"risk": {"low_add": 4000000000, "weekday_add": 4000000000}}"#)
            .unwrap();
    // 2026-03-09 is a Monday.
    let claim = LeaveClaim {
        from: date(2026, 3, 9),
        to: date(2026, 3, 10),
        credential_type: None,
    };
    let calendar = SensitiveCalendar {
        dates: vec![date(2026, 3, 10)],
    };

    let a = TrustEngine::with_policy(policy)
        .assess_leave_risk(&claim, &LeaveHistory::default(), &calendar)
        .unwrap();
    assert_eq!(a.score, 100);
    assert_eq!(a.recommendation, Recommendation::Reject);
}

#[test]
fn unusable_proof_ttl_is_rejected() {
    for json in [
        r#"{"proof": {"ttl_secs": 9223372036854775807}}"#,
        r#"{"proof": {"ttl_secs": -3600}}"#,
        r#"{"proof": {"ttl_secs": 0}}"#,
    ] {
        assert!(PolicyConfig::from_json(json).is_err(), "{json}");
    }

    // Built in code, the same value fails at generation instead.
    let engine = TrustEngine::with_policy(PolicyConfig {
        proof: ProofPolicy {
            ttl_secs: i64::MAX,
        },
        ..PolicyConfig::default()
    });
    let private = PrivateCredential {
        valid_from: date(2026, 5, 4),
        valid_to: date(2026, 5, 10),
        issuer_id: "clinic-17".into(),
        issuer_name: "Riverside Clinic".into(),
        credential_type: "medical-certificate".into(),
        salt: Salt::from_hex(&"5a".repeat(32)).unwrap(),
    };
    let request = ProofRequest {
        credential_id: "cred-0091".into(),
        commitments: issue_commitments(&private),
        private,
        claims: ClaimParameters {
            requested_from: date(2026, 5, 5),
            requested_to: date(2026, 5, 7),
            authorized_issuers: vec!["clinic-17".into()],
        },
        is_first_use: true,
    };
    let err = engine.generate_proof(&request).unwrap_err();
    assert!(matches!(err, VerifyError::InvalidPolicy { .. }));
}
