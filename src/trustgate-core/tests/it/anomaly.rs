//! Cross-event anomaly detection and history summaries.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use trustgate_core::{
    AnomalyKind, EventClassifier, EventStatus, HistoricalEvent, Legitimacy, Severity, TrustEngine,
};

fn event(subject: &str, day: i64, second: u32) -> HistoricalEvent {
    HistoricalEvent {
        subject_id: subject.into(),
        subject_name: None,
        session_id: format!("{subject}-day-{day}"),
        timestamp: Utc.with_ymd_and_hms(2026, 2, 2, 9, 1, second).unwrap() + Duration::days(day),
        network_verified: true,
        geofence_distance_m: 12.0,
        geofence_radius_m: Some(100.0),
        suspicion_score: 5.0,
        status: Some(EventStatus::Present),
        checkin_delay_secs: Some(60.0),
    }
}

#[test]
fn five_checkins_on_the_same_second() {
    let events: Vec<_> = (0..5).map(|day| event("stu-7", day, 0)).collect();
    let findings = TrustEngine::new().detect_anomalies(&events);

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, AnomalyKind::TimingRegularity);
    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[0].subject_id, "stu-7");
    assert!(findings[0].description.contains("5 check-ins"));
}

#[test]
fn empty_batch_has_no_findings() {
    assert!(TrustEngine::new().detect_anomalies(&[]).is_empty());
}

#[test]
fn summary_feeds_the_classifier() {
    let mut events: Vec<_> = (0..8).map(|day| event("stu-9", day, (day * 7) as u32)).collect();
    for e in events.iter_mut().take(6) {
        e.network_verified = false;
        e.geofence_distance_m = 97.0;
        e.checkin_delay_secs = Some(0.4);
    }
    for e in events.iter_mut().take(4) {
        e.status = Some(EventStatus::Flagged);
    }
    for e in events.iter_mut().skip(6) {
        e.checkin_delay_secs = Some(0.2);
    }

    let engine = TrustEngine::new();
    let summary = engine.summarize_history(&events);
    assert_eq!(summary.total_events, 8);
    assert_eq!(summary.flagged, 4);
    assert_eq!(summary.attended, 4);
    assert_eq!(summary.wifi_disconnect_after_checkin, 6);
    assert_eq!(summary.boundary_checkins, 6);
    assert!(summary.average_checkin_delay_secs.unwrap() < 1.0);

    let findings = engine.detect_anomalies(&events);
    let kinds: Vec<_> = findings.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![AnomalyKind::NetworkLocationMismatch, AnomalyKind::BoundaryClustering]
    );
    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[0].session_id.as_deref(), Some("stu-9-day-7"));

    // A clean event still lands in "flagged" on history alone: 15 + 20 + 15 + 10.
    let clean = trustgate_core::AggregateScorer::default().score(
        trustgate_core::GeoCheck {
            within_geofence: true,
            distance_m: 3.0,
            accuracy_m: 5.0,
            is_mock_location: false,
        },
        trustgate_core::NetworkCheck {
            status: trustgate_core::NetworkStatus::Verified,
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
            server_time: Utc.with_ymd_and_hms(2026, 2, 11, 9, 1, 0).unwrap(),
            client_drift_ms: 0,
            drift_flagged: false,
        },
    );
    let classification = EventClassifier::default().classify(&clean, Some(&summary));
    assert_eq!(classification.score, 60);
    assert_eq!(classification.verdict, Legitimacy::Flagged);
    assert_eq!(classification.patterns.len(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Each subject collects at most one finding per detector.
    #[test]
    fn at_most_four_findings_per_subject(
        rows in prop::collection::vec(
            (0usize..3, any::<bool>(), 0.0f64..200.0, 0.0f64..100.0, 0u32..60),
            0..40,
        )
    ) {
        let events: Vec<_> = rows
            .iter()
            .enumerate()
            .map(|(i, (subject, verified, distance, score, second))| {
                let mut e = event(&format!("s{subject}"), i as i64, *second);
                e.network_verified = *verified;
                e.geofence_distance_m = *distance;
                e.suspicion_score = *score;
                e
            })
            .collect();

        let findings = TrustEngine::new().detect_anomalies(&events);
        for subject in ["s0", "s1", "s2"] {
            let mine: Vec<_> = findings.iter().filter(|f| f.subject_id == subject).collect();
            prop_assert!(mine.len() <= 4);
            let mut kinds: Vec<_> = mine.iter().map(|f| f.kind).collect();
            kinds.dedup();
            prop_assert_eq!(kinds.len(), mine.len());
        }
    }
}
