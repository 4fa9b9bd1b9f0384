//! Presence verification: geofence properties, score bounds and the
//! reference check-in scenarios.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use trustgate_core::{
    AggregateScorer, Coordinate, DeviceCheck, DeviceDescriptor, EventStatus, FailedFactor,
    GeoCheck, GeoVerifier, Geofence, Legitimacy, NetworkCheck, NetworkReading, NetworkStatus,
    ScoringWeights, SessionDescriptor, SessionWindow, TimeCheck, TrustEngine,
    VerificationRequest,
};

const EARTH: f64 = 6_371_000.0;
const CENTER: (f64, f64) = (18.4574, 73.8508);

/// Latitude `meters` north of `lat` on a sphere of radius `EARTH`.
fn north_of(lat: f64, meters: f64) -> f64 {
    lat + (meters / EARTH).to_degrees()
}

fn window() -> SessionWindow {
    SessionWindow {
        start: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        grace_minutes: Some(5),
    }
}

fn session() -> SessionDescriptor {
    SessionDescriptor {
        session_id: Some("lecture-101".into()),
        geofence: Geofence {
            latitude: CENTER.0,
            longitude: CENTER.1,
            radius_m: 100.0,
        },
        allowed_networks: vec!["3C:84:6A:11:22:33".into()],
        window: Some(window()),
        registered_fingerprint: Some("fp-registered".into()),
    }
}

fn phone(fingerprint: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        fingerprint: fingerprint.into(),
        user_agent: "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/126.0 Mobile".into(),
        platform: "Linux armv8l".into(),
    }
}

fn inside_window() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 3, 0).unwrap()
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn clean_checkin_scores_100_and_is_legitimate() {
    let request = VerificationRequest {
        location: Some(Coordinate {
            latitude: CENTER.0,
            longitude: CENTER.1,
            accuracy_m: 5.0,
        }),
        network: Some(NetworkReading {
            network_id: " 3c:84:6a:11:22:33 ".into(),
            ssid: Some("Campus".into()),
            signal_strength: Some(-48),
        }),
        device: Some(phone("fp-registered")),
        client_time: Some(inside_window()),
    };

    let verdict = TrustEngine::new()
        .evaluate_event_at(&request, &session(), None, inside_window())
        .unwrap();

    assert_eq!(verdict.outcome.score, 100);
    assert!(verdict.outcome.passed);
    assert!(verdict.outcome.failed_factors.is_empty());
    assert_eq!(verdict.classification.verdict, Legitimacy::Legitimate);
    assert_eq!(verdict.status, EventStatus::Present);
}

#[test]
fn distant_unregistered_checkin_scores_45() {
    let request = VerificationRequest {
        location: Some(Coordinate {
            latitude: north_of(CENTER.0, 150.0),
            longitude: CENTER.1,
            accuracy_m: 5.0,
        }),
        network: None,
        device: Some(phone("fp-someone-else")),
        client_time: Some(inside_window()),
    };

    let outcome = TrustEngine::new()
        .verify_event_at(&request, &session(), inside_window())
        .unwrap();

    assert!((outcome.geo.distance_m - 150.0).abs() < 0.01);
    assert_eq!(outcome.score, 45);
    assert!(!outcome.passed);
    assert_eq!(
        outcome.failed_factors,
        vec![
            FailedFactor::OutsideGeofence,
            FailedFactor::NetworkAbsent,
            FailedFactor::FingerprintMismatch,
        ]
    );
    assert_eq!(outcome.failure_reasons().len(), 3);
}

#[test]
fn emulator_with_drifting_clock() {
    let request = VerificationRequest {
        location: Some(Coordinate {
            latitude: CENTER.0,
            longitude: CENTER.1,
            accuracy_m: 0.5,
        }),
        network: Some(NetworkReading {
            network_id: "de:ad:be:ef:00:01".into(),
            ssid: None,
            signal_strength: None,
        }),
        device: Some(DeviceDescriptor {
            fingerprint: "fp-registered".into(),
            user_agent: "Mozilla/5.0 (Linux; Android 13; sdk_gphone64_x86_64)".into(),
            platform: "Linux x86_64".into(),
        }),
        client_time: Some(inside_window() - chrono::Duration::minutes(5)),
    };

    let outcome = TrustEngine::new()
        .verify_event_at(&request, &session(), inside_window())
        .unwrap();

    // 25 mock + 20 mismatch + 30 emulator + 10 drift
    assert_eq!(outcome.score, 15);
    assert!(outcome.geo.is_mock_location);
    assert_eq!(outcome.network.status, NetworkStatus::Mismatch);
    assert!(outcome.time.within_window);
    assert!(outcome.time.drift_flagged);
}

#[test]
fn missing_inputs_are_rejections() {
    let engine = TrustEngine::new();
    let request = VerificationRequest {
        location: None,
        network: None,
        device: Some(phone("fp-registered")),
        client_time: None,
    };
    assert!(engine.verify_event(&request, &session()).unwrap_err().is_missing_field());

    let mut no_window = session();
    no_window.window = None;
    let request = VerificationRequest {
        location: Some(Coordinate {
            latitude: CENTER.0,
            longitude: CENTER.1,
            accuracy_m: 5.0,
        }),
        ..request
    };
    assert!(engine.verify_event(&request, &no_window).unwrap_err().is_missing_field());
}

// =============================================================================
// Properties
// =============================================================================

fn factor_inputs() -> impl Strategy<Value = (GeoCheck, NetworkCheck, DeviceCheck, TimeCheck)> {
    (
        any::<[bool; 2]>(),
        0u8..3,
        any::<[bool; 3]>(),
        any::<[bool; 2]>(),
    )
        .prop_map(|(g, n, d, t)| {
            let status = match n {
                0 => NetworkStatus::Verified,
                1 => NetworkStatus::Mismatch,
                _ => NetworkStatus::Absent,
            };
            (
                GeoCheck {
                    within_geofence: g[0],
                    distance_m: 0.0,
                    accuracy_m: 5.0,
                    is_mock_location: g[1],
                },
                NetworkCheck {
                    status,
                    matched_network: None,
                },
                DeviceCheck {
                    is_registered: d[2],
                    is_emulator: d[0],
                    is_rooted: d[1],
                    fingerprint_match: d[2],
                },
                TimeCheck {
                    within_window: t[0],
                    server_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
                    client_drift_ms: 0,
                    drift_flagged: t[1],
                },
            )
        })
}

fn weights_strategy() -> impl Strategy<Value = ScoringWeights> {
    prop::array::uniform9(0u32..80).prop_map(|w| ScoringWeights {
        outside_geofence: w[0],
        mock_location: w[1],
        network_mismatch: w[2],
        network_absent: w[3],
        emulator: w[4],
        rooted: w[5],
        fingerprint_mismatch: w[6],
        outside_window: w[7],
        clock_drift: w[8],
        pass_threshold: 60,
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// The geofence center is inside any positive radius.
    #[test]
    fn center_is_always_inside(
        lat in -80.0f64..80.0,
        lng in -179.0f64..179.0,
        radius in 0.001f64..50_000.0,
    ) {
        let fence = Geofence { latitude: lat, longitude: lng, radius_m: radius };
        let here = Coordinate { latitude: lat, longitude: lng, accuracy_m: 5.0 };
        prop_assert!(GeoVerifier::default().check(&here, &fence).within_geofence);
    }

    /// A point just beyond the radius is outside.
    #[test]
    fn beyond_radius_is_outside(
        lat in -70.0f64..70.0,
        lng in -179.0f64..179.0,
        radius in 1.0f64..5_000.0,
        epsilon in 0.01f64..100.0,
    ) {
        let fence = Geofence { latitude: lat, longitude: lng, radius_m: radius };
        let there = Coordinate {
            latitude: north_of(lat, radius + epsilon),
            longitude: lng,
            accuracy_m: 5.0,
        };
        prop_assert!(!GeoVerifier::default().check(&there, &fence).within_geofence);
    }

    /// Score stays in range and lists exactly the penalties applied.
    #[test]
    fn score_is_bounded_and_reasons_match(
        (geo, network, device, time) in factor_inputs(),
        weights in weights_strategy(),
    ) {
        let outcome = AggregateScorer::new(weights).score(geo, network.clone(), device, time);
        prop_assert!(outcome.score <= 100);

        let expected = [
            !geo.within_geofence,
            geo.is_mock_location,
            network.status != NetworkStatus::Verified,
            device.is_emulator,
            device.is_rooted,
            !device.fingerprint_match,
            !time.within_window,
            time.drift_flagged,
        ]
        .iter()
        .filter(|applied| **applied)
        .count();
        prop_assert_eq!(outcome.failed_factors.len(), expected);
        prop_assert_eq!(outcome.failure_reasons().len(), expected);

        let deducted: u32 = outcome.failed_factors.iter().map(|f| f.penalty(&weights)).sum();
        prop_assert_eq!(u32::from(outcome.score), 100u32.saturating_sub(deducted));
        prop_assert_eq!(outcome.passed, outcome.score >= weights.pass_threshold);
    }
}
