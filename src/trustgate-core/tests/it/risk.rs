//! Leave claim risk assessment.

use chrono::NaiveDate;
use proptest::prelude::*;

use trustgate_core::{
    LeaveClaim, LeaveHistory, Recommendation, RiskPatternKind, SensitiveCalendar, Severity,
    TrustEngine,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn exam_overlap_with_strong_history_needs_review() {
    // Wednesday to Thursday, so only the correlation pattern can fire.
    let claim = LeaveClaim {
        from: date(2026, 4, 15),
        to: date(2026, 4, 16),
        credential_type: Some("medical-certificate".into()),
    };
    let history = LeaveHistory {
        total_requests: 5,
        class_average: 4.0,
        past_sensitive_overlaps: 4,
    };
    let calendar = SensitiveCalendar {
        dates: vec![date(2026, 3, 20), date(2026, 4, 16)],
    };

    let assessment = TrustEngine::new()
        .assess_leave_risk(&claim, &history, &calendar)
        .unwrap();

    assert_eq!(assessment.patterns.len(), 1);
    assert_eq!(assessment.patterns[0].kind, RiskPatternKind::DateCorrelation);
    assert_eq!(assessment.patterns[0].severity, Severity::High);
    assert_eq!(assessment.patterns[0].probability, 80);
    assert!(assessment.score >= 35);
    assert_ne!(assessment.recommendation, Recommendation::AutoApprove);
}

#[test]
fn inverted_claim_is_an_input_error() {
    let claim = LeaveClaim {
        from: date(2026, 4, 16),
        to: date(2026, 4, 15),
        credential_type: None,
    };
    let result = TrustEngine::new().assess_leave_risk(
        &claim,
        &LeaveHistory::default(),
        &SensitiveCalendar::default(),
    );
    assert!(result.is_err());
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    /// Score is capped and the recommendation follows the bands.
    #[test]
    fn recommendation_follows_score(
        start in 0i64..365,
        len in 0i64..14,
        total in 0u32..40,
        average in 0.0f64..10.0,
        overlaps in 0u32..40,
        exams in prop::collection::vec(0i64..380, 0..6),
    ) {
        let base = date(2026, 1, 1);
        let claim = LeaveClaim {
            from: base + chrono::Duration::days(start),
            to: base + chrono::Duration::days(start + len),
            credential_type: None,
        };
        let calendar = SensitiveCalendar {
            dates: exams.iter().map(|d| base + chrono::Duration::days(*d)).collect(),
        };
        let history = LeaveHistory {
            total_requests: total,
            class_average: average,
            past_sensitive_overlaps: overlaps.min(total),
        };

        let a = TrustEngine::new().assess_leave_risk(&claim, &history, &calendar).unwrap();
        prop_assert!(a.score <= 100);
        prop_assert!(a.patterns.len() <= 3);
        let expected = match a.score {
            0..=25 => Recommendation::AutoApprove,
            26..=60 => Recommendation::ManualReview,
            _ => Recommendation::Reject,
        };
        prop_assert_eq!(a.recommendation, expected);
        for p in &a.patterns {
            prop_assert!(p.probability <= 100);
        }
    }
}
