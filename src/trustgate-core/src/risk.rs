//! Leave claim risk assessment.
//!
//! Three independent pattern checks add to a score capped at 100:
//!
//! | Pattern | Trigger | Tiers |
//! |---------|---------|-------|
//! | Date correlation | interval contains a sensitive date | rate > 0.7 high, > 0.4 medium, else low |
//! | Frequency anomaly | requests > 2 x class average | ratio > 5 high, > 3 medium, else low |
//! | Weekday pattern | interval starts Monday or Friday | always low |
//!
//! The score maps to a recommendation: auto-approve, manual review or reject.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RiskPolicy;
use crate::error::VerifyError;
use crate::types::Severity;

/// A new leave-style claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveClaim {
    /// First day of leave, inclusive.
    pub from: NaiveDate,
    /// Last day of leave, inclusive.
    pub to: NaiveDate,
    /// Credential type backing the claim, if any.
    #[serde(default)]
    pub credential_type: Option<String>,
}

impl LeaveClaim {
    /// Reject inverted intervals.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.to < self.from {
            return Err(VerifyError::invalid_interval(format!(
                "leave ends {} before it starts {}",
                self.to, self.from
            )));
        }
        Ok(())
    }

    /// The interval contains `date`, both ends inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// The subject's leave history, supplied by the history store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveHistory {
    /// Leave requests this term, including past ones.
    pub total_requests: u32,
    /// Mean leave requests across the subject's peers.
    pub class_average: f64,
    /// Past leaves that overlapped a sensitive date.
    pub past_sensitive_overlaps: u32,
}

/// Dates on which absence is suspicious (exams and the like).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveCalendar {
    /// Sensitive dates.
    pub dates: Vec<NaiveDate>,
}

/// Kind of leave risk pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskPatternKind {
    /// Leave overlaps a sensitive date.
    DateCorrelation,
    /// Subject requests far more leave than peers.
    FrequencyAnomaly,
    /// Leave starts next to a weekend.
    WeekdayPattern,
}

/// One matched pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPattern {
    /// Pattern kind.
    pub kind: RiskPatternKind,
    /// Description with the triggering numbers.
    pub description: String,
    /// Severity tier.
    pub severity: Severity,
    /// Supporting facts.
    pub evidence: Vec<String>,
    /// Estimated likelihood the pattern is not coincidence, 0-100.
    pub probability: u8,
}

/// What the caller should do with the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    /// Approve without review.
    AutoApprove,
    /// Route to a reviewer.
    ManualReview,
    /// Reject pending an interview.
    Reject,
}

/// Result of assessing a leave claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Risk score, 0-100.
    pub score: u8,
    /// Risk band.
    pub level: Severity,
    /// Matched patterns, in check order.
    pub patterns: Vec<RiskPattern>,
    /// Recommended action.
    pub recommendation: Recommendation,
    /// Band explanation citing the score.
    pub explanation: String,
}

/// Scores leave claims against history and a sensitive-date calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAssessor {
    policy: RiskPolicy,
}

impl RiskAssessor {
    /// Create an assessor with the given policy.
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    /// Assess a claim.
    pub fn assess(
        &self,
        claim: &LeaveClaim,
        history: &LeaveHistory,
        calendar: &SensitiveCalendar,
    ) -> Result<RiskAssessment, VerifyError> {
        claim.validate()?;

        let mut score: u32 = 0;
        let mut patterns = Vec::new();

        for (add, pattern) in [
            self.date_correlation(claim, history, calendar),
            self.frequency_anomaly(history),
            self.weekday_pattern(claim),
        ]
        .into_iter()
        .flatten()
        {
            score = score.saturating_add(add);
            patterns.push(pattern);
        }

        // Capped at 100, so the narrowing cast is lossless.
        let score = score.min(100) as u8;
        let p = &self.policy;
        let (level, recommendation, explanation) = if score <= p.auto_approve_max {
            (
                Severity::Low,
                Recommendation::AutoApprove,
                format!(
                    "Low risk (score: {score}/100). No significant suspicious patterns \
                     detected. Safe to auto-approve."
                ),
            )
        } else if score <= p.manual_review_max {
            (
                Severity::Medium,
                Recommendation::ManualReview,
                format!(
                    "Moderate risk (score: {score}/100). Some patterns warrant review \
                     before approval."
                ),
            )
        } else {
            (
                Severity::High,
                Recommendation::Reject,
                format!(
                    "High risk (score: {score}/100). Multiple suspicious patterns detected. \
                     Recommend an interview before approval."
                ),
            )
        };

        debug!(score, level = %level, patterns = patterns.len(), "Leave claim assessed");

        Ok(RiskAssessment {
            score,
            level,
            patterns,
            recommendation,
            explanation,
        })
    }

    fn date_correlation(
        &self,
        claim: &LeaveClaim,
        history: &LeaveHistory,
        calendar: &SensitiveCalendar,
    ) -> Option<(u32, RiskPattern)> {
        let hit = calendar.dates.iter().copied().find(|d| claim.covers(*d))?;

        let rate = f64::from(history.past_sensitive_overlaps)
            / f64::from(history.total_requests.max(1));
        let p = &self.policy;
        let (severity, add) = if rate > p.correlation_high {
            (Severity::High, p.correlation_high_add)
        } else if rate > p.correlation_medium {
            (Severity::Medium, p.medium_add)
        } else {
            (Severity::Low, p.low_add)
        };
        let probability = percent(rate * 100.0);
        let mut evidence = vec![
            format!("Leave: {} to {}", claim.from, claim.to),
            format!("Sensitive date within leave: {hit}"),
            format!("Historical correlation: {probability}%"),
        ];
        if let Some(kind) = &claim.credential_type {
            evidence.push(format!("Backed by credential: {kind}"));
        }

        Some((
            add,
            RiskPattern {
                kind: RiskPatternKind::DateCorrelation,
                description: format!(
                    "Leave dates overlap a sensitive date. {} out of {} past leaves \
                     coincided with sensitive dates.",
                    history.past_sensitive_overlaps, history.total_requests
                ),
                severity,
                evidence,
                probability,
            },
        ))
    }

    fn frequency_anomaly(&self, history: &LeaveHistory) -> Option<(u32, RiskPattern)> {
        let p = &self.policy;
        let total = f64::from(history.total_requests);
        if total <= history.class_average * p.frequency_multiple {
            return None;
        }

        let ratio = total / history.class_average.max(1.0);
        let (severity, add) = if ratio > p.ratio_high {
            (Severity::High, p.frequency_high_add)
        } else if ratio > p.ratio_medium {
            (Severity::Medium, p.medium_add)
        } else {
            (Severity::Low, p.low_add)
        };

        Some((
            add,
            RiskPattern {
                kind: RiskPatternKind::FrequencyAnomaly,
                description: format!(
                    "{} leaves this term vs class average of {}.",
                    history.total_requests, history.class_average
                ),
                severity,
                evidence: vec![
                    format!("Subject leaves: {}", history.total_requests),
                    format!("Class average: {}", history.class_average),
                    format!("{:.0}x higher than peers", ratio.round()),
                ],
                probability: percent(ratio * 20.0).min(95),
            },
        ))
    }

    fn weekday_pattern(&self, claim: &LeaveClaim) -> Option<(u32, RiskPattern)> {
        let day = match claim.from.weekday() {
            Weekday::Mon => "Monday",
            Weekday::Fri => "Friday",
            _ => return None,
        };

        Some((
            self.policy.weekday_add,
            RiskPattern {
                kind: RiskPatternKind::WeekdayPattern,
                description: format!(
                    "Leave starts on a {day}, commonly associated with extended weekends."
                ),
                severity: Severity::Low,
                evidence: vec![format!("Leave start day: {day}")],
                probability: 30,
            },
        ))
    }
}

/// Round and clamp to a 0-100 percentage.
fn percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
