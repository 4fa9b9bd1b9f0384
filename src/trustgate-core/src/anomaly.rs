//! Cross-event anomaly detection.
//!
//! Scans a batch of past presence events, grouped by subject, for patterns
//! no single event reveals:
//!
//! - **Network-location mismatch**: position verified but the session network
//!   repeatedly absent, the classic GPS-spoofing tell.
//! - **Boundary clustering**: repeated check-ins from just inside the fence.
//! - **Timing regularity**: every check-in lands on the same second.
//! - **Elevated average score**: the per-event suspicion score stays high.
//!
//! Detectors are independent; a subject can collect zero to four findings
//! from one scan. Groups are reported in order of first appearance.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::EventStatus;
use crate::config::AnomalyPolicy;
use crate::geo::in_boundary_band;
use crate::types::Severity;

/// One past presence event, as returned by the history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// Subject the event belongs to.
    pub subject_id: String,
    /// Subject display name.
    #[serde(default)]
    pub subject_name: Option<String>,
    /// Session the event was recorded against.
    pub session_id: String,
    /// Server time of the check-in.
    pub timestamp: DateTime<Utc>,
    /// Session network was verified.
    pub network_verified: bool,
    /// Distance from the geofence center, meters.
    pub geofence_distance_m: f64,
    /// Geofence radius of that session, meters.
    #[serde(default)]
    pub geofence_radius_m: Option<f64>,
    /// Classifier suspicion score recorded for the event.
    pub suspicion_score: f64,
    /// Final status, if recorded.
    #[serde(default)]
    pub status: Option<EventStatus>,
    /// Seconds between window open and check-in, if recorded.
    #[serde(default)]
    pub checkin_delay_secs: Option<f64>,
}

/// Kind of cross-event pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    /// Location verified without the session network.
    NetworkLocationMismatch,
    /// Check-ins cluster at the geofence edge.
    BoundaryClustering,
    /// Check-ins share the same seconds component.
    TimingRegularity,
    /// Mean suspicion score above the cutoff.
    ElevatedScoreAverage,
}

/// A pattern found for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    /// Subject the finding is about.
    pub subject_id: String,
    /// Subject display name, if any event carried one.
    pub subject_name: Option<String>,
    /// Pattern kind.
    pub kind: AnomalyKind,
    /// Severity.
    pub severity: Severity,
    /// Description with the triggering numbers substituted in.
    pub description: String,
    /// Supporting facts.
    pub evidence: Vec<String>,
    /// Most recent session involved, for network mismatches.
    pub session_id: Option<String>,
}

/// Batch anomaly detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector {
    policy: AnomalyPolicy,
}

impl AnomalyDetector {
    /// Create a detector with the given policy.
    pub fn new(policy: AnomalyPolicy) -> Self {
        Self { policy }
    }

    /// Scan a batch of events.
    pub fn detect(&self, events: &[HistoricalEvent]) -> Vec<AnomalyFinding> {
        let groups = group_by_subject(events);
        debug!(events = events.len(), subjects = groups.len(), "Scanning for anomalies");

        let mut findings = Vec::new();
        for group in &groups {
            let mut subject_findings = Vec::new();
            subject_findings.extend(self.network_location_mismatch(group));
            subject_findings.extend(self.boundary_clustering(group));
            subject_findings.extend(self.timing_regularity(group));
            subject_findings.extend(self.elevated_average(group));

            for finding in &subject_findings {
                warn!(
                    subject = %finding.subject_id,
                    kind = ?finding.kind,
                    severity = %finding.severity,
                    "Anomaly detected"
                );
            }
            findings.extend(subject_findings);
        }
        findings
    }

    fn network_location_mismatch(&self, group: &SubjectGroup<'_>) -> Option<AnomalyFinding> {
        let unverified: Vec<&HistoricalEvent> = group
            .events
            .iter()
            .copied()
            .filter(|e| !e.network_verified)
            .collect();
        let count = unverified.len();
        if count < self.policy.unverified_network_min {
            return None;
        }

        let severity = if count >= self.policy.unverified_network_high {
            Severity::High
        } else {
            Severity::Medium
        };
        let evidence = unverified
            .iter()
            .map(|e| format!("Session {} at {}: network not verified", e.session_id, e.timestamp))
            .collect();

        Some(group.finding(
            AnomalyKind::NetworkLocationMismatch,
            severity,
            format!(
                "Location verified but session network not connected in {count} sessions. \
                 Possible GPS spoofing."
            ),
            evidence,
            group.events.last().map(|e| e.session_id.clone()),
        ))
    }

    fn boundary_clustering(&self, group: &SubjectGroup<'_>) -> Option<AnomalyFinding> {
        let boundary: Vec<&HistoricalEvent> = group
            .events
            .iter()
            .copied()
            .filter(|e| {
                let radius = e.geofence_radius_m.unwrap_or(self.policy.default_radius_m);
                in_boundary_band(e.geofence_distance_m, radius, self.policy.boundary_band_fraction)
            })
            .collect();
        let count = boundary.len();
        if count < self.policy.boundary_min {
            return None;
        }

        let evidence = boundary
            .iter()
            .map(|e| {
                let radius = e.geofence_radius_m.unwrap_or(self.policy.default_radius_m);
                format!(
                    "Session {}: {:.0} m from center (radius {:.0} m)",
                    e.session_id, e.geofence_distance_m, radius
                )
            })
            .collect();

        Some(group.finding(
            AnomalyKind::BoundaryClustering,
            Severity::Medium,
            format!("Consistently checking in from the geofence boundary ({count} times)."),
            evidence,
            None,
        ))
    }

    fn timing_regularity(&self, group: &SubjectGroup<'_>) -> Option<AnomalyFinding> {
        let count = group.events.len();
        if count < self.policy.timing_min_events {
            return None;
        }
        let second = group.events[0].timestamp.second();
        if !group.events.iter().all(|e| e.timestamp.second() == second) {
            return None;
        }

        Some(group.finding(
            AnomalyKind::TimingRegularity,
            Severity::High,
            format!(
                "All {count} check-ins happened at exactly second :{second:02}. \
                 Possible automated attendance."
            ),
            group
                .events
                .iter()
                .map(|e| format!("Session {} at {}", e.session_id, e.timestamp))
                .collect(),
            None,
        ))
    }

    fn elevated_average(&self, group: &SubjectGroup<'_>) -> Option<AnomalyFinding> {
        let count = group.events.len();
        if count == 0 {
            return None;
        }
        let sum: f64 = group.events.iter().map(|e| e.suspicion_score).sum();
        let average = sum / count as f64;
        if average <= self.policy.elevated_average {
            return None;
        }

        let severity = if average > self.policy.elevated_average_high {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(group.finding(
            AnomalyKind::ElevatedScoreAverage,
            severity,
            format!(
                "Average suspicion score of {:.0}/100 across {count} sessions.",
                average.round()
            ),
            vec![format!("Mean score {average:.1} over {count} events")],
            None,
        ))
    }
}

struct SubjectGroup<'a> {
    subject_id: &'a str,
    subject_name: Option<&'a str>,
    events: Vec<&'a HistoricalEvent>,
}

impl SubjectGroup<'_> {
    fn finding(
        &self,
        kind: AnomalyKind,
        severity: Severity,
        description: String,
        evidence: Vec<String>,
        session_id: Option<String>,
    ) -> AnomalyFinding {
        AnomalyFinding {
            subject_id: self.subject_id.to_string(),
            subject_name: self.subject_name.map(str::to_string),
            kind,
            severity,
            description,
            evidence,
            session_id,
        }
    }
}

fn group_by_subject(events: &[HistoricalEvent]) -> Vec<SubjectGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SubjectGroup<'_>> = Vec::new();

    for event in events {
        let slot = *index.entry(event.subject_id.as_str()).or_insert_with(|| {
            groups.push(SubjectGroup {
                subject_id: event.subject_id.as_str(),
                subject_name: None,
                events: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        if group.subject_name.is_none() {
            group.subject_name = event.subject_name.as_deref();
        }
        group.events.push(event);
    }
    groups
}
