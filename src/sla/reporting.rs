//! Compliance reports
//!
//! A report is a point-in-time aggregate over one reporting period:
//! per-metric actual vs. target, a weighted overall score, breach
//! incidents, recommendations and the estimated penalty credit. Reports are
//! immutable once generated; the next period's report supersedes rather
//! than overwrites.

use crate::sla::definition::{
    Comparison, MetricKind, PenaltyPolicy, ReportingFrequency, SlaDefinition,
};
use crate::sla::evaluation::MetricEvaluation;
use crate::sla::threshold::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Compliance banding for one metric or a whole SLA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    Breach,
}

/// One metric's standing within a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCompliance {
    pub metric_id: String,
    pub name: String,
    pub kind: MetricKind,
    /// `None` when the period had no data for this metric
    pub actual: Option<f64>,
    pub target: f64,
    pub compliance_percent: f64,
    pub status: ComplianceStatus,
    pub weight: f64,
    pub critical: bool,
}

/// A contiguous run of breach-severity evaluations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachIncident {
    pub metric_id: String,
    pub metric_name: String,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Priority for remediation recommendations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub metric_id: String,
    pub priority: RecommendationPriority,
    pub message: String,
}

/// Point-in-time compliance aggregate for one SLA and period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub id: String,
    pub sla_id: String,
    pub sla_name: String,
    pub frequency: ReportingFrequency,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub metrics: Vec<MetricCompliance>,
    pub overall_compliance_percent: f64,
    pub overall_status: ComplianceStatus,
    pub breach_incidents: Vec<BreachIncident>,
    pub recommendations: Vec<Recommendation>,
    pub estimated_credit_percent: f64,
    pub generated_at: DateTime<Utc>,
}

/// Per-metric compliance percentage: 100 when in target, otherwise scaled
/// by how close the measurement came to the target
pub fn metric_compliance_percent(comparison: Comparison, value: f64, target: f64) -> f64 {
    if comparison.in_target(value, target) {
        return 100.0;
    }
    match comparison {
        Comparison::Gte => {
            if target <= 0.0 {
                0.0
            } else {
                (value / target * 100.0).clamp(0.0, 100.0)
            }
        }
        Comparison::Lte => {
            if value <= 0.0 {
                0.0
            } else {
                (target / value * 100.0).clamp(0.0, 100.0)
            }
        }
        Comparison::Eq => 0.0,
    }
}

/// Band a compliance percentage
pub fn classify_compliance(percent: f64) -> ComplianceStatus {
    if percent >= 95.0 {
        ComplianceStatus::Compliant
    } else if percent >= 85.0 {
        ComplianceStatus::Warning
    } else {
        ComplianceStatus::Breach
    }
}

/// Weight-normalized overall score: sum(compliance * weight) / sum(weight)
pub fn weighted_overall(metrics: &[MetricCompliance]) -> f64 {
    let total_weight: f64 = metrics.iter().map(|m| m.weight).sum();
    if total_weight == 0.0 {
        return 100.0;
    }
    metrics
        .iter()
        .map(|m| m.compliance_percent * m.weight)
        .sum::<f64>()
        / total_weight
}

/// Overall status: banded from the weighted score, escalated to breach when
/// any critical metric breached
pub fn overall_status(metrics: &[MetricCompliance], weighted: f64) -> ComplianceStatus {
    let critical_breach = metrics
        .iter()
        .any(|m| m.critical && m.status == ComplianceStatus::Breach);
    if critical_breach {
        return ComplianceStatus::Breach;
    }
    classify_compliance(weighted)
}

/// Recommendation entries for every metric not fully compliant
pub fn build_recommendations(metrics: &[MetricCompliance]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = metrics
        .iter()
        .filter(|m| m.status != ComplianceStatus::Compliant)
        .map(|m| {
            let priority = if m.status == ComplianceStatus::Breach {
                RecommendationPriority::High
            } else {
                RecommendationPriority::Medium
            };
            let actual = m
                .actual
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "n/a".to_string());
            Recommendation {
                metric_id: m.metric_id.clone(),
                priority,
                message: format!(
                    "{} at {} against target {:.2}; investigate and remediate",
                    m.name, actual, m.target
                ),
            }
        })
        .collect();
    // Breach recommendations first.
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

/// Estimated credit from the penalty policy and the breach count
pub fn estimated_credit(policy: &PenaltyPolicy, breached_metrics: usize) -> f64 {
    (policy.credit_percent_per_breach * breached_metrics as f64).min(policy.credit_cap_percent)
}

/// Group breach-severity evaluations into incidents. Consecutive breach
/// evaluations of one metric merge into a single incident whose duration is
/// the evaluation count times the monitoring interval.
pub fn derive_incidents(
    sla: &SlaDefinition,
    history: &[MetricEvaluation],
    monitoring_interval: Duration,
    period_start: DateTime<Utc>,
) -> Vec<BreachIncident> {
    let mut incidents = Vec::new();
    for metric in &sla.metrics {
        let mut run_start: Option<DateTime<Utc>> = None;
        let mut run_len: u32 = 0;

        let evaluations = history
            .iter()
            .filter(|e| e.metric_id == metric.id && e.evaluated_at >= period_start);

        for eval in evaluations {
            if eval.severity == Some(Severity::Breach) {
                if run_start.is_none() {
                    run_start = Some(eval.evaluated_at);
                }
                run_len += 1;
            } else if let Some(started_at) = run_start.take() {
                incidents.push(BreachIncident {
                    metric_id: metric.id.clone(),
                    metric_name: metric.name.clone(),
                    started_at,
                    duration: monitoring_interval * run_len,
                });
                run_len = 0;
            }
        }
        if let Some(started_at) = run_start {
            incidents.push(BreachIncident {
                metric_id: metric.id.clone(),
                metric_name: metric.name.clone(),
                started_at,
                duration: monitoring_interval * run_len,
            });
        }
    }
    incidents
}

impl ComplianceReport {
    /// Assemble a report from per-metric compliance entries
    pub fn assemble(
        sla: &SlaDefinition,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        metrics: Vec<MetricCompliance>,
        breach_incidents: Vec<BreachIncident>,
    ) -> Self {
        let weighted = weighted_overall(&metrics);
        let status = overall_status(&metrics, weighted);
        let recommendations = build_recommendations(&metrics);
        let breached = metrics
            .iter()
            .filter(|m| m.status == ComplianceStatus::Breach)
            .count();
        let estimated_credit_percent = if status == ComplianceStatus::Breach {
            estimated_credit(&sla.penalties, breached.max(1))
        } else {
            0.0
        };

        Self {
            id: Uuid::new_v4().to_string(),
            sla_id: sla.id.clone(),
            sla_name: sla.name.clone(),
            frequency: sla.reporting.frequency,
            period_start,
            period_end,
            metrics,
            overall_compliance_percent: weighted,
            overall_status: status,
            breach_incidents,
            recommendations,
            estimated_credit_percent,
            generated_at: Utc::now(),
        }
    }
}
