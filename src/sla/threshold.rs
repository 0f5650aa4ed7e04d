//! Per-(SLA, metric) threshold records
//!
//! A threshold record carries three escalating boundary values and routes
//! notifications per severity. Severity for alert dispatch itself comes
//! from the deviation classification in evaluation; the record is the
//! configuration of where notifications go and which remediation runs.

use crate::sla::definition::{Comparison, SlaDefinition, SlaMetric};
use crate::sla::remediation::RemediationAction;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deviation severity, ordered least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
    Breach,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Breach => "breach",
        }
    }
}

/// Where a notification goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum NotificationTarget {
    Email { address: String },
    Webhook { url: String },
}

/// Per-severity notification routing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationRouting {
    pub warning: Vec<NotificationTarget>,
    pub critical: Vec<NotificationTarget>,
    pub breach: Vec<NotificationTarget>,
}

impl NotificationRouting {
    pub fn targets_for(&self, severity: Severity) -> &[NotificationTarget] {
        match severity {
            Severity::Warning => &self.warning,
            Severity::Critical => &self.critical,
            Severity::Breach => &self.breach,
        }
    }
}

/// Escalating thresholds for one metric of one SLA.
///
/// Invariant: `warning` is the least severe boundary and `breach` the most
/// severe; the direction depends on the metric's comparison operator. For
/// Gte metrics severity grows as the value falls below target, for Lte as
/// it rises above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaThreshold {
    pub id: String,
    pub sla_id: String,
    pub metric_id: String,
    pub warning: f64,
    pub critical: f64,
    pub breach: f64,
    pub notifications: NotificationRouting,
    pub auto_remediation: Option<Vec<RemediationAction>>,
}

impl SlaThreshold {
    pub fn new(sla_id: &str, metric_id: &str, warning: f64, critical: f64, breach: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sla_id: sla_id.to_string(),
            metric_id: metric_id.to_string(),
            warning,
            critical,
            breach,
            notifications: NotificationRouting::default(),
            auto_remediation: None,
        }
    }

    /// Derive default boundaries as percentages of the metric's target,
    /// adjusted for comparison direction
    pub fn derive_defaults(sla: &SlaDefinition, metric: &SlaMetric) -> Self {
        let (warning, critical, breach) = match metric.comparison {
            Comparison::Gte => (
                metric.target * 0.95,
                metric.target * 0.90,
                metric.target * 0.85,
            ),
            // Eq metrics are treated like Lte for boundary derivation.
            Comparison::Lte | Comparison::Eq => (
                metric.target * 1.05,
                metric.target * 1.10,
                metric.target * 1.15,
            ),
        };
        Self::new(&sla.id, &metric.id, warning, critical, breach)
    }

    /// Boundary ordering sanity check against the metric's direction
    pub fn is_consistent_for(&self, comparison: Comparison) -> bool {
        match comparison {
            Comparison::Gte => self.warning >= self.critical && self.critical >= self.breach,
            Comparison::Lte | Comparison::Eq => {
                self.warning <= self.critical && self.critical <= self.breach
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sla::definition::SlaDefinition;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Breach);
    }

    #[test]
    fn test_default_derivation_gte() {
        let sla = SlaDefinition::standard_tier();
        let availability = &sla.metrics[0];
        let t = SlaThreshold::derive_defaults(&sla, availability);

        // 99.9 target: boundaries fall below it, in order.
        assert!((t.warning - 94.905).abs() < 1e-9);
        assert!((t.critical - 89.91).abs() < 1e-9);
        assert!((t.breach - 84.915).abs() < 1e-9);
        assert!(t.is_consistent_for(availability.comparison));
    }

    #[test]
    fn test_default_derivation_lte() {
        let sla = SlaDefinition::standard_tier();
        let response = &sla.metrics[1];
        let t = SlaThreshold::derive_defaults(&sla, response);

        // 1000ms target: boundaries rise above it, in order.
        assert_eq!(t.warning, 1050.0);
        assert_eq!(t.critical, 1100.0);
        assert_eq!(t.breach, 1150.0);
        assert!(t.is_consistent_for(response.comparison));
    }

    #[test]
    fn test_notification_routing() {
        let mut routing = NotificationRouting::default();
        routing.warning.push(NotificationTarget::Email {
            address: "oncall@example.com".to_string(),
        });
        routing.breach.push(NotificationTarget::Webhook {
            url: "https://hooks.example.com/sla".to_string(),
        });

        assert_eq!(routing.targets_for(Severity::Warning).len(), 1);
        assert!(routing.targets_for(Severity::Critical).is_empty());
        assert_eq!(routing.targets_for(Severity::Breach).len(), 1);
    }
}
