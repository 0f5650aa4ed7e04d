//! Notification and alert dispatch
//!
//! Email notifications are logged as dispatched; actual transport is an
//! external collaborator. Webhooks POST a fixed JSON envelope. Dispatch is
//! best-effort and fire-and-forget: a failed target is logged and never
//! rolls back evaluation state. A per-(SLA, metric, severity) cooldown
//! keeps a flapping metric from flooding a channel.

use crate::sla::threshold::{NotificationTarget, Severity};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fixed webhook payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: String,
    pub sla: String,
    pub metric: String,
    pub current_value: f64,
    pub target: f64,
    pub deviation_percentage: f64,
    pub timestamp: DateTime<Utc>,
}

impl WebhookEnvelope {
    pub fn sla_violation(
        severity: Severity,
        sla: &str,
        metric: &str,
        current_value: f64,
        target: f64,
        deviation_percentage: f64,
    ) -> Self {
        Self {
            kind: "sla_violation".to_string(),
            severity: severity.as_str().to_string(),
            sla: sla.to_string(),
            metric: metric.to_string(),
            current_value,
            target,
            deviation_percentage,
            timestamp: Utc::now(),
        }
    }
}

/// Business impact attached to raised alerts, derived from whether the
/// breaching metric is flagged critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessImpact {
    High,
    Medium,
}

/// Structured alert raised to the external alerting surface for critical
/// and breach severities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaAlert {
    pub id: String,
    pub sla: String,
    pub metric: String,
    pub severity: Severity,
    pub business_impact: BusinessImpact,
    pub current_value: f64,
    pub target: f64,
    pub deviation_percent: f64,
    pub created_at: DateTime<Utc>,
}

impl SlaAlert {
    pub fn new(
        sla: &str,
        metric: &str,
        severity: Severity,
        critical_metric: bool,
        current_value: f64,
        target: f64,
        deviation_percent: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sla: sla.to_string(),
            metric: metric.to_string(),
            severity,
            business_impact: if critical_metric {
                BusinessImpact::High
            } else {
                BusinessImpact::Medium
            },
            current_value,
            target,
            deviation_percent,
            created_at: Utc::now(),
        }
    }
}

/// External alerting surface. Only genuine SLA violations reach this;
/// internal plumbing errors stay in the logs.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: &SlaAlert);
}

/// Default alert surface: severity-mapped log lines
#[derive(Debug, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: &SlaAlert) {
        warn!(
            sla = %alert.sla,
            metric = %alert.metric,
            severity = alert.severity.as_str(),
            impact = ?alert.business_impact,
            value = alert.current_value,
            target = alert.target,
            "sla alert raised"
        );
    }
}

/// In-memory alert surface for tests
#[derive(Debug, Default)]
pub struct MemoryAlertSink {
    alerts: parking_lot::Mutex<Vec<SlaAlert>>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<SlaAlert> {
        self.alerts.lock().clone()
    }
}

impl AlertSink for MemoryAlertSink {
    fn raise(&self, alert: &SlaAlert) {
        self.alerts.lock().push(alert.clone());
    }
}

/// Dispatches notifications to routed targets with cooldown suppression
pub struct Notifier {
    client: reqwest::Client,
    cooldown: Duration,
    last_sent: DashMap<(String, String, Severity), Instant>,
}

impl Notifier {
    pub fn new(webhook_timeout: Duration, cooldown: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(webhook_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            cooldown,
            last_sent: DashMap::new(),
        }
    }

    /// Whether a notification for this key is currently suppressed
    pub fn in_cooldown(&self, sla: &str, metric: &str, severity: Severity) -> bool {
        self.last_sent
            .get(&(sla.to_string(), metric.to_string(), severity))
            .map(|at| at.elapsed() < self.cooldown)
            .unwrap_or(false)
    }

    /// Dispatch one envelope to every routed target. Failures are logged,
    /// never propagated.
    pub async fn dispatch(&self, targets: &[NotificationTarget], envelope: &WebhookEnvelope) {
        let key = (
            envelope.sla.clone(),
            envelope.metric.clone(),
            severity_from_str(&envelope.severity),
        );
        if let Some(at) = self.last_sent.get(&key) {
            if at.elapsed() < self.cooldown {
                debug!(
                    sla = %envelope.sla,
                    metric = %envelope.metric,
                    severity = %envelope.severity,
                    "notification suppressed by cooldown"
                );
                return;
            }
        }
        if targets.is_empty() {
            return;
        }
        self.last_sent.insert(key, Instant::now());

        for target in targets {
            match target {
                NotificationTarget::Email { address } => {
                    info!(
                        to = %address,
                        sla = %envelope.sla,
                        metric = %envelope.metric,
                        severity = %envelope.severity,
                        "email notification dispatched"
                    );
                }
                NotificationTarget::Webhook { url } => {
                    match self.client.post(url).json(envelope).send().await {
                        Ok(resp) if resp.status().is_success() => {
                            debug!(url = %url, "webhook notification delivered");
                        }
                        Ok(resp) => {
                            warn!(url = %url, status = %resp.status(), "webhook returned non-success");
                        }
                        Err(e) => {
                            warn!(url = %url, error = %e, "webhook dispatch failed");
                        }
                    }
                }
            }
        }
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "breach" => Severity::Breach,
        "critical" => Severity::Critical,
        _ => Severity::Warning,
    }
}
