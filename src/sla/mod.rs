//! # SLA Compliance Engine
//!
//! Owns the set of active SLA definitions and their thresholds. On the
//! monitoring tick it evaluates every metric of every active SLA against
//! the aggregated metrics store, classifies deviations, notifies, raises
//! alerts and runs auto-remediation. On the reporting tick it compiles
//! weighted compliance reports per SLA at that SLA's configured frequency.
//!
//! The engine is explicitly constructed with injected collaborators and has
//! an explicit lifecycle: `initialize()` loads (or seeds) state and starts
//! the tick loops, `destroy()` stops them. Per-metric evaluation failures
//! are isolated: one unreachable series never aborts sibling evaluations.

pub mod definition;
pub mod evaluation;
pub mod notify;
pub mod remediation;
pub mod reporting;
pub mod scheduler;
pub mod store;
pub mod threshold;

pub use definition::{
    Aggregation, BusinessHours, Comparison, Exemption, MetricKind, ReportingFrequency,
    SlaDefinition, SlaLifecycle, SlaMetric,
};
pub use notify::{AlertSink, MemoryAlertSink, Notifier, SlaAlert, TracingAlertSink, WebhookEnvelope};
pub use remediation::{LoggingRemediationExecutor, RemediationAction, RemediationExecutor};
pub use reporting::{ComplianceReport, ComplianceStatus};
pub use store::{
    InMemoryMetricsStore, InMemorySlaRepository, MetricsStore, SlaRepository, StoreError, TimeRange,
};
pub use threshold::{NotificationTarget, Severity, SlaThreshold};

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use evaluation::MetricEvaluation;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Server-side SLA compliance engine
#[derive(Clone)]
pub struct SlaComplianceEngine {
    config: EngineConfig,
    metrics_store: Arc<dyn MetricsStore>,
    repository: Arc<dyn SlaRepository>,
    alerts: Arc<dyn AlertSink>,
    notifier: Arc<Notifier>,
    remediation: Arc<dyn RemediationExecutor>,
    definitions: Arc<RwLock<HashMap<String, SlaDefinition>>>,
    /// Keyed by (sla_id, metric_id)
    thresholds: Arc<RwLock<HashMap<(String, String), SlaThreshold>>>,
    exemptions: Arc<RwLock<Vec<Exemption>>>,
    /// Latest report per (sla_id, frequency); superseded on key insertion,
    /// prior reports stay in the repository
    reports: Arc<RwLock<HashMap<(String, ReportingFrequency), ComplianceReport>>>,
    /// Bounded evaluation history per SLA, for incident derivation
    history: Arc<RwLock<HashMap<String, VecDeque<MetricEvaluation>>>>,
    last_report_at: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
    initialized: Arc<AtomicBool>,
    tick_handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SlaComplianceEngine {
    pub fn new(
        config: EngineConfig,
        metrics_store: Arc<dyn MetricsStore>,
        repository: Arc<dyn SlaRepository>,
        alerts: Arc<dyn AlertSink>,
        notifier: Arc<Notifier>,
        remediation: Arc<dyn RemediationExecutor>,
    ) -> Self {
        Self {
            config,
            metrics_store,
            repository,
            alerts,
            notifier,
            remediation,
            definitions: Arc::new(RwLock::new(HashMap::new())),
            thresholds: Arc::new(RwLock::new(HashMap::new())),
            exemptions: Arc::new(RwLock::new(Vec::new())),
            reports: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(HashMap::new())),
            last_report_at: Arc::new(RwLock::new(HashMap::new())),
            initialized: Arc::new(AtomicBool::new(false)),
            tick_handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Load persisted state (seeding defaults when empty) and start the
    /// monitoring and reporting tick loops. Idempotent.
    pub async fn initialize(&self) -> anyhow::Result<()> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("engine already initialized");
            return Ok(());
        }
        info!(
            monitoring_interval = ?self.config.monitoring_interval,
            reporting_interval = ?self.config.reporting_interval,
            "initializing SLA compliance engine"
        );

        self.load_definitions().await?;
        self.load_thresholds().await?;
        self.load_exemptions().await?;
        self.start_tick_loops();

        info!(
            slas = self.definitions.read().len(),
            "SLA compliance engine initialized"
        );
        Ok(())
    }

    async fn load_definitions(&self) -> anyhow::Result<()> {
        let mut loaded: Vec<SlaDefinition> = self
            .repository
            .load_definitions()
            .await?
            .into_iter()
            .filter(|d| d.status.is_active())
            .collect();

        if loaded.is_empty() {
            info!("no persisted SLA definitions, seeding default tiers");
            let standard = SlaDefinition::standard_tier();
            let premium = SlaDefinition::premium_tier();
            for sla in [&standard, &premium] {
                if let Err(e) = self.repository.save_definition(sla).await {
                    warn!(sla = %sla.name, error = %e, "failed to persist seeded definition");
                }
            }
            loaded = vec![standard, premium];
        }

        let mut definitions = self.definitions.write();
        for sla in loaded {
            definitions.insert(sla.id.clone(), sla);
        }
        Ok(())
    }

    async fn load_thresholds(&self) -> anyhow::Result<()> {
        let persisted = self.repository.load_thresholds().await?;
        {
            let mut thresholds = self.thresholds.write();
            for t in persisted {
                thresholds.insert((t.sla_id.clone(), t.metric_id.clone()), t);
            }
        }

        // Derive direction-adjusted defaults for any (SLA, metric) pair
        // without a persisted record.
        let definitions: Vec<SlaDefinition> = self.definitions.read().values().cloned().collect();
        for sla in &definitions {
            for metric in &sla.metrics {
                let key = (sla.id.clone(), metric.id.clone());
                if self.thresholds.read().contains_key(&key) {
                    continue;
                }
                let derived = SlaThreshold::derive_defaults(sla, metric);
                if let Err(e) = self.repository.save_threshold(&derived).await {
                    warn!(metric = %metric.name, error = %e, "failed to persist derived threshold");
                }
                self.thresholds.write().insert(key, derived);
            }
        }
        Ok(())
    }

    async fn load_exemptions(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let active: Vec<Exemption> = self
            .repository
            .load_exemptions()
            .await?
            .into_iter()
            .filter(|e| e.expires_at > now)
            .collect();
        *self.exemptions.write() = active;
        Ok(())
    }

    fn start_tick_loops(&self) {
        let mut handles = self.tick_handles.lock();

        let engine = self.clone();
        handles.push(scheduler::spawn_tick_loop(
            "sla-monitoring",
            self.config.monitoring_interval,
            move || {
                let engine = engine.clone();
                async move { engine.run_monitoring_tick().await }
            },
        ));

        let engine = self.clone();
        handles.push(scheduler::spawn_tick_loop(
            "sla-reporting",
            self.config.reporting_interval,
            move || {
                let engine = engine.clone();
                async move { engine.run_reporting_tick().await }
            },
        ));
    }

    /// Stop both tick loops and flip the initialized flag. A tick already
    /// in progress is aborted, not awaited.
    pub fn destroy(&self) {
        let mut handles = self.tick_handles.lock();
        for handle in handles.drain(..) {
            handle.abort();
        }
        self.initialized.store(false, Ordering::SeqCst);
        info!("SLA compliance engine destroyed");
    }

    // ------------------------------------------------------------------
    // Monitoring tick
    // ------------------------------------------------------------------

    /// Evaluate every metric of every active SLA once. Failures are
    /// isolated per metric.
    pub async fn run_monitoring_tick(&self) -> anyhow::Result<()> {
        let definitions: Vec<SlaDefinition> = self
            .definitions
            .read()
            .values()
            .filter(|d| d.status.is_active())
            .cloned()
            .collect();

        for sla in &definitions {
            for metric in &sla.metrics {
                match self.evaluate_metric(sla, metric).await {
                    Ok(Some(eval)) => {
                        self.push_history(&sla.id, eval.clone());
                        if let Some(severity) = eval.severity {
                            self.handle_deviation(sla, metric, &eval, severity).await;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            sla = %sla.name,
                            metric = %metric.name,
                            error = %e,
                            "metric evaluation failed, continuing with siblings"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate one metric. `Ok(None)` means evaluation was skipped: no
    /// data in the window, a matching exemption, a maintenance window, or
    /// outside business hours.
    async fn evaluate_metric(
        &self,
        sla: &SlaDefinition,
        metric: &SlaMetric,
    ) -> anyhow::Result<Option<MetricEvaluation>> {
        let now = Utc::now();
        let window = chrono::Duration::from_std(metric.measurement.window)
            .unwrap_or_else(|_| chrono::Duration::minutes(5));
        let range = TimeRange::ending_at(now, window);

        let raw = self.metrics_store.query(&metric.kind, &range).await?;
        let value = match evaluation::current_value(&metric.kind, metric.aggregation, &raw) {
            Some(v) => v,
            // Absence of data is "cannot evaluate", never an alert.
            None => {
                debug!(metric = %metric.name, "no data in window, skipping");
                return Ok(None);
            }
        };

        let exempted = {
            let exemptions = self.exemptions.read();
            sla.exemptions
                .iter()
                .chain(exemptions.iter())
                .any(|e| e.matches(&metric.kind, now))
        };
        if exempted {
            debug!(metric = %metric.name, "evaluation suppressed by exemption");
            return Ok(None);
        }

        if metric.maintenance.iter().any(|w| w.contains(now)) {
            debug!(metric = %metric.name, "inside maintenance window, skipping");
            return Ok(None);
        }

        if let Some(hours) = &metric.business_hours {
            if !hours.contains(now) {
                debug!(metric = %metric.name, "outside business hours, skipping");
                return Ok(None);
            }
        }

        let severity = if metric.comparison.in_target(value, metric.target) {
            None
        } else {
            let deviation = evaluation::deviation_percent(value, metric.target);
            Some(evaluation::classify_deviation(deviation))
        };

        Ok(Some(MetricEvaluation {
            sla_id: sla.id.clone(),
            metric_id: metric.id.clone(),
            metric_name: metric.name.clone(),
            kind: metric.kind.clone(),
            value,
            target: metric.target,
            comparison: metric.comparison,
            deviation_percent: evaluation::deviation_percent(value, metric.target),
            severity,
            evaluated_at: now,
        }))
    }

    /// Notify, raise alerts and remediate for one out-of-target evaluation
    async fn handle_deviation(
        &self,
        sla: &SlaDefinition,
        metric: &SlaMetric,
        eval: &MetricEvaluation,
        severity: Severity,
    ) {
        warn!(
            sla = %sla.name,
            metric = %metric.name,
            value = eval.value,
            target = eval.target,
            deviation = eval.deviation_percent,
            severity = severity.as_str(),
            "sla deviation detected"
        );

        let threshold = self
            .thresholds
            .read()
            .get(&(sla.id.clone(), metric.id.clone()))
            .cloned();

        let envelope = WebhookEnvelope::sla_violation(
            severity,
            &sla.name,
            &metric.name,
            eval.value,
            eval.target,
            eval.deviation_percent,
        );

        if let Some(threshold) = &threshold {
            let targets = threshold.notifications.targets_for(severity);
            self.notifier.dispatch(targets, &envelope).await;
        }

        if severity >= Severity::Critical {
            let alert = SlaAlert::new(
                &sla.name,
                &metric.name,
                severity,
                metric.critical,
                eval.value,
                eval.target,
                eval.deviation_percent,
            );
            self.alerts.raise(&alert);
        }

        if let Some(threshold) = &threshold {
            if let Some(actions) = &threshold.auto_remediation {
                for action in actions {
                    if let Err(e) = self
                        .remediation
                        .execute(&sla.name, &metric.name, action)
                        .await
                    {
                        warn!(
                            sla = %sla.name,
                            metric = %metric.name,
                            error = %e,
                            "remediation action failed"
                        );
                    }
                }
            }
        }
    }

    fn push_history(&self, sla_id: &str, eval: MetricEvaluation) {
        let mut history = self.history.write();
        let entries = history.entry(sla_id.to_string()).or_default();
        entries.push_back(eval);
        while entries.len() > self.config.history_limit {
            entries.pop_front();
        }
    }

    // ------------------------------------------------------------------
    // Reporting tick
    // ------------------------------------------------------------------

    /// Compile compliance reports for SLAs whose reporting frequency has
    /// elapsed since their previous report
    pub async fn run_reporting_tick(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let definitions: Vec<SlaDefinition> = self
            .definitions
            .read()
            .values()
            .filter(|d| d.status.is_active())
            .cloned()
            .collect();

        for sla in &definitions {
            let due = {
                let last = self.last_report_at.read();
                match last.get(&sla.id) {
                    Some(at) => now - *at >= sla.reporting.frequency.interval(),
                    None => true,
                }
            };
            if !due {
                continue;
            }

            match self.generate_report(sla, now).await {
                Ok(report) => {
                    self.last_report_at.write().insert(sla.id.clone(), now);
                    if let Err(e) = self.repository.save_report(&report).await {
                        warn!(sla = %sla.name, error = %e, "failed to persist compliance report");
                    }
                    for recipient in &sla.reporting.recipients {
                        info!(
                            to = %recipient,
                            sla = %sla.name,
                            compliance = report.overall_compliance_percent,
                            status = ?report.overall_status,
                            "compliance report dispatched"
                        );
                    }
                    self.reports
                        .write()
                        .insert((sla.id.clone(), sla.reporting.frequency), report);
                }
                Err(e) => {
                    warn!(sla = %sla.name, error = %e, "report generation failed");
                }
            }
        }
        Ok(())
    }

    /// Build one compliance report over the SLA's reporting period
    pub async fn generate_report(
        &self,
        sla: &SlaDefinition,
        now: DateTime<Utc>,
    ) -> anyhow::Result<ComplianceReport> {
        let period_start = now - sla.reporting.frequency.lookback();
        let range = TimeRange::new(period_start, now);

        let mut entries = Vec::with_capacity(sla.metrics.len());
        for metric in &sla.metrics {
            let actual = match self.metrics_store.query(&metric.kind, &range).await {
                Ok(raw) => evaluation::current_value(&metric.kind, metric.aggregation, &raw),
                Err(e) => {
                    warn!(metric = %metric.name, error = %e, "period query failed, reporting without data");
                    None
                }
            };

            // A metric without data cannot be evaluated; it reports as
            // compliant-by-absence rather than fabricating a breach.
            let compliance_percent = actual
                .map(|v| reporting::metric_compliance_percent(metric.comparison, v, metric.target))
                .unwrap_or(100.0);

            entries.push(reporting::MetricCompliance {
                metric_id: metric.id.clone(),
                name: metric.name.clone(),
                kind: metric.kind.clone(),
                actual,
                target: metric.target,
                compliance_percent,
                status: reporting::classify_compliance(compliance_percent),
                weight: metric.weight,
                critical: metric.critical,
            });
        }

        let incidents = {
            let history = self.history.read();
            let evaluations: Vec<MetricEvaluation> = history
                .get(&sla.id)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default();
            reporting::derive_incidents(
                sla,
                &evaluations,
                self.config.monitoring_interval,
                period_start,
            )
        };

        Ok(ComplianceReport::assemble(
            sla,
            period_start,
            now,
            entries,
            incidents,
        ))
    }

    // ------------------------------------------------------------------
    // Administrative API
    // ------------------------------------------------------------------

    /// Register a new SLA definition; derives default thresholds for its
    /// metrics and persists both
    pub async fn create_sla(&self, definition: SlaDefinition) -> anyhow::Result<String> {
        let id = definition.id.clone();
        self.repository.save_definition(&definition).await?;

        for metric in &definition.metrics {
            let key = (definition.id.clone(), metric.id.clone());
            if self.thresholds.read().contains_key(&key) {
                continue;
            }
            let derived = SlaThreshold::derive_defaults(&definition, metric);
            if let Err(e) = self.repository.save_threshold(&derived).await {
                warn!(metric = %metric.name, error = %e, "failed to persist derived threshold");
            }
            self.thresholds.write().insert(key, derived);
        }

        self.definitions.write().insert(id.clone(), definition);
        Ok(id)
    }

    /// `None` for an unknown identifier, never an error
    pub fn get_sla(&self, sla_id: &str) -> Option<SlaDefinition> {
        self.definitions.read().get(sla_id).cloned()
    }

    pub fn all_slas(&self) -> Vec<SlaDefinition> {
        self.definitions.read().values().cloned().collect()
    }

    /// Forward-only lifecycle transition; returns false (and changes
    /// nothing) for an invalid move or unknown id
    pub async fn update_sla_status(&self, sla_id: &str, next: SlaLifecycle) -> bool {
        let updated = {
            let mut definitions = self.definitions.write();
            match definitions.get_mut(sla_id) {
                Some(sla) => {
                    if sla.transition_to(next) {
                        Some(sla.clone())
                    } else {
                        None
                    }
                }
                None => None,
            }
        };
        match updated {
            Some(sla) => {
                if let Err(e) = self.repository.save_definition(&sla).await {
                    warn!(sla = %sla.name, error = %e, "failed to persist status change");
                }
                true
            }
            None => false,
        }
    }

    /// Register (or replace) a threshold record
    pub async fn add_threshold(&self, threshold: SlaThreshold) -> anyhow::Result<String> {
        let id = threshold.id.clone();
        self.repository.save_threshold(&threshold).await?;
        self.thresholds.write().insert(
            (threshold.sla_id.clone(), threshold.metric_id.clone()),
            threshold,
        );
        Ok(id)
    }

    /// Register an exemption; evaluation of matching metrics is suppressed
    /// until it expires
    pub async fn add_exemption(&self, exemption: Exemption) -> anyhow::Result<String> {
        let id = exemption.id.clone();
        self.repository.save_exemption(&exemption).await?;
        self.exemptions.write().push(exemption);
        Ok(id)
    }

    /// Latest report for (SLA, period); `None` when the SLA is unknown or
    /// no report has been generated yet
    pub fn compliance_report(
        &self,
        sla_id: &str,
        period: ReportingFrequency,
    ) -> Option<ComplianceReport> {
        self.reports
            .read()
            .get(&(sla_id.to_string(), period))
            .cloned()
    }
}
