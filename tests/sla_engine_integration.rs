//! # SLA Compliance Engine Integration Tests
//!
//! End-to-end scenarios for the compliance engine: seeding, deviation
//! classification through the full monitoring tick, exemption suppression,
//! business-hours gating, weighted reporting and the administrative API.

use chrono::Utc;
use pulse_core::config::{EngineConfig, NotificationConfig};
use pulse_core::sla::{
    Aggregation, BusinessHours, Comparison, ComplianceStatus, Exemption, InMemoryMetricsStore,
    InMemorySlaRepository, LoggingRemediationExecutor, MemoryAlertSink, MetricKind,
    NotificationTarget, Notifier, ReportingFrequency, Severity, SlaComplianceEngine,
    SlaDefinition, SlaLifecycle, SlaMetric, SlaRepository, SlaThreshold,
};
use std::sync::Arc;

/// Test fixture wiring the engine to in-memory collaborators
struct EngineFixture {
    engine: SlaComplianceEngine,
    store: Arc<InMemoryMetricsStore>,
    alerts: Arc<MemoryAlertSink>,
    repository: Arc<InMemorySlaRepository>,
    notifier: Arc<Notifier>,
}

impl EngineFixture {
    async fn new() -> Self {
        let store = Arc::new(InMemoryMetricsStore::new());
        let alerts = Arc::new(MemoryAlertSink::new());
        let repository = Arc::new(InMemorySlaRepository::new());
        let notify_config = NotificationConfig::default();
        let notifier = Arc::new(Notifier::new(
            notify_config.webhook_timeout,
            notify_config.alert_cooldown,
        ));

        let engine = SlaComplianceEngine::new(
            EngineConfig::default(),
            store.clone(),
            repository.clone(),
            alerts.clone(),
            notifier.clone(),
            Arc::new(LoggingRemediationExecutor::default()),
        );
        engine.initialize().await.expect("engine initializes");

        Self {
            engine,
            store,
            alerts,
            repository,
            notifier,
        }
    }

    fn standard_sla(&self) -> SlaDefinition {
        self.engine
            .all_slas()
            .into_iter()
            .find(|s| s.service_tier == "standard")
            .expect("standard tier seeded")
    }

    /// Push availability health-check scores with the given healthy count
    /// out of 100
    fn push_availability(&self, healthy: usize) {
        let scores: Vec<f64> = (0..100)
            .map(|i| if i < healthy { 100.0 } else { 0.0 })
            .collect();
        self.store.push_now(&MetricKind::Availability, &scores);
    }
}

#[tokio::test]
async fn seeded_engine_carries_standard_and_premium_tiers() {
    let fixture = EngineFixture::new().await;

    let slas = fixture.engine.all_slas();
    assert_eq!(slas.len(), 2);

    let standard = fixture.standard_sla();
    assert_eq!(standard.name, "Standard Performance SLA");
    assert_eq!(standard.total_weight(), 100.0);

    let availability = &standard.metrics[0];
    assert_eq!(availability.target, 99.9);
    assert!(availability.critical);

    // Both tiers were persisted, with derived thresholds for each metric.
    assert_eq!(fixture.repository.load_definitions().await.unwrap().len(), 2);
    assert_eq!(fixture.repository.load_thresholds().await.unwrap().len(), 8);

    fixture.engine.destroy();
}

#[tokio::test]
async fn small_availability_shortfall_classifies_as_warning() {
    let fixture = EngineFixture::new().await;
    let standard = fixture.standard_sla();

    // 98% against a 99.9% target: deviation ~1.9%, well under the 20%
    // critical boundary.
    fixture.push_availability(98);

    // Route warnings to email so dispatch is observable.
    let availability = standard.metrics[0].clone();
    let mut threshold = SlaThreshold::derive_defaults(&standard, &availability);
    threshold
        .notifications
        .warning
        .push(NotificationTarget::Email {
            address: "sre@example.com".to_string(),
        });
    fixture.engine.add_threshold(threshold).await.unwrap();

    fixture.engine.run_monitoring_tick().await.unwrap();

    // Warning-level deviation: notification dispatched (visible through
    // the cooldown bookkeeping), but no alert raised.
    assert!(fixture.notifier.in_cooldown(
        "Standard Performance SLA",
        "availability",
        Severity::Warning
    ));
    assert!(fixture.alerts.alerts().is_empty());

    fixture.engine.destroy();
}

#[tokio::test]
async fn sustained_outage_escalates_to_breach_alert() {
    let fixture = EngineFixture::new().await;

    // 60% availability: ~40% deviation, breach territory.
    fixture.push_availability(60);
    fixture.engine.run_monitoring_tick().await.unwrap();

    let alerts = fixture.alerts.alerts();
    assert!(!alerts.is_empty());
    assert!(alerts.iter().all(|a| a.severity == Severity::Breach));
    // Availability is a critical metric on both tiers.
    assert!(alerts
        .iter()
        .any(|a| a.sla == "Standard Performance SLA" && a.metric == "availability"));

    fixture.engine.destroy();
}

#[tokio::test]
async fn exemption_suppresses_evaluation_until_expiry() {
    let fixture = EngineFixture::new().await;
    fixture.push_availability(10);

    let now = Utc::now();
    fixture
        .engine
        .add_exemption(Exemption::new(
            "db migration",
            "planned maintenance window",
            vec![MetricKind::Availability],
            now - chrono::Duration::minutes(1),
            now + chrono::Duration::minutes(30),
        ))
        .await
        .unwrap();

    fixture.engine.run_monitoring_tick().await.unwrap();
    assert!(
        fixture.alerts.alerts().is_empty(),
        "active exemption must produce zero evaluation-derived alerts"
    );

    fixture.engine.destroy();
}

#[tokio::test]
async fn expired_exemption_does_not_suppress() {
    let fixture = EngineFixture::new().await;
    fixture.push_availability(10);

    let now = Utc::now();
    fixture
        .engine
        .add_exemption(Exemption::new(
            "old maintenance",
            "finished last week",
            vec![MetricKind::Availability],
            now - chrono::Duration::days(8),
            now - chrono::Duration::days(7),
        ))
        .await
        .unwrap();

    fixture.engine.run_monitoring_tick().await.unwrap();
    assert!(!fixture.alerts.alerts().is_empty());

    fixture.engine.destroy();
}

#[tokio::test]
async fn business_hours_metric_not_evaluated_outside_window() {
    let fixture = EngineFixture::new().await;

    // A dedicated SLA whose only metric is gated to an empty day set, so
    // "now" can never fall inside the window.
    let metric = SlaMetric::new(
        "office_error_rate",
        MetricKind::ErrorRate,
        1.0,
        Comparison::Lte,
        Aggregation::Average,
        100.0,
    )
    .with_business_hours(BusinessHours {
        days: vec![],
        start_minute: 9 * 60,
        end_minute: 17 * 60,
        utc_offset_minutes: 120,
    });
    let mut sla = SlaDefinition::new("Office Hours SLA", "standard", vec![metric]);
    sla.status = SlaLifecycle::Active;
    fixture.engine.create_sla(sla).await.unwrap();

    // Every response is a server error.
    fixture
        .store
        .push_now(&MetricKind::ErrorRate, &vec![500.0; 50]);

    fixture.engine.run_monitoring_tick().await.unwrap();
    assert!(
        !fixture
            .alerts
            .alerts()
            .iter()
            .any(|a| a.sla == "Office Hours SLA"),
        "gated metric must not be evaluated outside business hours"
    );

    fixture.engine.destroy();
}

#[tokio::test]
async fn report_weights_compliance_and_flags_breaches() {
    let fixture = EngineFixture::new().await;
    let standard = fixture.standard_sla();

    // Availability perfect, error rate catastrophic: 30% of responses are
    // errors against a 1% target.
    fixture.push_availability(100);
    let codes: Vec<f64> = (0..100)
        .map(|i| if i < 30 { 500.0 } else { 200.0 })
        .collect();
    fixture.store.push_now(&MetricKind::ErrorRate, &codes);

    fixture.engine.run_reporting_tick().await.unwrap();

    let report = fixture
        .engine
        .compliance_report(&standard.id, standard.reporting.frequency)
        .expect("report generated");

    // Error-rate entry breached and dragged the weighted score down.
    let error_entry = report
        .metrics
        .iter()
        .find(|m| m.kind == MetricKind::ErrorRate)
        .unwrap();
    assert_eq!(error_entry.status, ComplianceStatus::Breach);
    assert!(report.overall_compliance_percent < 100.0);
    assert!(!report.recommendations.is_empty());
    assert_eq!(
        report.recommendations[0].priority,
        pulse_core::sla::reporting::RecommendationPriority::High
    );

    fixture.engine.destroy();
}

#[tokio::test]
async fn critical_metric_breach_marks_whole_sla_breached() {
    let fixture = EngineFixture::new().await;

    // A custom SLA: three healthy non-critical metrics by absence of data,
    // one critical availability metric in total outage.
    let metrics = vec![
        SlaMetric::new(
            "availability",
            MetricKind::Availability,
            99.9,
            Comparison::Gte,
            Aggregation::Average,
            10.0,
        )
        .critical(),
        SlaMetric::new(
            "p95_response_time_ms",
            MetricKind::ResponseTime,
            1000.0,
            Comparison::Lte,
            Aggregation::Percentile(95),
            30.0,
        ),
        SlaMetric::new(
            "error_rate_percent",
            MetricKind::ErrorRate,
            1.0,
            Comparison::Lte,
            Aggregation::Average,
            30.0,
        ),
        SlaMetric::new(
            "throughput_rps",
            MetricKind::Throughput,
            100.0,
            Comparison::Gte,
            Aggregation::Average,
            30.0,
        ),
    ];
    let mut sla = SlaDefinition::new("Critical Override SLA", "standard", metrics);
    sla.status = SlaLifecycle::Active;
    let id = fixture.engine.create_sla(sla).await.unwrap();

    fixture.push_availability(0);

    let sla = fixture.engine.get_sla(&id).unwrap();
    let report = fixture
        .engine
        .generate_report(&sla, Utc::now())
        .await
        .unwrap();

    // The weighted score stays high (90%), but the critical breach
    // escalates the overall status.
    assert!(report.overall_compliance_percent >= 85.0);
    assert_eq!(report.overall_status, ComplianceStatus::Breach);
    assert!(report.estimated_credit_percent > 0.0);

    fixture.engine.destroy();
}

#[tokio::test]
async fn reports_supersede_per_period_key() {
    let fixture = EngineFixture::new().await;
    let standard = fixture.standard_sla();

    fixture.push_availability(100);
    fixture.engine.run_reporting_tick().await.unwrap();
    let first = fixture
        .engine
        .compliance_report(&standard.id, standard.reporting.frequency)
        .unwrap();

    // Force a second generation; the in-memory slot is replaced, while the
    // repository keeps both.
    let second = fixture
        .engine
        .generate_report(&standard, Utc::now())
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert!(!fixture.repository.reports().is_empty());

    // Unknown period for a known SLA: no report yet.
    assert!(fixture
        .engine
        .compliance_report(&standard.id, ReportingFrequency::Quarterly)
        .is_none());

    fixture.engine.destroy();
}

#[tokio::test]
async fn lifecycle_is_forward_only_through_admin_api() {
    let fixture = EngineFixture::new().await;

    let metric = SlaMetric::new(
        "availability",
        MetricKind::Availability,
        99.0,
        Comparison::Gte,
        Aggregation::Average,
        100.0,
    );
    let definition = SlaDefinition::new("Draft SLA", "standard", vec![metric]);
    let id = fixture.engine.create_sla(definition).await.unwrap();

    assert!(fixture.engine.update_sla_status(&id, SlaLifecycle::Active).await);
    assert!(
        fixture
            .engine
            .update_sla_status(&id, SlaLifecycle::Deprecated)
            .await
    );
    assert!(
        !fixture.engine.update_sla_status(&id, SlaLifecycle::Active).await,
        "backward transition must be rejected"
    );
    assert!(
        fixture
            .engine
            .update_sla_status(&id, SlaLifecycle::Archived)
            .await
    );

    fixture.engine.destroy();
}
