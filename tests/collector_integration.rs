//! # Telemetry Collector Integration Tests
//!
//! End-to-end collector scenarios: a sampled-in booking session walking the
//! funnel, vitals arriving with budget checks, and the summary surface the
//! host application reads.

use pulse_common::{DeviceClass, DeviceInfo, NetworkInfo, PageType};
use pulse_core::collector::{
    MemoryAnalyticsSink, MemoryViolationReporter, RumCollector, ViolationSeverity, WebVital,
};
use pulse_core::config::CollectorConfig;
use std::sync::Arc;

struct CollectorFixture {
    collector: Arc<RumCollector>,
    analytics: Arc<MemoryAnalyticsSink>,
    violations: Arc<MemoryViolationReporter>,
}

impl CollectorFixture {
    fn sampled_in() -> Self {
        Self::with_draw(1.0, 0.0)
    }

    fn with_draw(sample_rate: f64, draw: f64) -> Self {
        let analytics = Arc::new(MemoryAnalyticsSink::new());
        let violations = Arc::new(MemoryViolationReporter::new());
        let config = CollectorConfig {
            sample_rate,
            ..Default::default()
        };
        let collector = Arc::new(RumCollector::with_sample_draw(
            config,
            DeviceInfo {
                class: DeviceClass::Desktop,
                os: "macos".to_string(),
                viewport_width: 1440,
            },
            Some(NetworkInfo {
                effective_type: Some("4g".to_string()),
                downlink_mbps: Some(40.0),
                rtt_ms: Some(30.0),
                save_data: false,
            }),
            analytics.clone(),
            violations.clone(),
            draw,
        ));
        Self {
            collector,
            analytics,
            violations,
        }
    }
}

#[test]
fn booking_session_end_to_end() {
    let fixture = CollectorFixture::sampled_in();
    let c = &fixture.collector;
    c.initialize();

    // The user walks into the booking flow.
    c.observe_navigation("/booking/step1");
    c.observe_navigation("/booking/step2");

    // A slow LCP arrives: 2500ms against a 2000ms budget is a warning;
    // 3100ms crosses 1.5x into critical.
    c.record_vital(WebVital::Lcp, 2500.0);
    c.record_vital(WebVital::Lcp, 3100.0);

    let violations = fixture.violations.violations();
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].severity, ViolationSeverity::Warning);
    assert_eq!(violations[1].severity, ViolationSeverity::Critical);
    assert_eq!(violations[1].page_type, PageType::Booking);
    assert_eq!(violations[1].network_type.as_deref(), Some("4g"));

    // The summary reflects the latest sample and the blown budget.
    let summary = c.performance_summary();
    let lcp = &summary.vitals["LCP"];
    assert!(!lcp.within_budget);
    assert_eq!(lcp.value, 3100.0);
    assert_eq!(lcp.samples, 2);

    // The funnel kept both transitions in order.
    let metrics = c.metrics();
    let funnel = &metrics["booking-funnel"];
    assert_eq!(funnel.len(), 2);
    assert_eq!(funnel[0].name, "funnel_service_selection");
    assert_eq!(funnel[1].name, "funnel_time_selection");
}

#[test]
fn funnel_skips_are_not_synthesized() {
    let fixture = CollectorFixture::sampled_in();
    let c = &fixture.collector;
    c.initialize();

    c.observe_navigation("/booking/step1");
    c.observe_navigation("/booking/step2");
    c.observe_navigation("/booking/step4"); // step3 skipped

    let metrics = c.metrics();
    let names: Vec<&str> = metrics["booking-funnel"]
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "funnel_service_selection",
            "funnel_time_selection",
            "funnel_payment"
        ]
    );
}

#[test]
fn sampled_out_session_records_nothing_automatic() {
    let fixture = CollectorFixture::with_draw(0.0, 0.5);
    let c = &fixture.collector;
    c.initialize();

    c.observe_navigation("/booking/step1");
    c.record_vital(WebVital::Lcp, 9000.0);

    assert!(c.metrics().is_empty());
    assert!(fixture.violations.violations().is_empty());

    // Manual tracking still works after initialize().
    c.track_event("newsletter_signup", serde_json::json!({"value": 1.0}));
    assert_eq!(c.metrics()["custom"].len(), 1);
}

#[test]
fn bounded_buffers_hold_the_last_hundred() {
    let fixture = CollectorFixture::sampled_in();
    let c = &fixture.collector;
    c.initialize();

    for i in 0..150 {
        c.record_vital(WebVital::Ttfb, 100.0 + i as f64);
    }

    let vitals = &c.metrics()["core-web-vitals"];
    assert_eq!(vitals.len(), 100);
    assert_eq!(vitals.first().unwrap().value, 150.0);
    assert_eq!(vitals.last().unwrap().value, 249.0);
}

#[test]
fn analytics_sink_sees_every_processed_sample() {
    let fixture = CollectorFixture::sampled_in();
    let c = &fixture.collector;
    c.initialize();

    c.record_vital(WebVital::Fcp, 1200.0);
    c.observe_resource("https://app.example.com/api/slots", 90.0, 512);

    let events = fixture.analytics.events();
    assert!(events.iter().any(|(cat, _)| cat == "core-web-vitals"));
    assert!(events.iter().any(|(cat, _)| cat == "api-performance"));
    // Session start was forwarded too.
    assert!(events.iter().any(|(_, s)| s.name == "session_start"));
}

#[test]
fn clear_data_resets_buffers_only() {
    let fixture = CollectorFixture::sampled_in();
    let c = &fixture.collector;
    c.initialize();

    c.observe_navigation("/booking/step1");
    c.record_vital(WebVital::Cls, 0.2);
    assert!(!c.metrics().is_empty());

    c.clear_data();
    assert!(c.metrics().is_empty());

    // Instrumentation continues on the same session.
    c.record_vital(WebVital::Cls, 0.01);
    assert_eq!(c.metrics()["core-web-vitals"].len(), 1);
}
