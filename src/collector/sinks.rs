//! Reporting boundaries for the collector
//!
//! Processed samples flow to an analytics sink; budget violations go to a
//! separate error-reporting collaborator. Both are injected so the host
//! application decides where telemetry lands. Dispatch is fire-and-forget:
//! sink failures must never reach the booking UI.

use crate::collector::vitals::ViolationSeverity;
use parking_lot::Mutex;
use pulse_common::{DeviceClass, MetricSample, PageType};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// A Core Web Vital observation that exceeded its budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetViolation {
    pub metric: String,
    pub value: f64,
    pub budget: f64,
    pub severity: ViolationSeverity,
    pub page_type: PageType,
    pub device_class: DeviceClass,
    pub network_type: Option<String>,
}

/// Receives every processed sample, keyed by category
pub trait AnalyticsSink: Send + Sync {
    fn dispatch(&self, category: &str, sample: &MetricSample);
}

/// Receives budget violations as structured warning/critical messages
pub trait ViolationReporter: Send + Sync {
    fn report(&self, violation: &BudgetViolation);
}

/// Default sink: structured log lines
#[derive(Debug, Default)]
pub struct TracingAnalyticsSink;

impl AnalyticsSink for TracingAnalyticsSink {
    fn dispatch(&self, category: &str, sample: &MetricSample) {
        debug!(
            category,
            metric = %sample.name,
            value = sample.value,
            page = ?sample.page_type,
            "telemetry sample"
        );
    }
}

/// Default reporter: severity-mapped log lines
#[derive(Debug, Default)]
pub struct TracingViolationReporter;

impl ViolationReporter for TracingViolationReporter {
    fn report(&self, violation: &BudgetViolation) {
        match violation.severity {
            ViolationSeverity::Warning => warn!(
                metric = %violation.metric,
                value = violation.value,
                budget = violation.budget,
                "performance budget exceeded"
            ),
            ViolationSeverity::Critical => error!(
                metric = %violation.metric,
                value = violation.value,
                budget = violation.budget,
                "performance budget critically exceeded"
            ),
        }
    }
}

/// In-memory sink for tests and local inspection
#[derive(Debug, Default)]
pub struct MemoryAnalyticsSink {
    events: Mutex<Vec<(String, MetricSample)>>,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, MetricSample)> {
        self.events.lock().clone()
    }
}

impl AnalyticsSink for MemoryAnalyticsSink {
    fn dispatch(&self, category: &str, sample: &MetricSample) {
        self.events
            .lock()
            .push((category.to_string(), sample.clone()));
    }
}

/// In-memory reporter for tests and local inspection
#[derive(Debug, Default)]
pub struct MemoryViolationReporter {
    violations: Mutex<Vec<BudgetViolation>>,
}

impl MemoryViolationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn violations(&self) -> Vec<BudgetViolation> {
        self.violations.lock().clone()
    }
}

impl ViolationReporter for MemoryViolationReporter {
    fn report(&self, violation: &BudgetViolation) {
        self.violations.lock().push(violation.clone());
    }
}
