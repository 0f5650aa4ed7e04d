//! Storage boundaries for the compliance engine
//!
//! Two async seams: the aggregated metrics store the engine reads on every
//! tick, and the durable repository for definitions, thresholds, exemptions
//! and reports. In-memory implementations back tests and the demo binary;
//! production wires real backends behind the same traits.

use crate::sla::definition::{Exemption, MetricKind, SlaDefinition};
use crate::sla::reporting::ComplianceReport;
use crate::sla::threshold::SlaThreshold;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

/// Failures at the storage boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metrics store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
}

/// Query window, end exclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of the given length ending at `end`
    pub fn ending_at(end: DateTime<Utc>, length: chrono::Duration) -> Self {
        Self {
            start: end - length,
            end,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Read boundary over the aggregated metrics store.
///
/// Raw series semantics per kind: availability returns health-check scores,
/// error rate returns HTTP status codes, everything else returns raw values
/// to be aggregated by the engine.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn query(&self, kind: &MetricKind, range: &TimeRange) -> Result<Vec<f64>, StoreError>;
}

/// Durable persistence for engine state. Administrative writes go through
/// here in addition to updating in-memory maps.
#[async_trait]
pub trait SlaRepository: Send + Sync {
    async fn load_definitions(&self) -> Result<Vec<SlaDefinition>, StoreError>;
    async fn save_definition(&self, definition: &SlaDefinition) -> Result<(), StoreError>;
    async fn load_thresholds(&self) -> Result<Vec<SlaThreshold>, StoreError>;
    async fn save_threshold(&self, threshold: &SlaThreshold) -> Result<(), StoreError>;
    async fn load_exemptions(&self) -> Result<Vec<Exemption>, StoreError>;
    async fn save_exemption(&self, exemption: &Exemption) -> Result<(), StoreError>;
    async fn save_report(&self, report: &ComplianceReport) -> Result<(), StoreError>;
}

/// In-memory metrics store keyed by series
#[derive(Debug, Default)]
pub struct InMemoryMetricsStore {
    series: DashMap<String, Vec<(DateTime<Utc>, f64)>>,
}

impl InMemoryMetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation to a series
    pub fn push(&self, kind: &MetricKind, ts: DateTime<Utc>, value: f64) {
        self.series
            .entry(kind.series_key())
            .or_default()
            .push((ts, value));
    }

    /// Append many observations stamped "now"
    pub fn push_now(&self, kind: &MetricKind, values: &[f64]) {
        let now = Utc::now();
        for v in values {
            self.push(kind, now, *v);
        }
    }

    pub fn clear(&self) {
        self.series.clear();
    }
}

#[async_trait]
impl MetricsStore for InMemoryMetricsStore {
    async fn query(&self, kind: &MetricKind, range: &TimeRange) -> Result<Vec<f64>, StoreError> {
        Ok(self
            .series
            .get(&kind.series_key())
            .map(|points| {
                points
                    .iter()
                    .filter(|(ts, _)| range.contains(*ts))
                    .map(|(_, v)| *v)
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// A metrics store that always fails; exercises the isolation contract
#[derive(Debug, Default)]
pub struct FailingMetricsStore;

#[async_trait]
impl MetricsStore for FailingMetricsStore {
    async fn query(&self, kind: &MetricKind, _range: &TimeRange) -> Result<Vec<f64>, StoreError> {
        Err(StoreError::Unavailable(format!(
            "no backend for {}",
            kind.series_key()
        )))
    }
}

/// In-memory repository; definitions and thresholds survive engine restarts
/// within one process
#[derive(Debug, Default)]
pub struct InMemorySlaRepository {
    definitions: Mutex<Vec<SlaDefinition>>,
    thresholds: Mutex<Vec<SlaThreshold>>,
    exemptions: Mutex<Vec<Exemption>>,
    reports: Mutex<Vec<ComplianceReport>>,
}

impl InMemorySlaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ComplianceReport> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl SlaRepository for InMemorySlaRepository {
    async fn load_definitions(&self) -> Result<Vec<SlaDefinition>, StoreError> {
        Ok(self.definitions.lock().clone())
    }

    async fn save_definition(&self, definition: &SlaDefinition) -> Result<(), StoreError> {
        let mut definitions = self.definitions.lock();
        if let Some(existing) = definitions.iter_mut().find(|d| d.id == definition.id) {
            *existing = definition.clone();
        } else {
            definitions.push(definition.clone());
        }
        Ok(())
    }

    async fn load_thresholds(&self) -> Result<Vec<SlaThreshold>, StoreError> {
        Ok(self.thresholds.lock().clone())
    }

    async fn save_threshold(&self, threshold: &SlaThreshold) -> Result<(), StoreError> {
        let mut thresholds = self.thresholds.lock();
        if let Some(existing) = thresholds.iter_mut().find(|t| t.id == threshold.id) {
            *existing = threshold.clone();
        } else {
            thresholds.push(threshold.clone());
        }
        Ok(())
    }

    async fn load_exemptions(&self) -> Result<Vec<Exemption>, StoreError> {
        Ok(self.exemptions.lock().clone())
    }

    async fn save_exemption(&self, exemption: &Exemption) -> Result<(), StoreError> {
        self.exemptions.lock().push(exemption.clone());
        Ok(())
    }

    async fn save_report(&self, report: &ComplianceReport) -> Result<(), StoreError> {
        self.reports.lock().push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_window_filtering() {
        let store = InMemoryMetricsStore::new();
        let now = Utc::now();
        let kind = MetricKind::ResponseTime;

        store.push(&kind, now - chrono::Duration::minutes(10), 100.0);
        store.push(&kind, now - chrono::Duration::minutes(2), 200.0);
        store.push(&kind, now - chrono::Duration::minutes(1), 300.0);

        let range = TimeRange::ending_at(now, chrono::Duration::minutes(5));
        let values = store.query(&kind, &range).await.unwrap();
        assert_eq!(values, vec![200.0, 300.0]);
    }

    #[tokio::test]
    async fn test_unknown_series_is_empty_not_error() {
        let store = InMemoryMetricsStore::new();
        let range = TimeRange::ending_at(Utc::now(), chrono::Duration::minutes(5));
        let values = store
            .query(&MetricKind::Availability, &range)
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_failing_store_errors() {
        let store = FailingMetricsStore;
        let range = TimeRange::ending_at(Utc::now(), chrono::Duration::minutes(5));
        assert!(store.query(&MetricKind::ErrorRate, &range).await.is_err());
    }

    #[tokio::test]
    async fn test_repository_upsert_semantics() {
        let repo = InMemorySlaRepository::new();
        let mut sla = SlaDefinition::standard_tier();
        repo.save_definition(&sla).await.unwrap();

        sla.description = "updated".to_string();
        repo.save_definition(&sla).await.unwrap();

        let loaded = repo.load_definitions().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].description, "updated");
    }
}
