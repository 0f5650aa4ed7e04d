//! Metric evaluation primitives
//!
//! Pure functions shared by the monitoring and reporting ticks: aggregation
//! over raw series (nearest-rank percentiles, no interpolation), the
//! per-kind value semantics of the metrics query boundary, and deviation
//! severity classification.

use crate::sla::definition::{Aggregation, Comparison, MetricKind};
use crate::sla::threshold::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health-check scores at or above this count as healthy
pub const HEALTHY_SCORE: f64 = 80.0;
/// HTTP status codes at or above this count as errors
pub const ERROR_STATUS: f64 = 400.0;

/// Deviation at or above this percentage classifies as breach
pub const BREACH_DEVIATION_PERCENT: f64 = 30.0;
/// Deviation at or above this percentage classifies as critical
pub const CRITICAL_DEVIATION_PERCENT: f64 = 20.0;

/// Nearest-rank percentile over an unsorted series. `None` when empty.
pub fn percentile(values: &[f64], p: u8) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let index = (sorted.len() * p as usize / 100).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Apply the configured aggregation to a raw series
pub fn aggregate(aggregation: Aggregation, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match aggregation {
        Aggregation::Average => Some(values.iter().sum::<f64>() / values.len() as f64),
        Aggregation::Percentile(p) => percentile(values, p),
        Aggregation::Max => values
            .iter()
            .copied()
            .fold(None, |max, v| Some(max.map_or(v, |m| m.max(v)))),
    }
}

/// Availability percent from periodic health-check scores
pub fn availability_percent(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let healthy = scores.iter().filter(|s| **s >= HEALTHY_SCORE).count();
    Some(healthy as f64 / scores.len() as f64 * 100.0)
}

/// Error percent from raw HTTP status codes
pub fn error_rate_percent(status_codes: &[f64]) -> Option<f64> {
    if status_codes.is_empty() {
        return None;
    }
    let errors = status_codes.iter().filter(|c| **c >= ERROR_STATUS).count();
    Some(errors as f64 / status_codes.len() as f64 * 100.0)
}

/// Resolve the current value of a metric from its raw series, applying the
/// per-kind semantics of the query boundary
pub fn current_value(kind: &MetricKind, aggregation: Aggregation, raw: &[f64]) -> Option<f64> {
    match kind {
        MetricKind::Availability => availability_percent(raw),
        MetricKind::ErrorRate => error_rate_percent(raw),
        MetricKind::ResponseTime
        | MetricKind::Performance { .. }
        | MetricKind::Throughput
        | MetricKind::Custom { .. } => aggregate(aggregation, raw),
    }
}

/// Deviation magnitude as a percentage of the target
pub fn deviation_percent(value: f64, target: f64) -> f64 {
    if target == 0.0 {
        return 0.0;
    }
    (value - target).abs() / target.abs() * 100.0
}

/// Classify how far off an out-of-target measurement is
pub fn classify_deviation(deviation: f64) -> Severity {
    if deviation >= BREACH_DEVIATION_PERCENT {
        Severity::Breach
    } else if deviation >= CRITICAL_DEVIATION_PERCENT {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// Outcome of evaluating one metric on one monitoring tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEvaluation {
    pub sla_id: String,
    pub metric_id: String,
    pub metric_name: String,
    pub kind: MetricKind,
    pub value: f64,
    pub target: f64,
    pub comparison: Comparison,
    pub deviation_percent: f64,
    /// `None` when the measurement was in target
    pub severity: Option<Severity>,
    pub evaluated_at: DateTime<Utc>,
}

impl MetricEvaluation {
    pub fn in_target(&self) -> bool {
        self.severity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank_percentile() {
        let values: Vec<f64> = (1..=100).map(|v| v as f64).collect();
        assert_eq!(percentile(&values, 95), Some(96.0));
        assert_eq!(percentile(&values, 50), Some(51.0));
        // p99 of a short series clamps to the last element.
        assert_eq!(percentile(&[10.0, 20.0], 99), Some(20.0));
        assert_eq!(percentile(&[], 95), None);
    }

    #[test]
    fn test_aggregations() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(aggregate(Aggregation::Average, &values), Some(20.0));
        assert_eq!(aggregate(Aggregation::Max, &values), Some(30.0));
        assert_eq!(aggregate(Aggregation::Average, &[]), None);
    }

    #[test]
    fn test_availability_from_health_scores() {
        // 8 healthy (>=80), 2 unhealthy: 80%.
        let scores = [95.0, 90.0, 85.0, 80.0, 88.0, 92.0, 99.0, 81.0, 40.0, 10.0];
        assert_eq!(availability_percent(&scores), Some(80.0));
        assert_eq!(availability_percent(&[]), None);
    }

    #[test]
    fn test_error_rate_from_status_codes() {
        let codes = [200.0, 200.0, 404.0, 500.0, 201.0, 204.0, 301.0, 200.0, 200.0, 200.0];
        assert_eq!(error_rate_percent(&codes), Some(20.0));
    }

    #[test]
    fn test_deviation_classification() {
        // 98 vs 99.9 availability: ~1.9% deviation -> warning.
        let dev = deviation_percent(98.0, 99.9);
        assert!(dev > 1.8 && dev < 2.0);
        assert_eq!(classify_deviation(dev), Severity::Warning);

        assert_eq!(classify_deviation(25.0), Severity::Critical);
        assert_eq!(classify_deviation(30.0), Severity::Breach);
        assert_eq!(classify_deviation(19.9), Severity::Warning);
    }

    #[test]
    fn test_current_value_dispatch() {
        let health = [90.0, 90.0, 50.0, 90.0];
        assert_eq!(
            current_value(&MetricKind::Availability, Aggregation::Average, &health),
            Some(75.0)
        );

        let timings = [100.0, 200.0, 300.0, 400.0];
        assert_eq!(
            current_value(
                &MetricKind::ResponseTime,
                Aggregation::Percentile(50),
                &timings
            ),
            Some(300.0)
        );
        assert_eq!(
            current_value(&MetricKind::Throughput, Aggregation::Max, &timings),
            Some(400.0)
        );
    }

    #[test]
    fn test_zero_target_deviation_is_safe() {
        assert_eq!(deviation_percent(5.0, 0.0), 0.0);
    }
}
