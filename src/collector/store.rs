//! Bounded per-category sample buffers
//!
//! Each instrumentation channel writes into its own category key. A category
//! retains at most `max_per_category` samples; inserting beyond that drops
//! the oldest entries first. Insertion order is preserved for the retained
//! tail. Buffers are session-scoped and never persisted.

use pulse_common::MetricSample;
use std::collections::{HashMap, VecDeque};

/// Category key for Core Web Vital samples
pub const CATEGORY_VITALS: &str = "core-web-vitals";
/// Category key for booking funnel progression samples
pub const CATEGORY_FUNNEL: &str = "booking-funnel";
/// Category key for backend API resource timings
pub const CATEGORY_API: &str = "api-performance";
/// Category key for general resource timings
pub const CATEGORY_RESOURCES: &str = "resource-timing";
/// Category key for payment-call latency samples
pub const CATEGORY_PAYMENT: &str = "payment";
/// Category key for interaction delay samples
pub const CATEGORY_INTERACTIONS: &str = "interactions";
/// Category key for manual tracking calls
pub const CATEGORY_CUSTOM: &str = "custom";
/// Category key for session lifecycle samples
pub const CATEGORY_SESSION: &str = "session";

/// FIFO-evicting sample store keyed by category
#[derive(Debug)]
pub struct BoundedMetricStore {
    max_per_category: usize,
    buffers: HashMap<String, VecDeque<MetricSample>>,
}

impl BoundedMetricStore {
    pub fn new(max_per_category: usize) -> Self {
        Self {
            max_per_category,
            buffers: HashMap::new(),
        }
    }

    /// Append a sample, evicting the oldest entry when the category is full
    pub fn insert(&mut self, category: &str, sample: MetricSample) {
        let buffer = self
            .buffers
            .entry(category.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.max_per_category));

        buffer.push_back(sample);
        while buffer.len() > self.max_per_category {
            buffer.pop_front();
        }
    }

    /// Samples currently retained for one category, oldest first
    pub fn category(&self, category: &str) -> Vec<MetricSample> {
        self.buffers
            .get(category)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Most recent sample matching `name` within a category
    pub fn latest_named(&self, category: &str, name: &str) -> Option<&MetricSample> {
        self.buffers
            .get(category)?
            .iter()
            .rev()
            .find(|s| s.name == name)
    }

    /// Full snapshot of all categories, oldest first per category
    pub fn snapshot(&self) -> HashMap<String, Vec<MetricSample>> {
        self.buffers
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect()
    }

    /// Total retained samples across all categories
    pub fn len(&self) -> usize {
        self.buffers.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every buffer
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_common::{DeviceClass, DeviceInfo, MetricUnit, NetworkInfo, PageType};

    fn sample(name: &str, value: f64) -> MetricSample {
        MetricSample {
            name: name.to_string(),
            value,
            unit: MetricUnit::Milliseconds,
            timestamp: Utc::now(),
            session_id: "test-session".to_string(),
            page_type: PageType::Booking,
            device: DeviceInfo {
                class: DeviceClass::Desktop,
                os: "linux".to_string(),
                viewport_width: 1920,
            },
            network: NetworkInfo::unavailable(),
            journey_steps: vec![],
        }
    }

    #[test]
    fn test_insert_and_snapshot() {
        let mut store = BoundedMetricStore::new(100);
        store.insert(CATEGORY_VITALS, sample("LCP", 1200.0));
        store.insert(CATEGORY_VITALS, sample("FID", 30.0));

        let snapshot = store.snapshot();
        assert_eq!(snapshot[CATEGORY_VITALS].len(), 2);
        assert_eq!(snapshot[CATEGORY_VITALS][0].name, "LCP");
    }

    #[test]
    fn test_fifo_eviction_keeps_last_100_in_order() {
        let mut store = BoundedMetricStore::new(100);
        for i in 0..250 {
            store.insert(CATEGORY_VITALS, sample("LCP", i as f64));
        }

        let retained = store.category(CATEGORY_VITALS);
        assert_eq!(retained.len(), 100);
        // The retained tail is exactly the last 100 inserted, original order.
        for (offset, s) in retained.iter().enumerate() {
            assert_eq!(s.value, (150 + offset) as f64);
        }
    }

    #[test]
    fn test_latest_named() {
        let mut store = BoundedMetricStore::new(100);
        store.insert(CATEGORY_VITALS, sample("LCP", 1000.0));
        store.insert(CATEGORY_VITALS, sample("FID", 25.0));
        store.insert(CATEGORY_VITALS, sample("LCP", 1800.0));

        let latest = store.latest_named(CATEGORY_VITALS, "LCP").unwrap();
        assert_eq!(latest.value, 1800.0);
    }

    #[test]
    fn test_clear() {
        let mut store = BoundedMetricStore::new(100);
        store.insert(CATEGORY_CUSTOM, sample("event", 1.0));
        assert!(!store.is_empty());

        store.clear();
        assert!(store.is_empty());
        assert!(store.category(CATEGORY_CUSTOM).is_empty());
    }
}
