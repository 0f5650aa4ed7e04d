//! Shared metric schema
//!
//! One `MetricSample` is a single immutable observation produced by the
//! telemetry collector. The SLA engine never sees collector internals; it
//! consumes aggregates of these samples through its metrics store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of a recorded metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Milliseconds,
    /// Unitless layout-shift style score
    Score,
    Percent,
    Bytes,
    Count,
}

/// Coarse device classification for contextual dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Desktop,
    Mobile,
    Tablet,
}

/// Device context captured once per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub class: DeviceClass,
    pub os: String,
    pub viewport_width: u32,
}

impl DeviceInfo {
    pub fn is_mobile(&self) -> bool {
        self.class == DeviceClass::Mobile
    }
}

/// Network context; every field is optional-friendly because the Network
/// Information API may be absent on the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Effective connection type as reported by the client ("4g", "3g", ...)
    pub effective_type: Option<String>,
    pub downlink_mbps: Option<f64>,
    pub rtt_ms: Option<f64>,
    pub save_data: bool,
}

impl NetworkInfo {
    /// Context for sessions where the network API is unavailable
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Page classification used as a reporting dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    Services,
    Booking,
    Payment,
    Confirmation,
    Account,
    Other,
}

impl PageType {
    /// Classify a URL path into a page type
    pub fn from_path(path: &str) -> Self {
        if path == "/" || path.is_empty() {
            Self::Home
        } else if path.starts_with("/services") {
            Self::Services
        } else if path.starts_with("/booking") {
            Self::Booking
        } else if path.starts_with("/payment") || path.starts_with("/checkout") {
            Self::Payment
        } else if path.starts_with("/confirmation") {
            Self::Confirmation
        } else if path.starts_with("/account") {
            Self::Account
        } else {
            Self::Other
        }
    }
}

/// One immutable observation recorded by the collector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Metric name, e.g. "LCP" or "funnel_step"
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub page_type: PageType,
    pub device: DeviceInfo,
    pub network: NetworkInfo,
    /// Funnel steps traversed so far, in first-observed order
    pub journey_steps: Vec<String>,
}
