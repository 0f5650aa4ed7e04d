//! SLA contract model
//!
//! A definition is a named, versioned contract: a set of weighted metrics
//! with targets and applicability conditions, a penalty policy, a reporting
//! policy, and exemptions. Lifecycle moves strictly forward:
//! draft -> active -> deprecated -> archived. Only active definitions are
//! monitored.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle status of an SLA definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaLifecycle {
    Draft,
    Active,
    Deprecated,
    Archived,
}

impl SlaLifecycle {
    fn rank(self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::Active => 1,
            Self::Deprecated => 2,
            Self::Archived => 3,
        }
    }

    /// Transitions are strictly forward-only
    pub fn can_transition_to(self, next: SlaLifecycle) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Comparison direction for a metric target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Measured value must stay at or above target (availability)
    Gte,
    /// Measured value must stay at or below target (latency, error rate)
    Lte,
    /// Measured value must equal target
    Eq,
}

impl Comparison {
    /// Whether a measured value satisfies the target
    pub fn in_target(self, value: f64, target: f64) -> bool {
        match self {
            Self::Gte => value >= target,
            Self::Lte => value <= target,
            Self::Eq => (value - target).abs() < f64::EPSILON,
        }
    }
}

/// What a metric measures. The payload carries only what that kind needs,
/// so evaluation can match exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of healthy periodic health checks
    Availability,
    /// Server response latency
    ResponseTime,
    /// Fraction of HTTP responses with status >= 400
    ErrorRate,
    /// Client-side performance signal (e.g. "LCP")
    Performance { vital: String },
    /// Requests per interval
    Throughput,
    /// Operator-defined series
    Custom { key: String },
}

impl MetricKind {
    /// Series key used when querying the aggregated metrics store
    pub fn series_key(&self) -> String {
        match self {
            Self::Availability => "availability".to_string(),
            Self::ResponseTime => "response_time".to_string(),
            Self::ErrorRate => "error_rate".to_string(),
            Self::Performance { vital } => format!("performance:{}", vital.to_ascii_lowercase()),
            Self::Throughput => "throughput".to_string(),
            Self::Custom { key } => format!("custom:{}", key),
        }
    }
}

/// Aggregation applied to the raw series fetched for a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Average,
    /// Nearest-rank percentile, p in [1, 99]
    Percentile(u8),
    Max,
}

/// How a metric is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementMethod {
    Continuous,
    Periodic,
    Sampling,
}

/// Measurement cadence and rolling window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub method: MeasurementMethod,
    pub interval: Duration,
    /// Rolling window queried on each evaluation
    pub window: Duration,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            method: MeasurementMethod::Continuous,
            interval: Duration::from_secs(60),
            window: Duration::from_secs(300),
        }
    }
}

/// Business-hours applicability window. Carries an explicit UTC offset;
/// the operator accounts for DST when configuring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub days: Vec<Weekday>,
    /// Minutes from local midnight, inclusive
    pub start_minute: u32,
    /// Minutes from local midnight, exclusive
    pub end_minute: u32,
    pub utc_offset_minutes: i32,
}

impl BusinessHours {
    /// Mon-Fri 09:00-17:00 at the given UTC offset
    pub fn weekdays_nine_to_five(utc_offset_minutes: i32) -> Self {
        Self {
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            start_minute: 9 * 60,
            end_minute: 17 * 60,
            utc_offset_minutes,
        }
    }

    /// Whether a wall-clock instant falls inside the window
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let offset = match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(o) => o,
            None => return false,
        };
        let local = ts.with_timezone(&offset);
        if !self.days.contains(&local.weekday()) {
            return false;
        }
        let minute_of_day = local.hour() * 60 + local.minute();
        minute_of_day >= self.start_minute && minute_of_day < self.end_minute
    }
}

/// Planned maintenance exclusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl MaintenanceWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.starts_at && ts < self.ends_at
    }
}

/// One measurable target within an SLA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaMetric {
    pub id: String,
    pub name: String,
    pub kind: MetricKind,
    pub target: f64,
    pub comparison: Comparison,
    pub measurement: Measurement,
    pub aggregation: Aggregation,
    pub business_hours: Option<BusinessHours>,
    pub maintenance: Vec<MaintenanceWindow>,
    /// Relative weight in the SLA's overall compliance score
    pub weight: f64,
    /// A breach of a critical metric marks the whole SLA breached
    pub critical: bool,
}

impl SlaMetric {
    pub fn new(
        name: &str,
        kind: MetricKind,
        target: f64,
        comparison: Comparison,
        aggregation: Aggregation,
        weight: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            target,
            comparison,
            measurement: Measurement::default(),
            aggregation,
            business_hours: None,
            maintenance: Vec::new(),
            weight,
            critical: false,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    pub fn with_business_hours(mut self, hours: BusinessHours) -> Self {
        self.business_hours = Some(hours);
        self
    }
}

/// Penalty policy; credits accumulate per breach up to a cap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyPolicy {
    pub credit_percent_per_breach: f64,
    pub credit_cap_percent: f64,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            credit_percent_per_breach: 10.0,
            credit_cap_percent: 30.0,
        }
    }
}

/// Reporting cadence for compliance reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl ReportingFrequency {
    /// Fixed look-back window ending "now"
    pub fn lookback(&self) -> chrono::Duration {
        match self {
            Self::Daily => chrono::Duration::days(1),
            Self::Weekly => chrono::Duration::days(7),
            Self::Monthly => chrono::Duration::days(30),
            Self::Quarterly => chrono::Duration::days(90),
        }
    }

    /// Minimum interval between two reports of this frequency
    pub fn interval(&self) -> chrono::Duration {
        self.lookback()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

/// Where and how often compliance reports go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingPolicy {
    pub frequency: ReportingFrequency,
    pub recipients: Vec<String>,
}

impl Default for ReportingPolicy {
    fn default() -> Self {
        Self {
            frequency: ReportingFrequency::Daily,
            recipients: Vec::new(),
        }
    }
}

/// Suspends evaluation for matching metric kinds while active. History is
/// untouched; only evaluation is suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemption {
    pub id: String,
    pub name: String,
    pub reason: String,
    /// Empty list matches every metric kind
    pub metric_kinds: Vec<MetricKind>,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Exemption {
    pub fn new(
        name: &str,
        reason: &str,
        metric_kinds: Vec<MetricKind>,
        starts_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            reason: reason.to_string(),
            metric_kinds,
            starts_at,
            expires_at,
        }
    }

    pub fn is_active_at(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.starts_at && ts < self.expires_at
    }

    /// Whether this exemption suppresses evaluation of `kind` at `ts`
    pub fn matches(&self, kind: &MetricKind, ts: DateTime<Utc>) -> bool {
        self.is_active_at(ts)
            && (self.metric_kinds.is_empty() || self.metric_kinds.contains(kind))
    }
}

/// A named, versioned SLA contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaDefinition {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub description: String,
    pub status: SlaLifecycle,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub customer_segment: String,
    pub service_tier: String,
    pub metrics: Vec<SlaMetric>,
    pub penalties: PenaltyPolicy,
    pub reporting: ReportingPolicy,
    pub exemptions: Vec<Exemption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlaDefinition {
    pub fn new(name: &str, service_tier: &str, metrics: Vec<SlaMetric>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            version: 1,
            description: String::new(),
            status: SlaLifecycle::Draft,
            valid_from: now,
            valid_until: None,
            customer_segment: "all".to_string(),
            service_tier: service_tier.to_string(),
            metrics,
            penalties: PenaltyPolicy::default(),
            reporting: ReportingPolicy::default(),
            exemptions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Seeded default: standard tier targets. Weights sum to 100.
    pub fn standard_tier() -> Self {
        let metrics = vec![
            SlaMetric::new(
                "availability",
                MetricKind::Availability,
                99.9,
                Comparison::Gte,
                Aggregation::Average,
                40.0,
            )
            .critical(),
            SlaMetric::new(
                "p95_response_time_ms",
                MetricKind::ResponseTime,
                1000.0,
                Comparison::Lte,
                Aggregation::Percentile(95),
                25.0,
            ),
            SlaMetric::new(
                "error_rate_percent",
                MetricKind::ErrorRate,
                1.0,
                Comparison::Lte,
                Aggregation::Average,
                20.0,
            ),
            SlaMetric::new(
                "p75_lcp_ms",
                MetricKind::Performance {
                    vital: "LCP".to_string(),
                },
                2500.0,
                Comparison::Lte,
                Aggregation::Percentile(75),
                15.0,
            ),
        ];
        let mut sla = Self::new("Standard Performance SLA", "standard", metrics);
        sla.description = "Baseline availability and latency commitments".to_string();
        sla.status = SlaLifecycle::Active;
        sla
    }

    /// Seeded default: premium tier with stricter targets
    pub fn premium_tier() -> Self {
        let metrics = vec![
            SlaMetric::new(
                "availability",
                MetricKind::Availability,
                99.99,
                Comparison::Gte,
                Aggregation::Average,
                40.0,
            )
            .critical(),
            SlaMetric::new(
                "p95_response_time_ms",
                MetricKind::ResponseTime,
                500.0,
                Comparison::Lte,
                Aggregation::Percentile(95),
                25.0,
            )
            .critical(),
            SlaMetric::new(
                "error_rate_percent",
                MetricKind::ErrorRate,
                0.5,
                Comparison::Lte,
                Aggregation::Average,
                20.0,
            ),
            SlaMetric::new(
                "p75_lcp_ms",
                MetricKind::Performance {
                    vital: "LCP".to_string(),
                },
                1800.0,
                Comparison::Lte,
                Aggregation::Percentile(75),
                15.0,
            ),
        ];
        let mut sla = Self::new("Premium Performance SLA", "premium", metrics);
        sla.description = "Strict commitments for premium customers".to_string();
        sla.status = SlaLifecycle::Active;
        sla
    }

    /// Administrative status update; returns false for a non-forward move
    pub fn transition_to(&mut self, next: SlaLifecycle) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }

    pub fn metric(&self, metric_id: &str) -> Option<&SlaMetric> {
        self.metrics.iter().find(|m| m.id == metric_id)
    }

    pub fn total_weight(&self) -> f64 {
        self.metrics.iter().map(|m| m.weight).sum()
    }
}
