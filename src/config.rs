use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for the Pulse monitoring core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Client telemetry collector configuration
    pub collector: CollectorConfig,

    /// SLA compliance engine configuration
    pub engine: EngineConfig,

    /// Notification dispatch configuration
    pub notifications: NotificationConfig,
}

impl PulseConfig {
    /// Parse configuration from a JSON document
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Deployment environment, controls the sampling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Production,
    Staging,
    Development,
}

/// Collector-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Fraction of sessions instrumented, in [0, 1]
    pub sample_rate: f64,

    /// Maximum retained samples per category key
    pub max_entries_per_category: usize,

    /// Inactivity duration after which a booking session counts as abandoned
    pub abandonment_threshold: Duration,

    /// Interaction delays below this are noise and not recorded (ms)
    pub interaction_delay_min_ms: f64,

    /// Per-vital performance budgets
    pub budgets: VitalBudgets,

    /// Ordered booking funnel steps, matched by path prefix
    pub funnel_steps: Vec<FunnelStepConfig>,

    /// Backend API path prefixes for resource classification
    pub api_prefixes: Vec<String>,

    /// URL fragments identifying the payment processor
    pub payment_url_patterns: Vec<String>,

    /// URL fragments identifying analytics services
    pub analytics_url_patterns: Vec<String>,

    /// URL fragments identifying font services
    pub font_url_patterns: Vec<String>,

    /// Per-channel enablement
    pub channels: ChannelToggles,
}

impl CollectorConfig {
    /// Environment-appropriate sampling: keep production volume low, sample
    /// everything elsewhere
    pub fn for_environment(env: Environment) -> Self {
        let sample_rate = match env {
            Environment::Production => 0.1,
            Environment::Staging | Environment::Development => 1.0,
        };
        Self {
            sample_rate,
            ..Self::default()
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            max_entries_per_category: 100,
            abandonment_threshold: Duration::from_secs(5 * 60),
            interaction_delay_min_ms: 100.0,
            budgets: VitalBudgets::default(),
            funnel_steps: vec![
                FunnelStepConfig::new("service_selection", "/booking/step1"),
                FunnelStepConfig::new("time_selection", "/booking/step2"),
                FunnelStepConfig::new("details", "/booking/step3"),
                FunnelStepConfig::new("payment", "/booking/step4"),
                FunnelStepConfig::new("confirmation", "/booking/confirmation"),
            ],
            api_prefixes: vec!["/api/".to_string(), "/rest/v1/".to_string()],
            payment_url_patterns: vec![
                "stripe.com".to_string(),
                "/api/payments".to_string(),
                "/api/checkout".to_string(),
            ],
            analytics_url_patterns: vec![
                "google-analytics.com".to_string(),
                "googletagmanager.com".to_string(),
            ],
            font_url_patterns: vec![
                "fonts.googleapis.com".to_string(),
                "fonts.gstatic.com".to_string(),
            ],
            channels: ChannelToggles::default(),
        }
    }
}

/// One booking funnel step matched against URL paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelStepConfig {
    pub step: String,
    pub path_prefix: String,
}

impl FunnelStepConfig {
    pub fn new(step: &str, path_prefix: &str) -> Self {
        Self {
            step: step.to_string(),
            path_prefix: path_prefix.to_string(),
        }
    }
}

/// Instrumentation channel enablement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelToggles {
    pub vitals: bool,
    pub resources: bool,
    pub funnel: bool,
    pub abandonment: bool,
    pub payment: bool,
    pub interaction: bool,
    pub touch: bool,
}

impl Default for ChannelToggles {
    fn default() -> Self {
        Self {
            vitals: true,
            resources: true,
            funnel: true,
            abandonment: true,
            payment: true,
            interaction: true,
            touch: true,
        }
    }
}

/// Performance budgets per Core Web Vital, tuned for a premium low-latency
/// experience (tighter than the public "good" thresholds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalBudgets {
    pub lcp_ms: f64,
    pub fid_ms: f64,
    pub cls: f64,
    pub ttfb_ms: f64,
    pub fcp_ms: f64,
}

impl Default for VitalBudgets {
    fn default() -> Self {
        Self {
            lcp_ms: 2000.0,
            fid_ms: 75.0,
            cls: 0.08,
            ttfb_ms: 500.0,
            fcp_ms: 1500.0,
        }
    }
}

/// SLA engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Monitoring tick interval
    pub monitoring_interval: Duration,

    /// Reporting tick interval; individual SLAs are further gated by their
    /// own reporting frequency
    pub reporting_interval: Duration,

    /// Retained evaluations per SLA for incident derivation
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monitoring_interval: Duration::from_secs(60),
            reporting_interval: Duration::from_secs(3600),
            history_limit: 1000,
        }
    }
}

/// Notification dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook POST timeout
    pub webhook_timeout: Duration,

    /// Minimum time between identical (SLA, metric, severity) notifications
    pub alert_cooldown: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_timeout: Duration::from_secs(10),
            alert_cooldown: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PulseConfig::default();
        assert_eq!(config.collector.max_entries_per_category, 100);
        assert_eq!(config.collector.funnel_steps.len(), 5);
        assert_eq!(config.engine.monitoring_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_environment_sampling() {
        let prod = CollectorConfig::for_environment(Environment::Production);
        assert!(prod.sample_rate < 1.0);

        let dev = CollectorConfig::for_environment(Environment::Development);
        assert_eq!(dev.sample_rate, 1.0);
    }

    #[test]
    fn test_config_round_trip() {
        let config = PulseConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = PulseConfig::from_json(&json).unwrap();
        assert_eq!(
            parsed.collector.max_entries_per_category,
            config.collector.max_entries_per_category
        );
    }
}
