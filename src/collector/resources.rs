//! Resource timing classification
//!
//! Observed resource loads are bucketed by URL pattern: image assets,
//! backend API calls, the payment processor, analytics, fonts. Unmatched
//! resources still get a generic timing record.

use crate::config::CollectorConfig;
use serde::{Deserialize, Serialize};

/// Classified resource bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Image,
    Api,
    Payment,
    Analytics,
    Font,
    Other,
}

impl ResourceClass {
    /// Metric name recorded for this bucket
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::Image => "image_load",
            Self::Api => "api_call",
            Self::Payment => "payment_service",
            Self::Analytics => "analytics_service",
            Self::Font => "font_load",
            Self::Other => "resource_load",
        }
    }
}

const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".webp", ".avif", ".svg"];

/// Classify a resource URL using the configured patterns
pub fn classify_resource(config: &CollectorConfig, url: &str) -> ResourceClass {
    let lowered = url.to_ascii_lowercase();
    let path = lowered.split('?').next().unwrap_or(&lowered);

    if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return ResourceClass::Image;
    }
    if config
        .payment_url_patterns
        .iter()
        .any(|p| lowered.contains(&p.to_ascii_lowercase()))
    {
        return ResourceClass::Payment;
    }
    if config
        .analytics_url_patterns
        .iter()
        .any(|p| lowered.contains(&p.to_ascii_lowercase()))
    {
        return ResourceClass::Analytics;
    }
    if config
        .font_url_patterns
        .iter()
        .any(|p| lowered.contains(&p.to_ascii_lowercase()))
    {
        return ResourceClass::Font;
    }
    if config
        .api_prefixes
        .iter()
        .any(|p| lowered.contains(&p.to_ascii_lowercase()))
    {
        return ResourceClass::Api;
    }
    ResourceClass::Other
}

/// Whether a URL targets the payment processor (used by the instrumented
/// HTTP client independently of resource timing)
pub fn is_payment_url(config: &CollectorConfig, url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    config
        .payment_url_patterns
        .iter()
        .any(|p| lowered.contains(&p.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_classification() {
        let config = CollectorConfig::default();
        assert_eq!(
            classify_resource(&config, "https://cdn.example.com/hero.webp"),
            ResourceClass::Image
        );
        assert_eq!(
            classify_resource(&config, "https://cdn.example.com/logo.svg?v=3"),
            ResourceClass::Image
        );
    }

    #[test]
    fn test_api_classification() {
        let config = CollectorConfig::default();
        assert_eq!(
            classify_resource(&config, "https://app.example.com/api/bookings/42"),
            ResourceClass::Api
        );
    }

    #[test]
    fn test_payment_wins_over_api() {
        let config = CollectorConfig::default();
        // Payment patterns are checked before generic API prefixes.
        assert_eq!(
            classify_resource(&config, "https://app.example.com/api/payments/intent"),
            ResourceClass::Payment
        );
        assert!(is_payment_url(
            &config,
            "https://js.stripe.com/v3/checkout.js"
        ));
    }

    #[test]
    fn test_known_services() {
        let config = CollectorConfig::default();
        assert_eq!(
            classify_resource(&config, "https://www.google-analytics.com/collect"),
            ResourceClass::Analytics
        );
        assert_eq!(
            classify_resource(&config, "https://fonts.gstatic.com/s/inter.woff2"),
            ResourceClass::Font
        );
    }

    #[test]
    fn test_unmatched_resource() {
        let config = CollectorConfig::default();
        assert_eq!(
            classify_resource(&config, "https://cdn.example.com/app.js"),
            ResourceClass::Other
        );
        assert!(!is_payment_url(&config, "https://cdn.example.com/app.js"));
    }
}
