//! Core Web Vital catalog and budget evaluation
//!
//! Budgets are checked synchronously after every sample; a value over budget
//! reports a warning, over 1.5x budget a critical. Ratings follow the
//! standard good / needs-improvement / poor bands.

use crate::config::VitalBudgets;
use pulse_common::MetricUnit;
use serde::{Deserialize, Serialize};

/// Standard page-load and interaction timing signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebVital {
    /// Largest Contentful Paint
    Lcp,
    /// First Input Delay
    Fid,
    /// Cumulative Layout Shift
    Cls,
    /// Time To First Byte
    Ttfb,
    /// First Contentful Paint
    Fcp,
}

impl WebVital {
    pub const ALL: [WebVital; 5] = [
        WebVital::Lcp,
        WebVital::Fid,
        WebVital::Cls,
        WebVital::Ttfb,
        WebVital::Fcp,
    ];

    /// Canonical metric name used in samples and summaries
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::Lcp => "LCP",
            Self::Fid => "FID",
            Self::Cls => "CLS",
            Self::Ttfb => "TTFB",
            Self::Fcp => "FCP",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            Self::Cls => MetricUnit::Score,
            _ => MetricUnit::Milliseconds,
        }
    }

    /// Qualitative rating per the standard public thresholds
    pub fn rating(&self, value: f64) -> VitalRating {
        let (good, poor) = match self {
            Self::Lcp => (2500.0, 4000.0),
            Self::Fid => (100.0, 300.0),
            Self::Cls => (0.1, 0.25),
            Self::Ttfb => (800.0, 1800.0),
            Self::Fcp => (1800.0, 3000.0),
        };
        if value <= good {
            VitalRating::Good
        } else if value <= poor {
            VitalRating::NeedsImprovement
        } else {
            VitalRating::Poor
        }
    }
}

/// Qualitative vital rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

/// Severity of a budget violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Warning,
    Critical,
}

impl VitalBudgets {
    /// Budget for one vital
    pub fn budget_for(&self, vital: WebVital) -> f64 {
        match vital {
            WebVital::Lcp => self.lcp_ms,
            WebVital::Fid => self.fid_ms,
            WebVital::Cls => self.cls,
            WebVital::Ttfb => self.ttfb_ms,
            WebVital::Fcp => self.fcp_ms,
        }
    }
}

/// Classify a vital observation against its budget. `None` means in budget.
pub fn classify_against_budget(value: f64, budget: f64) -> Option<ViolationSeverity> {
    if value > budget * 1.5 {
        Some(ViolationSeverity::Critical)
    } else if value > budget {
        Some(ViolationSeverity::Warning)
    } else {
        None
    }
}
