//! # Pulse Core - Real-User Monitoring and SLA Compliance
//!
//! The monitoring core of the booking platform:
//! - Session-sampled client telemetry: Core Web Vitals, resource timing,
//!   booking-funnel progression, abandonment, payment latency
//! - Synchronous performance-budget checks with warning/critical reporting
//! - Server-side SLA definitions with weighted metrics and penalty policies
//! - Threshold evaluation with exemptions and business-hours gating
//! - Webhook/email notification, structured alerting, auto-remediation
//! - Weighted compliance reporting on per-SLA frequencies
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  RumCollector   │────▶│  Analytics /    │────▶│ Aggregated      │
//! │  (per session)  │     │  Violation sink │     │ metrics store   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//!                                                          │
//!                                                          ▼
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  Notifier /     │◀────│ SlaCompliance   │◀────│  MetricsStore   │
//! │  AlertSink      │     │ Engine (ticks)  │     │  (query seam)   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! The collector and the engine never call each other; they are coupled
//! only through the shared metric schema in `pulse-common`.

pub mod collector;
pub mod config;
pub mod sla;

pub use collector::RumCollector;
pub use config::PulseConfig;
pub use sla::SlaComplianceEngine;

use anyhow::Result;

/// Initialize logging for the monitoring core
pub fn initialize() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "pulse_core=info".into()),
        )
        .init();

    tracing::info!("Pulse core initialized");
    Ok(())
}
