//! Auto-remediation actions
//!
//! Threshold records can attach remediation actions that run when a
//! deviation is detected. Execution is pluggable; the engine only knows the
//! trait. The default executor logs the action and enforces a cooldown so a
//! flapping metric cannot restart a service in a loop.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A side-effecting operation run against the serving infrastructure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemediationAction {
    /// Add replicas, bounded by a ceiling
    ScaleUp { step: u32, max_replicas: u32 },
    /// Remove replicas, bounded by a floor
    ScaleDown { step: u32, min_replicas: u32 },
    /// Restart a named service
    RestartService { service: String },
    /// Shift traffic to a standby region
    Failover { target_region: String },
    /// Drop a named cache
    ClearCache { cache: String },
}

impl RemediationAction {
    /// Stable key for cooldown bookkeeping
    pub fn cooldown_key(&self) -> String {
        match self {
            Self::ScaleUp { .. } => "scale_up".to_string(),
            Self::ScaleDown { .. } => "scale_down".to_string(),
            Self::RestartService { service } => format!("restart:{}", service),
            Self::Failover { target_region } => format!("failover:{}", target_region),
            Self::ClearCache { cache } => format!("clear_cache:{}", cache),
        }
    }
}

/// Executes remediation actions. Implementations talk to the orchestrator,
/// cloud API, or cache layer; the engine treats them as opaque.
#[async_trait]
pub trait RemediationExecutor: Send + Sync {
    async fn execute(
        &self,
        sla_name: &str,
        metric_name: &str,
        action: &RemediationAction,
    ) -> anyhow::Result<()>;
}

/// Default executor: logs the decision and enforces per-action cooldowns,
/// mirroring the production auto-scale controller's cooldown behavior
pub struct LoggingRemediationExecutor {
    cooldown: Duration,
    last_run: DashMap<String, Instant>,
}

impl LoggingRemediationExecutor {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_run: DashMap::new(),
        }
    }

    fn in_cooldown(&self, key: &str) -> bool {
        self.last_run
            .get(key)
            .map(|at| at.elapsed() < self.cooldown)
            .unwrap_or(false)
    }
}

impl Default for LoggingRemediationExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl RemediationExecutor for LoggingRemediationExecutor {
    async fn execute(
        &self,
        sla_name: &str,
        metric_name: &str,
        action: &RemediationAction,
    ) -> anyhow::Result<()> {
        let key = action.cooldown_key();
        if self.in_cooldown(&key) {
            warn!(
                sla = sla_name,
                metric = metric_name,
                action = %key,
                "remediation suppressed by cooldown"
            );
            return Ok(());
        }
        self.last_run.insert(key.clone(), Instant::now());
        info!(
            sla = sla_name,
            metric = metric_name,
            action = %key,
            detail = ?action,
            "remediation executed"
        );
        Ok(())
    }
}
