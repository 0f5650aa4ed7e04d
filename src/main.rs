//! Pulse - monitoring service entry point
//!
//! Runs the SLA compliance engine as a long-lived process. The default
//! wiring uses in-memory collaborators so the service is runnable anywhere;
//! production deployments swap the store and repository behind the same
//! traits.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use pulse_core::config::PulseConfig;
use pulse_core::sla::{
    InMemoryMetricsStore, InMemorySlaRepository, LoggingRemediationExecutor, Notifier,
    SlaComplianceEngine, TracingAlertSink,
};

#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Real-user monitoring and SLA compliance engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    debug: bool,

    /// Configuration file path (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the compliance engine until interrupted
    Serve {
        /// Monitoring tick interval in seconds
        #[arg(long, default_value = "60")]
        monitoring_interval: u64,

        /// Reporting tick interval in seconds
        #[arg(long, default_value = "3600")]
        reporting_interval: u64,
    },
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "pulse_core=debug" } else { "pulse_core=info" };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| filter.into()))
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            PulseConfig::from_json(&raw)?
        }
        None => PulseConfig::default(),
    };

    match cli.command {
        Commands::Serve {
            monitoring_interval,
            reporting_interval,
        } => {
            config.engine.monitoring_interval = Duration::from_secs(monitoring_interval);
            config.engine.reporting_interval = Duration::from_secs(reporting_interval);

            let notifier = Arc::new(Notifier::new(
                config.notifications.webhook_timeout,
                config.notifications.alert_cooldown,
            ));
            let engine = SlaComplianceEngine::new(
                config.engine.clone(),
                Arc::new(InMemoryMetricsStore::new()),
                Arc::new(InMemorySlaRepository::new()),
                Arc::new(TracingAlertSink),
                notifier,
                Arc::new(LoggingRemediationExecutor::default()),
            );

            engine.initialize().await?;
            info!("compliance engine running, ctrl-c to stop");

            tokio::signal::ctrl_c().await?;
            engine.destroy();
            info!("shutdown complete");
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
