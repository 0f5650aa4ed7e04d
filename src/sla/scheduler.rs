//! Explicit tick scheduling
//!
//! The engine's monitoring and reporting loops run as spawned tasks driven
//! by a tokio interval. Each loop awaits the full tick body before asking
//! for the next tick, so tick N+1 can never start while tick N is still
//! running; a slow tick delays the next one instead of overlapping it.
//! Tick errors are logged and the loop keeps going.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Spawn a sequential tick loop. The returned handle aborts the loop.
pub fn spawn_tick_loop<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // A tick that overruns its period must not burst-fire afterwards.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Consume the immediate first tick so the loop waits a full period
        // before the first run.
        interval.tick().await;

        loop {
            interval.tick().await;
            debug!(loop_name = name, "tick started");
            if let Err(e) = tick().await {
                error!(loop_name = name, error = %e, "tick failed");
            }
        }
    })
}
