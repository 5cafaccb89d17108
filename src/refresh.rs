//! Background snapshot refresh
//!
//! Periodically reloads the gazetteer so newly approved aliases become
//! matchable without a restart. A failed refresh is logged and the previous
//! snapshot keeps serving.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::engine::ResolutionEngine;

/// Refresh `engine` every `period` until the task is aborted
///
/// The first refresh happens one full period after the call; the initial
/// load is the caller's job (see `StartupMode`). A zero period returns
/// immediately.
pub async fn run_refresh_loop(engine: Arc<ResolutionEngine>, period: Duration) {
    if period.is_zero() {
        tracing::info!("Background refresh disabled");
        return;
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    ticker.tick().await;

    tracing::info!(interval_secs = period.as_secs(), "Background refresh started");

    loop {
        ticker.tick().await;

        match engine.refresh().await {
            Ok(stats) => {
                tracing::debug!(snapshot_version = stats.version, "Background refresh complete");
            }
            Err(e) => {
                // Already logged by the engine with store details
                tracing::debug!(error = %e, "Background refresh failed");
            }
        }
    }
}

/// Spawn `run_refresh_loop` on the runtime
pub fn spawn_refresh_loop(engine: Arc<ResolutionEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(run_refresh_loop(engine, period))
}
