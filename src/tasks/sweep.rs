//! Expired-Entry Sweep Task
//!
//! Background task that periodically removes expired cache entries. Lazy
//! expiry on read remains authoritative for correctness; the sweep only
//! bounds the memory held by entries nothing reads anymore.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::fetch::CacheContext;

/// Spawns a background task that sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. The returned JoinHandle can be aborted during shutdown.
pub fn spawn_sweep_task(ctx: &CacheContext, interval_secs: u64) -> JoinHandle<()> {
    let store = ctx.store_handle();
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expired-entry sweep task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.write().await;
                store.sweep_expired()
            };

            if removed > 0 {
                info!("Sweep removed {} expired entries", removed);
            } else {
                debug!("Sweep found no expired entries");
            }
        }
    })
}
