//! Expiry Reconciler
//!
//! Background task that periodically deletes rows whose TTL has lapsed.
//! Reads already refuse expired rows on their own; the sweep only reclaims
//! the space.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::current_timestamp;
use crate::storage::{EntryStore, StoreError};

/// Deletes every row with `expires_at <= now` and returns how many went.
pub async fn sweep_expired(store: &EntryStore, now: i64) -> Result<u64, StoreError> {
    let removed = store.delete_expired(now).await?;

    if removed > 0 {
        info!(removed, "expiry sweep removed expired entries");
    } else {
        debug!("expiry sweep found nothing to remove");
    }

    Ok(removed)
}

/// Spawns the reconciler loop.
///
/// The first sweep runs one `period` after start. A failed sweep is logged
/// and retried on the next tick. The loop exits once `cancel` fires; a sweep
/// already in flight is allowed to finish first.
pub fn spawn_reconciler(
    store: EntryStore,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = period.as_millis() as u64, "expiry reconciler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sweep_expired(&store, current_timestamp()).await {
                        warn!(error = %e, "expiry sweep failed");
                    }
                }
            }
        }

        info!("expiry reconciler stopped");
    })
}
