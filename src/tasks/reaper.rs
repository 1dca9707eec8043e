//! Expiry Reaper Task
//!
//! Background task that periodically samples a fraction of the cache and
//! evicts the expired entries it finds, so keys nobody reads again still
//! give their memory back.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::{EstimateSize, SharedStore};
use crate::error::{CacheError, Result};

// == Reaper ==
/// Handle to a running reaper task.
///
/// Dropping the handle signals the task to stop; `stop` additionally waits
/// for it to finish.
#[derive(Debug)]
pub struct Reaper {
    /// Sender to signal shutdown to the task
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Spawns a reaper sweeping `store` every `interval`, examining
    /// `1 / divisor` of the entries each time.
    ///
    /// The first sweep happens one full interval after spawning.
    ///
    /// # Errors
    /// Returns `CacheError::RuntimeUnavailable` when called outside of a
    /// Tokio runtime.
    pub fn spawn<V>(store: SharedStore<V>, interval: Duration, divisor: usize) -> Result<Self>
    where
        V: EstimateSize + Clone + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // tokio::time::interval panics on a zero period.
        let interval = interval.max(Duration::from_millis(1));
        let divisor = divisor.max(1);
        let handle = runtime.spawn(run(store, interval, divisor, shutdown_rx));

        info!(
            "Starting expiry reaper with interval of {:?}, sampling 1/{} of entries",
            interval, divisor
        );

        Ok(Self {
            shutdown_tx,
            handle: Some(handle),
        })
    }

    /// Signals the task to stop and waits until it has exited.
    ///
    /// A sweep already in progress finishes; no sweep starts afterwards.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn run<V>(
    store: SharedStore<V>,
    interval: Duration,
    divisor: usize,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    V: EstimateSize + Clone + Send + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first immediate tick - we want to wait for the interval first
    ticker.tick().await;

    loop {
        tokio::select! {
            // A pending stop wins over a due tick.
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let (removed, remaining) = {
                    let mut store = store.lock();
                    (store.reap_sample(divisor), store.len())
                };

                if removed > 0 {
                    info!(
                        "Expiry reaper: removed {} expired entries, {} remain",
                        removed, remaining
                    );
                } else {
                    debug!("Expiry reaper: no expired entries in sample");
                }
            }
        }
    }

    info!("Expiry reaper stopped");
}
