//! Background auto-save cycle.
//!
//! A tokio task wakes every `period`, flushes the collection if it is dirty,
//! and exits as soon as the stop signal flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::engine::Shared;

pub(crate) struct AutoSave {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl AutoSave {
    pub(crate) fn spawn(shared: Arc<Shared>, period: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(period_secs = period.as_secs(), "auto-save started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match shared.persist(false).await {
                            Ok(true) => tracing::debug!("auto-save flushed collection"),
                            Ok(false) => tracing::trace!("auto-save: nothing to flush"),
                            // Stays dirty; the next tick retries.
                            Err(e) => tracing::warn!(error = %e, "auto-save failed"),
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
            tracing::debug!("auto-save stopped");
        });

        Self { stop, handle }
    }

    /// Signal the task and wait for it to finish its current flush.
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "auto-save task ended abnormally");
        }
    }

    /// Signal the task without waiting.
    pub(crate) fn cancel(self) {
        let _ = self.stop.send(true);
    }
}
