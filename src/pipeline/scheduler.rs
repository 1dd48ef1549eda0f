//! Poll scheduler
//!
//! Drives the fetcher on a fixed cadence and funnels every result through the
//! controller. Cycles run sequentially inside one task: a tick that comes due
//! while a fetch is still pending is skipped, never overlapped.
//!
//! Cancellation is checked at every resumption point. A fetch that settles
//! after [`PollHandle::stop`] is dropped without touching the state.

use super::fetcher::{FetchError, SnapshotSource};
use crate::state::FeedController;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Snapshot differed from the held one and replaced it
    Updated,
    /// Snapshot was equal to the held one
    Unchanged,
    /// Fetch failed; message stored as the view error
    Failed(String),
    /// Cancelled before the fetch settled; nothing applied
    Cancelled,
}

/// Run a single fetch/compare/apply cycle
pub async fn run_cycle(
    source: &dyn SnapshotSource,
    controller: &FeedController,
    cancel: &CancellationToken,
) -> CycleOutcome {
    if cancel.is_cancelled() {
        return CycleOutcome::Cancelled;
    }

    if !controller.begin_cycle(cancel).await {
        return CycleOutcome::Cancelled;
    }

    let result: Result<_, FetchError> = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::debug!("Poll cycle cancelled with fetch in flight");
            return CycleOutcome::Cancelled;
        }
        result = source.fetch() => result,
    };

    // The controller re-checks under its write lock; this only skips the wait
    if cancel.is_cancelled() {
        log::debug!("Discarding fetch result that settled after cancellation");
        return CycleOutcome::Cancelled;
    }

    match result {
        Ok(snapshot) => {
            let groups = snapshot.len();
            if log::log_enabled!(log::Level::Trace) {
                for group in &snapshot {
                    for txn in &group.transactions {
                        log::trace!("slot {}: {}", group.slot, txn.transfer);
                    }
                }
            }

            match controller.accept_snapshot(snapshot, cancel).await {
                Some(true) => {
                    log::info!("📥 Snapshot updated: {} slot groups", groups);
                    CycleOutcome::Updated
                }
                Some(false) => {
                    log::debug!("Snapshot unchanged ({} slot groups)", groups);
                    CycleOutcome::Unchanged
                }
                None => {
                    log::debug!("Discarding snapshot: cancelled while waiting for the state lock");
                    CycleOutcome::Cancelled
                }
            }
        }
        Err(e) => {
            if !controller.record_failure(&e, cancel).await {
                return CycleOutcome::Cancelled;
            }
            log::warn!("⚠️  Fetch failed: {}", e);
            CycleOutcome::Failed(e.to_string())
        }
    }
}

/// Fixed-period poller over a [`SnapshotSource`]
pub struct PollScheduler {
    source: Arc<dyn SnapshotSource>,
    controller: FeedController,
    period: Duration,
}

impl PollScheduler {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        controller: FeedController,
        period: Duration,
    ) -> Self {
        Self {
            source,
            controller,
            period,
        }
    }

    /// Poll until `cancel` fires. The first cycle runs immediately.
    pub async fn run(self, cancel: CancellationToken) {
        log::info!("⏰ Starting poll scheduler (interval: {}ms)", self.period.as_millis());

        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = timer.tick() => {}
            }

            if run_cycle(self.source.as_ref(), &self.controller, &cancel).await
                == CycleOutcome::Cancelled
            {
                break;
            }
        }

        log::info!("Poll scheduler stopped");
    }

    /// Start polling on a background task
    pub fn spawn(self) -> PollHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        PollHandle { cancel, task }
    }
}

/// Handle to a spawned [`PollScheduler`]
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop ticking, discard any in-flight result and wait for the task
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::error!("Poll scheduler task failed: {}", e);
        }
    }
}
