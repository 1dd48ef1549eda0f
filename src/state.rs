use {
    crate::pipeline::{
        detector::differs,
        fetcher::FetchError,
        filter::project,
        types::{SlotGroup, Snapshot},
    },
    chrono::{DateTime, Utc},
    std::sync::Arc,
    tokio::sync::{watch, RwLock, RwLockReadGuard},
    tokio_util::sync::CancellationToken,
};

/// Process-local view of the feed
///
/// Read by the display surface; written only through [`FeedController`].
/// `filtered` is always `project(held, predicate)` once a write settles.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Last snapshot judged different from its predecessor
    held: Snapshot,
    /// Projection of `held` under `predicate`
    filtered: Snapshot,
    predicate: String,
    loading: bool,
    error: Option<String>,
    /// Bumped whenever `held` or `filtered` changes
    revision: u64,
    last_success: Option<DateTime<Utc>>,
    consecutive_failures: u32,
}

impl ViewState {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            held: Vec::new(),
            filtered: Vec::new(),
            predicate: predicate.into(),
            loading: true,
            error: None,
            revision: 0,
            last_success: None,
            consecutive_failures: 0,
        }
    }

    pub fn held(&self) -> &[SlotGroup] {
        &self.held
    }

    pub fn filtered(&self) -> &[SlotGroup] {
        &self.filtered
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    fn begin_cycle(&mut self) -> bool {
        let changed = !self.loading;
        self.loading = true;
        changed
    }

    /// Returns true if the held snapshot was replaced
    fn accept_snapshot(&mut self, snapshot: Snapshot) -> bool {
        self.loading = false;
        self.error = None;
        self.consecutive_failures = 0;
        self.last_success = Some(Utc::now());

        if !differs(&self.held, &snapshot) {
            return false;
        }

        self.held = snapshot;
        self.filtered = project(&self.held, &self.predicate);
        self.revision += 1;
        true
    }

    fn record_failure(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    /// Returns true if the predicate changed
    fn set_predicate(&mut self, predicate: String) -> bool {
        if predicate == self.predicate {
            return false;
        }

        self.predicate = predicate;
        let filtered = project(&self.held, &self.predicate);
        if filtered != self.filtered {
            self.filtered = filtered;
            self.revision += 1;
        }
        true
    }
}

/// Owner of the shared [`ViewState`]
///
/// Every mutation goes through a controller method, which applies it under a
/// single write lock (so `held`/`filtered` always move together) and then
/// notifies subscribers.
#[derive(Clone)]
pub struct FeedController {
    state: Arc<RwLock<ViewState>>,
    changes: Arc<watch::Sender<u64>>,
}

impl FeedController {
    pub fn new(predicate: impl Into<String>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(ViewState::new(predicate))),
            changes: Arc::new(changes),
        }
    }

    /// Read access for consumers
    pub async fn read(&self) -> RwLockReadGuard<'_, ViewState> {
        self.state.read().await
    }

    /// Owned copy of the current state
    pub async fn view(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Receiver that ticks after every settled observable change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Mark a poll cycle as started. Returns false, changing nothing, once
    /// `cancel` has fired.
    pub async fn begin_cycle(&self, cancel: &CancellationToken) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            if cancel.is_cancelled() {
                return false;
            }
            state.begin_cycle()
        };
        if changed {
            self.notify();
        }
        true
    }

    /// Apply a successful fetch. Returns whether the held snapshot changed,
    /// or `None` if `cancel` fired before the write lock was acquired.
    pub async fn accept_snapshot(&self, snapshot: Snapshot, cancel: &CancellationToken) -> Option<bool> {
        let replaced = {
            let mut state = self.state.write().await;
            // Checked under the write guard: a stop() racing the lock wait wins
            if cancel.is_cancelled() {
                return None;
            }
            state.accept_snapshot(snapshot)
        };
        self.notify();
        Some(replaced)
    }

    /// Apply a failed fetch; the held snapshot is left untouched. Returns
    /// false if `cancel` fired before the write lock was acquired.
    pub async fn record_failure(&self, error: &FetchError, cancel: &CancellationToken) -> bool {
        {
            let mut state = self.state.write().await;
            if cancel.is_cancelled() {
                return false;
            }
            state.record_failure(error.to_string());
        }
        self.notify();
        true
    }

    /// Replace the filter predicate and re-project synchronously
    pub async fn set_predicate(&self, predicate: impl Into<String>) -> bool {
        let changed = self.state.write().await.set_predicate(predicate.into());
        if changed {
            self.notify();
        }
        changed
    }

    pub async fn push_predicate_char(&self, c: char) {
        self.edit_predicate(|predicate| {
            predicate.push(c);
            true
        })
        .await;
    }

    pub async fn pop_predicate_char(&self) {
        self.edit_predicate(|predicate| predicate.pop().is_some()).await;
    }

    /// Read-modify-write of the predicate under one write guard
    async fn edit_predicate<F>(&self, edit: F)
    where
        F: FnOnce(&mut String) -> bool,
    {
        let changed = {
            let mut state = self.state.write().await;
            let mut predicate = state.predicate.clone();
            edit(&mut predicate) && state.set_predicate(predicate)
        };
        if changed {
            self.notify();
        }
    }

    fn notify(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::fixtures::*;
    use reqwest::StatusCode;

    fn live() -> CancellationToken {
        CancellationToken::new()
    }

    fn assert_settled(state: &ViewState) {
        assert_eq!(state.filtered(), project(state.held(), state.predicate()).as_slice());
    }

    #[tokio::test]
    async fn test_initial_state() {
        let controller = FeedController::new("");
        let state = controller.view().await;

        assert!(state.is_loading());
        assert!(state.held().is_empty());
        assert!(state.filtered().is_empty());
        assert_eq!(state.error(), None);
        assert_eq!(state.revision(), 0);
    }

    #[tokio::test]
    async fn test_accept_snapshot_reprojects() {
        let controller = FeedController::new("ab");
        assert_eq!(controller.accept_snapshot(sample_snapshot(), &live()).await, Some(true));

        let state = controller.view().await;
        assert!(!state.is_loading());
        assert_eq!(state.held(), sample_snapshot().as_slice());
        assert_eq!(state.filtered().len(), 2);
        assert_eq!(state.revision(), 1);
        assert!(state.last_success().is_some());
        assert_settled(&state);
    }

    #[tokio::test]
    async fn test_unchanged_snapshot_keeps_revision() {
        let controller = FeedController::new("");
        controller.accept_snapshot(sample_snapshot(), &live()).await;
        assert_eq!(controller.accept_snapshot(sample_snapshot(), &live()).await, Some(false));
        assert_eq!(controller.read().await.revision(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_twice() {
        let controller = FeedController::new("");
        assert_eq!(controller.accept_snapshot(Vec::new(), &live()).await, Some(false));
        assert_eq!(controller.accept_snapshot(Vec::new(), &live()).await, Some(false));

        let state = controller.view().await;
        assert!(state.held().is_empty());
        assert!(state.filtered().is_empty());
        assert_eq!(state.revision(), 0);
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_failure_keeps_held_snapshot() {
        let controller = FeedController::new("");
        controller.accept_snapshot(sample_snapshot(), &live()).await;
        let before = controller.view().await;

        controller.begin_cycle(&live()).await;
        controller
            .record_failure(&FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR), &live())
            .await;

        let after = controller.view().await;
        assert_eq!(after.held(), before.held());
        assert_eq!(after.filtered(), before.filtered());
        assert_eq!(after.revision(), before.revision());
        assert!(after.error().unwrap().contains("500"));
        assert_eq!(after.consecutive_failures(), 1);
        assert!(!after.is_loading());
    }

    #[tokio::test]
    async fn test_success_clears_error() {
        let controller = FeedController::new("");
        controller
            .record_failure(&FetchError::Status(StatusCode::BAD_GATEWAY), &live())
            .await;
        controller
            .record_failure(&FetchError::Status(StatusCode::BAD_GATEWAY), &live())
            .await;
        assert_eq!(controller.read().await.consecutive_failures(), 2);

        controller.accept_snapshot(Vec::new(), &live()).await;
        let state = controller.view().await;
        assert_eq!(state.error(), None);
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_predicate_edits_reproject() {
        let controller = FeedController::new("");
        controller.accept_snapshot(sample_snapshot(), &live()).await;

        for c in "abc".chars() {
            controller.push_predicate_char(c).await;
            assert_settled(&*controller.read().await);
        }
        let state = controller.view().await;
        assert_eq!(state.predicate(), "abc");
        assert_eq!(state.filtered().len(), 1);

        controller.pop_predicate_char().await;
        controller.pop_predicate_char().await;
        assert_eq!(controller.read().await.predicate(), "a");
        assert_settled(&*controller.read().await);

        assert!(controller.set_predicate("").await);
        assert_eq!(controller.read().await.filtered(), sample_snapshot().as_slice());
        assert!(!controller.set_predicate("").await);
    }

    #[tokio::test]
    async fn test_predicate_without_effect_keeps_revision() {
        let controller = FeedController::new("");
        controller.accept_snapshot(sample_snapshot(), &live()).await;
        let revision = controller.read().await.revision();

        controller.set_predicate("").await;
        controller.set_predicate("nomatch").await;
        // Narrowing an already empty projection is not a data change
        controller.set_predicate("nomatch2").await;
        assert_eq!(controller.read().await.revision(), revision + 1);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let controller = FeedController::new("");
        let mut changes = controller.subscribe();

        controller.accept_snapshot(sample_snapshot(), &live()).await;
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        controller.set_predicate("").await;
        assert!(!changes.has_changed().unwrap());

        controller.set_predicate("x").await;
        assert!(changes.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_writes_change_nothing() {
        let controller = FeedController::new("");
        controller.accept_snapshot(Vec::new(), &live()).await;
        let before = controller.view().await;
        let mut changes = controller.subscribe();

        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert!(!controller.begin_cycle(&cancelled).await);
        assert_eq!(controller.accept_snapshot(sample_snapshot(), &cancelled).await, None);
        assert!(
            !controller
                .record_failure(&FetchError::Status(StatusCode::BAD_GATEWAY), &cancelled)
                .await
        );

        let after = controller.view().await;
        assert!(after.held().is_empty());
        assert_eq!(after.revision(), before.revision());
        assert_eq!(after.is_loading(), before.is_loading());
        assert_eq!(after.error(), None);
        assert!(!changes.has_changed().unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_predicate_edits_are_not_lost() {
        let controller = FeedController::new("");

        let edits: Vec<_> = ('a'..='z')
            .map(|c| {
                let controller = controller.clone();
                tokio::spawn(async move { controller.push_predicate_char(c).await })
            })
            .collect();
        for edit in edits {
            edit.await.unwrap();
        }

        let mut typed: Vec<char> = controller.read().await.predicate().chars().collect();
        typed.sort_unstable();
        assert_eq!(typed, ('a'..='z').collect::<Vec<_>>());
    }
}
