// ── Outcome tracker ──
//
// Shared state machine behind both engines. Each call gets a generation
// number and a cancellation token; only the newest generation may publish.
// Transient clears run as cancellable tasks holding a `Weak` back-reference,
// so a torn-down engine is never written to.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::{RequestOutcome, RequestState};
use crate::error::CoreError;

/// What a transient timer resets when it fires.
#[derive(Debug, Clone, Copy)]
enum Expiry {
    /// Drop the settled result back to `Idle`.
    State,
    /// Drop the error and show whatever was settled before the call.
    Error,
}

/// Handle for one in-flight call.
pub(super) struct Call {
    generation: u64,
    token: CancellationToken,
}

impl Call {
    pub(super) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// A settled state and, for auto-cleared results, when it stops being shown.
#[derive(Debug, Clone)]
struct Held {
    state: RequestState,
    expires_at: Option<Instant>,
}

pub(super) struct Tracker {
    outcome: watch::Sender<RequestOutcome>,
    /// Last settled state; what the outcome falls back to when an error
    /// expires or a call is cancelled.
    settled: watch::Sender<Option<Held>>,
    generation: AtomicU64,
    /// Token of the newest call. Cancelling it aborts the call and any
    /// transient timer it scheduled.
    current: ArcSwap<CancellationToken>,
    /// Parent of every call token; cancelled on teardown.
    lifetime: CancellationToken,
    ttl: Duration,
}

impl Tracker {
    pub(super) fn new(ttl: Duration) -> Arc<Self> {
        let (outcome, _) = watch::channel(RequestOutcome::Idle);
        let (settled, _) = watch::channel(None);
        let lifetime = CancellationToken::new();
        let current = ArcSwap::from_pointee(lifetime.child_token());
        Arc::new(Self {
            outcome,
            settled,
            generation: AtomicU64::new(0),
            current,
            lifetime,
            ttl,
        })
    }

    pub(super) fn outcome(&self) -> RequestOutcome {
        self.outcome.borrow().clone()
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<RequestOutcome> {
        self.outcome.subscribe()
    }

    /// Start a new call, superseding (and cancelling) the previous one.
    pub(super) fn begin(&self) -> Call {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.lifetime.child_token();
        let previous = self.current.swap(Arc::new(token.clone()));
        previous.cancel();
        self.outcome.send_replace(RequestOutcome::Pending);
        Call { generation, token }
    }

    /// Cancel the newest call and its pending transient timers.
    pub(super) fn cancel_current(&self) {
        self.current.load().cancel();
    }

    fn is_current(&self, call: &Call) -> bool {
        self.generation.load(Ordering::SeqCst) == call.generation
    }

    /// Publish a completed exchange.
    pub(super) fn settle(self: &Arc<Self>, call: &Call, state: RequestState, auto_clear: bool) {
        if !self.is_current(call) {
            trace!(generation = call.generation, "dropping superseded completion");
            return;
        }
        let expires_at = auto_clear.then(|| Instant::now() + self.ttl);
        self.settled.send_replace(Some(Held {
            state: state.clone(),
            expires_at,
        }));
        self.outcome.send_replace(RequestOutcome::Settled(state));
        if let Some(deadline) = expires_at {
            self.schedule(call.token.clone(), call.generation, deadline, Expiry::State);
        }
    }

    /// Publish a failure. It expires after the TTL, leaving state untouched.
    pub(super) fn fail(self: &Arc<Self>, call: &Call, error: Arc<CoreError>) {
        if !self.is_current(call) {
            trace!(generation = call.generation, "dropping superseded failure");
            return;
        }
        self.outcome.send_replace(RequestOutcome::Failed(error));
        let deadline = Instant::now() + self.ttl;
        self.schedule(call.token.clone(), call.generation, deadline, Expiry::Error);
    }

    /// A cancelled call leaves the engine as it was before the call.
    pub(super) fn abandon(self: &Arc<Self>, call: &Call) {
        if self.is_current(call) {
            self.restore();
        }
    }

    /// Fall back to the last settled state. An auto-cleared result keeps its
    /// original deadline: it is dropped if that has passed, otherwise its
    /// expiry is re-armed for the time left.
    fn restore(self: &Arc<Self>) {
        let held = self.settled.borrow().clone();
        let outcome = match held {
            None => RequestOutcome::Idle,
            Some(Held {
                expires_at: Some(deadline),
                ..
            }) if deadline <= Instant::now() => {
                self.settled.send_replace(None);
                RequestOutcome::Idle
            }
            Some(Held { state, expires_at }) => {
                if let Some(deadline) = expires_at {
                    // The call that settled this state is gone; the timer
                    // lives as long as the engine and the current generation.
                    let generation = self.generation.load(Ordering::SeqCst);
                    self.schedule(self.lifetime.child_token(), generation, deadline, Expiry::State);
                }
                RequestOutcome::Settled(state)
            }
        };
        self.outcome.send_replace(outcome);
    }

    fn schedule(
        self: &Arc<Self>,
        token: CancellationToken,
        generation: u64,
        deadline: Instant,
        expiry: Expiry,
    ) {
        let tracker: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    let Some(tracker) = tracker.upgrade() else {
                        return;
                    };
                    if tracker.generation.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    trace!(?expiry, generation, "transient state expired");
                    match expiry {
                        Expiry::State => {
                            tracker.settled.send_replace(None);
                            tracker.outcome.send_replace(RequestOutcome::Idle);
                        }
                        Expiry::Error => tracker.restore(),
                    }
                }
            }
        });
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(2);

    #[tokio::test(start_paused = true)]
    async fn settle_publishes_and_expires() {
        let tracker = Tracker::new(TTL);
        let call = tracker.begin();
        assert!(tracker.outcome().is_loading());

        tracker.settle(&call, RequestState::status_only(201), true);
        assert!(tracker.outcome().has_status(201));

        tokio::time::sleep(TTL + Duration::from_millis(10)).await;
        assert!(matches!(tracker.outcome(), RequestOutcome::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_expires_back_to_previous_state() {
        let tracker = Tracker::new(TTL);
        let first = tracker.begin();
        tracker.settle(&first, RequestState::status_only(200), false);

        let second = tracker.begin();
        tracker.fail(&second, Arc::new(CoreError::Timeout));
        assert!(tracker.outcome().error().is_some());

        tokio::time::sleep(TTL + Duration::from_millis(10)).await;
        assert!(tracker.outcome().has_status(200));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_revive_expired_result() {
        let tracker = Tracker::new(TTL);
        let first = tracker.begin();
        tracker.settle(&first, RequestState::status_only(400), true);

        tokio::time::sleep(TTL / 2).await;
        let second = tracker.begin();
        tracker.fail(&second, Arc::new(CoreError::Timeout));

        // The error outlives the 400's deadline, so nothing comes back.
        tokio::time::sleep(TTL + Duration::from_millis(10)).await;
        assert!(matches!(tracker.outcome(), RequestOutcome::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_call_keeps_original_deadline() {
        let tracker = Tracker::new(TTL);
        let first = tracker.begin();
        tracker.settle(&first, RequestState::status_only(201), true);

        tokio::time::sleep(TTL / 2).await;
        let second = tracker.begin();
        tracker.cancel_current();
        tracker.abandon(&second);
        assert!(tracker.outcome().has_status(201));

        tokio::time::sleep(TTL / 2 + Duration::from_millis(10)).await;
        assert!(matches!(tracker.outcome(), RequestOutcome::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_completion_is_ignored() {
        let tracker = Tracker::new(TTL);
        let old = tracker.begin();
        let new = tracker.begin();
        assert!(old.token().is_cancelled());

        tracker.settle(&old, RequestState::status_only(500), false);
        assert!(tracker.outcome().is_loading());

        tracker.settle(&new, RequestState::status_only(200), false);
        assert!(tracker.outcome().has_status(200));
    }

    #[tokio::test(start_paused = true)]
    async fn new_call_cancels_pending_expiry() {
        let tracker = Tracker::new(TTL);
        let first = tracker.begin();
        tracker.settle(&first, RequestState::status_only(201), true);

        tokio::time::sleep(TTL / 2).await;
        let second = tracker.begin();
        tracker.settle(&second, RequestState::status_only(201), true);

        // The first timer would have fired here; the restarted cycle keeps
        // the fresh result visible.
        tokio::time::sleep(TTL / 2 + Duration::from_millis(10)).await;
        assert!(tracker.outcome().has_status(201));

        tokio::time::sleep(TTL).await;
        assert!(matches!(tracker.outcome(), RequestOutcome::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_restores_prior_state() {
        let tracker = Tracker::new(TTL);
        let first = tracker.begin();
        tracker.settle(&first, RequestState::status_only(200), false);

        let second = tracker.begin();
        tracker.cancel_current();
        assert!(second.token().is_cancelled());
        tracker.abandon(&second);
        assert!(tracker.outcome().has_status(200));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_tracker_is_not_written_after_teardown() {
        let tracker = Tracker::new(TTL);
        let mut rx = tracker.subscribe();
        let call = tracker.begin();
        tracker.settle(&call, RequestState::status_only(201), true);
        rx.borrow_and_update();

        drop(call);
        drop(tracker);
        tokio::time::sleep(TTL * 2).await;
        // The sender is gone: the receiver sees closure, not an expiry write.
        assert!(rx.has_changed().is_err());
    }
}
