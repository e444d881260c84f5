// ── Staleness signal ──
//
// A single shared flag meaning "some list on screen is out of date".
// Mutating views raise it after a successful change; list owners watch it,
// start a re-fetch and lower it again.
//
// Delivery is edge-triggered and single-consumer: the first watcher to
// observe `true` lowers the flag, so a second watcher may miss the edge.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct StalenessSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl Default for StalenessSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StalenessSignal {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Mark the shared lists as stale.
    pub fn raise(&self) {
        trace!("staleness raised");
        self.flag.send_replace(true);
    }

    pub fn clear(&self) {
        self.flag.send_replace(false);
    }

    pub fn is_raised(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.flag.subscribe()
    }

    /// Run `refetch` each time the flag goes up, until `shutdown` fires.
    ///
    /// `refetch` must only *start* the fetch (spawn it); the flag is lowered
    /// right after it returns.
    pub fn watch<F>(&self, shutdown: CancellationToken, mut refetch: F) -> JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = self.clone();
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                let raised = tokio::select! {
                    () = shutdown.cancelled() => false,
                    res = rx.wait_for(|raised| *raised) => res.is_ok(),
                };
                if !raised {
                    break;
                }
                trace!("staleness observed, re-fetching");
                refetch();
                signal.clear();
            }
        })
    }

    /// Like [`watch`](Self::watch), spawning the future `refetch` returns.
    pub fn watch_spawn<F, Fut>(&self, shutdown: CancellationToken, mut refetch: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.watch(shutdown, move || {
            tokio::spawn(refetch());
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn raise_triggers_one_refetch_and_clears() {
        let signal = StalenessSignal::new();
        let count = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        let counter = Arc::clone(&count);
        let handle = signal.watch(shutdown.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        settle().await;
        signal.raise();
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!signal.is_raised());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn already_raised_flag_is_picked_up() {
        let signal = StalenessSignal::new();
        signal.raise();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let shutdown = CancellationToken::new();
        let _handle = signal.watch(shutdown.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn no_refetch_after_shutdown() {
        let signal = StalenessSignal::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let shutdown = CancellationToken::new();
        let handle = signal.watch(shutdown.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        shutdown.cancel();
        handle.await.unwrap();

        signal.raise();
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(signal.is_raised());
    }
}
