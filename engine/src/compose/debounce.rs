//! # Debounce Coordinator
//!
//! Every keystroke wants a fresh compose attempt, but attempts hit an
//! external provider — so edits inside a short window collapse into one
//! attempt, and an attempt that is already in flight when a newer edit
//! arrives gets its result thrown away.
//!
//! The mechanism is a single monotonic generation counter. Each
//! submission takes the next generation, waits out the window, and then
//! checks twice — once before spending the provider call, once after —
//! that no newer submission has claimed the counter. A stale submission
//! resolves to [`Debounced::Superseded`] and the caller mutates nothing.
//! There is no task registry and nothing to cancel: superseded attempts
//! simply discover they are stale and stand down.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::trace;

use crate::config::DEBOUNCE_WINDOW;

/// Outcome of one debounced submission.
#[derive(Debug, PartialEq, Eq)]
pub enum Debounced<T> {
    /// This submission was still the newest after the work ran.
    Settled {
        value: T,
        /// The generation the value belongs to; pass to
        /// [`DebounceCoordinator::is_current`] before applying it after
        /// any further awaits.
        generation: u64,
    },
    /// A newer submission arrived; the value (if any) was discarded.
    Superseded,
}

impl<T> Debounced<T> {
    pub fn settled(self) -> Option<T> {
        match self {
            Self::Settled { value, .. } => Some(value),
            Self::Superseded => None,
        }
    }
}

/// Collapses bursts of submissions into the newest one.
pub struct DebounceCoordinator {
    window: Duration,
    generation: AtomicU64,
}

impl Default for DebounceCoordinator {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl DebounceCoordinator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
        }
    }

    /// Submit one unit of work. The work closure runs only if this
    /// submission survives the debounce window; its result is kept only
    /// if it is still the newest when the work finishes.
    pub async fn submit<T, F, Fut>(&self, work: F) -> Debounced<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        sleep(self.window).await;
        if !self.is_current(generation) {
            trace!(generation, "superseded during debounce window");
            return Debounced::Superseded;
        }

        let value = work().await;
        if !self.is_current(generation) {
            trace!(generation, "superseded while working");
            return Debounced::Superseded;
        }

        Debounced::Settled { value, generation }
    }

    /// True while `generation` is still the newest submission.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Claim the counter without submitting work: every in-flight
    /// submission discovers it is stale and stands down.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        trace!("pending submissions invalidated");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::time::{advance, Duration};

    #[tokio::test(start_paused = true)]
    async fn single_submission_settles() {
        let coordinator = DebounceCoordinator::new(Duration::from_millis(300));
        let result = coordinator.submit(|| async { 42 }).await;
        assert!(matches!(result, Debounced::Settled { value: 42, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_newest() {
        let coordinator = Arc::new(DebounceCoordinator::new(Duration::from_millis(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        // Three edits at t=0, t=100, t=150; only the last may run work.
        let mut handles = Vec::new();
        for (delay, value) in [(0u64, 1), (100, 2), (150, 3)] {
            let coordinator = Arc::clone(&coordinator);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                sleep(Duration::from_millis(delay)).await;
                coordinator
                    .submit(move || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            value
                        }
                    })
                    .await
            }));
        }

        advance(Duration::from_millis(1000)).await;
        let mut settled = Vec::new();
        for handle in handles {
            if let Debounced::Settled { value, .. } = handle.await.unwrap() {
                settled.push(value);
            }
        }

        assert_eq!(settled, vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_work_is_superseded_by_newer_submission() {
        let coordinator = Arc::new(DebounceCoordinator::new(Duration::from_millis(100)));

        let slow = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                coordinator
                    .submit(|| async {
                        // Provider round-trip slower than the next edit.
                        sleep(Duration::from_millis(500)).await;
                        "slow"
                    })
                    .await
            })
        };

        let fast = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move {
                // Arrives after the slow attempt started working.
                sleep(Duration::from_millis(200)).await;
                coordinator.submit(|| async { "fast" }).await
            })
        };

        advance(Duration::from_millis(1000)).await;
        assert_eq!(slow.await.unwrap(), Debounced::Superseded);
        assert!(matches!(
            fast.await.unwrap(),
            Debounced::Settled { value: "fast", .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_supersedes_pending_work() {
        let coordinator = Arc::new(DebounceCoordinator::new(Duration::from_millis(300)));

        let pending = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.submit(|| async { 1 }).await })
        };

        sleep(Duration::from_millis(100)).await;
        coordinator.invalidate();

        advance(Duration::from_millis(1000)).await;
        assert_eq!(pending.await.unwrap(), Debounced::Superseded);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_generation_stays_current_until_next_submission() {
        let coordinator = DebounceCoordinator::new(Duration::from_millis(10));
        let generation = match coordinator.submit(|| async { () }).await {
            Debounced::Settled { generation, .. } => generation,
            Debounced::Superseded => panic!("lone submission cannot be superseded"),
        };
        assert!(coordinator.is_current(generation));

        let _ = coordinator.submit(|| async { () }).await;
        assert!(!coordinator.is_current(generation));
    }
}
