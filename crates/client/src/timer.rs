//! A cancellable, restartable one-shot timer.
//!
//! [`DebounceTimer`] runs its action once the delay has elapsed since the
//! most recent [`schedule`](DebounceTimer::schedule). Scheduling again
//! cancels the outstanding countdown, so at most one is pending at a time.
//! Once the action has started, cancelling no longer stops it; an action
//! that must not overlap itself has to serialize internally.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type Action<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

struct Pending {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runs an action producing `T`. A scheduled run discards the output;
/// [`fire_now`](DebounceTimer::fire_now) hands it to the caller.
pub struct DebounceTimer<T = ()> {
    delay: Duration,
    action: Action<T>,
    pending: Option<Pending>,
}

impl<T> DebounceTimer<T> {
    /// Create an idle timer. Must be scheduled from within a Tokio runtime.
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, T> + Send + Sync + 'static,
    {
        Self {
            delay,
            action: Arc::new(action),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start, or restart, the countdown.
    pub fn schedule(&mut self)
    where
        T: Send + 'static,
    {
        self.cancel();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let action = Arc::clone(&self.action);
        let deadline = Instant::now() + self.delay;

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Debounce timer cancelled");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!("Debounce timer fired");
                    let _ = action().await;
                }
            }
        });

        self.pending = Some(Pending { cancel, handle });
    }

    /// Cancel the outstanding countdown. Returns `true` if one was waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                let waiting = !pending.handle.is_finished();
                pending.cancel.cancel();
                waiting
            }
            None => false,
        }
    }

    /// Cancel any countdown and return the action's future, to be run by
    /// the caller right away.
    pub fn fire_now(&mut self) -> BoxFuture<'static, T> {
        self.cancel();
        (self.action)()
    }

    /// Whether a countdown is outstanding (or its action still running).
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }
}

impl<T> Drop for DebounceTimer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_timer(delay_ms: u64) -> (DebounceTimer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = DebounceTimer::new(Duration::from_millis(delay_ms), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        });
        (timer, fired)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (mut timer, fired) = counting_timer(2000);
        timer.schedule();

        sleep_ms(1999).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_pending());

        sleep_ms(2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_restarts_the_countdown() {
        let (mut timer, fired) = counting_timer(2000);
        for _ in 0..5 {
            timer.schedule();
            sleep_ms(1500).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // 2000ms after the last schedule.
        sleep_ms(501).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        sleep_ms(10_000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (mut timer, fired) = counting_timer(2000);
        timer.schedule();
        assert!(timer.cancel());
        assert!(!timer.cancel());

        sleep_ms(5000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_now_cancels_countdown_and_runs_immediately() {
        let (mut timer, fired) = counting_timer(2000);
        timer.schedule();

        timer.fire_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());

        sleep_ms(5000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fire_now_hands_back_the_output() {
        let mut timer = DebounceTimer::new(Duration::from_millis(2000), || async { 7u64 }.boxed());
        assert_eq!(timer.fire_now().await, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_it() {
        let (mut timer, fired) = counting_timer(100);
        timer.schedule();
        drop(timer);

        sleep_ms(1000).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
