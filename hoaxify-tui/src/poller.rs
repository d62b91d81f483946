use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Repeating timer that delivers ticks through a bounded channel.
///
/// The feed's new-hoax-count poll runs off this. Cancellation must be exact:
/// once `cancel` returns (or the poller is dropped), `try_tick` never reports
/// another tick, even for ticks that were already queued when the poller was
/// torn down.
pub struct Poller {
    rx: mpsc::Receiver<()>,
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Spawn a poller that produces one tick per `period`.
    ///
    /// The first tick arrives one full period after spawning, not
    /// immediately.
    pub fn spawn(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // interval's first tick completes immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                if flag.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            cancelled,
            handle,
        }
    }

    /// Consume a pending tick, if one has fired since the last call.
    pub fn try_tick(&mut self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        self.rx.try_recv().is_ok()
    }

    /// Stop the timer. No tick is observable after this returns.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.handle.abort();
        // Drain anything that was queued before cancellation
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_ticks_while_running() {
        let mut poller = Poller::spawn(Duration::from_millis(10));

        let mut ticked = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if poller.try_tick() {
                ticked = true;
                break;
            }
        }
        assert!(ticked, "poller never delivered a tick");
    }

    #[tokio::test]
    async fn no_tick_observable_after_cancel() {
        let mut poller = Poller::spawn(Duration::from_millis(5));

        // Let ticks queue up, then tear down
        tokio::time::sleep(Duration::from_millis(30)).await;
        poller.cancel();

        // Even if the timer task had ticks in flight, none are observable now
        for _ in 0..10 {
            assert!(!poller.try_tick());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn cancel_before_first_tick_suppresses_everything() {
        let mut poller = Poller::spawn(Duration::from_millis(20));
        poller.cancel();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!poller.try_tick());
    }
}
