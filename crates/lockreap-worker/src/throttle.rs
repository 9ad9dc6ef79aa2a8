//! Cancellable delay between per-record unlock operations.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::run::RunError;

/// Fixed delay inserted between unlock operations to bound the write rate
/// against the backing store.
///
/// The delay races the process-wide shutdown signal: a shutdown observed
/// during (or before) a pause surfaces as [`RunError::Cancelled`] so the
/// run can stop at the next record boundary with its partial tallies.
#[derive(Debug, Clone)]
pub struct Throttle {
    delay: Duration,
    shutdown: watch::Receiver<bool>,
}

impl Throttle {
    /// Create a throttle with the given inter-record delay.
    pub fn new(delay: Duration, shutdown: watch::Receiver<bool>) -> Self {
        Self { delay, shutdown }
    }

    /// Whether the shutdown signal has already been raised.
    pub fn is_cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleep for the configured delay, or return `Err(Cancelled)` if the
    /// shutdown signal fires first. A zero delay still observes an
    /// already-raised signal.
    pub async fn pause(&self) -> Result<(), RunError> {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Err(RunError::Cancelled);
        }
        if self.delay.is_zero() {
            return Ok(());
        }

        let sleep = time::sleep(self.delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                changed = shutdown.changed() => match changed {
                    // Sender dropped means the host is tearing down.
                    Err(_) => return Err(RunError::Cancelled),
                    Ok(()) if *shutdown.borrow() => return Err(RunError::Cancelled),
                    Ok(()) => continue,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let (_tx, rx) = watch::channel(false);
        let throttle = Throttle::new(Duration::ZERO, rx);
        assert!(throttle.pause().await.is_ok());
    }

    #[tokio::test]
    async fn test_pause_cancelled_before_start() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).expect("send shutdown");
        let throttle = Throttle::new(Duration::from_millis(50), rx);
        assert!(matches!(throttle.pause().await, Err(RunError::Cancelled)));
        assert!(throttle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_full_delay() {
        let (_tx, rx) = watch::channel(false);
        let throttle = Throttle::new(Duration::from_millis(50), rx);
        let before = time::Instant::now();
        throttle.pause().await.expect("pause");
        assert!(before.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_interrupted_by_shutdown() {
        let (tx, rx) = watch::channel(false);
        let throttle = Throttle::new(Duration::from_secs(3600), rx);
        let pause = tokio::spawn(async move { throttle.pause().await });
        tokio::task::yield_now().await;
        tx.send(true).expect("send shutdown");
        let result = pause.await.expect("join");
        assert!(matches!(result, Err(RunError::Cancelled)));
    }
}
