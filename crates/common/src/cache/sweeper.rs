//! Periodic expiry sweep
//!
//! Lazy eviction only removes entries that are read again. The sweeper runs
//! [`TtlCache::clear_expired`] on a fixed interval so memory stays bounded
//! regardless of read traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::store::TtlCache;
use crate::error::{CommonError, CommonResult};
use crate::resilience::Clock;

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// How long `stop` waits for the loop to exit
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Background task evicting expired cache entries
pub struct ExpirySweeper<V, C>
where
    V: Clone,
    C: Clock,
{
    cache: TtlCache<V, C>,
    interval: Duration,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl<V, C> ExpirySweeper<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock + Clone,
{
    /// Sweep `cache` at its configured `sweep_interval`
    pub fn new(cache: TtlCache<V, C>) -> Self {
        let interval = cache.config().sweep_interval;
        Self::with_interval(cache, interval)
    }

    pub fn with_interval(cache: TtlCache<V, C>, interval: Duration) -> Self {
        Self {
            cache,
            interval,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the sweep loop
    ///
    /// # Errors
    /// Returns `CommonError::Config` if the sweeper is already running or the
    /// interval is zero.
    #[instrument(skip(self), fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn start(&mut self) -> CommonResult<()> {
        if self.interval.is_zero() {
            return Err(CommonError::config("sweep interval must be greater than zero"));
        }
        if self.is_running().await {
            return Err(CommonError::config("Expiry sweeper already running"));
        }

        // Fresh token so the sweeper can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let cache = self.cache.clone();
        let interval = self.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sweep_loop(cache, interval, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!("Expiry sweeper started");
        Ok(())
    }

    /// Cancel the loop and wait for it to exit
    ///
    /// # Errors
    /// Returns an error if the sweeper is not running, the task panicked, or
    /// it did not exit in time.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> CommonResult<()> {
        if !self.is_running().await {
            return Err(CommonError::config("Expiry sweeper not running"));
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(error = %e, "Expiry sweeper task panicked");
                    return Err(CommonError::internal(format!("Sweeper task panicked: {e}")));
                }
                Err(_) => {
                    warn!("Expiry sweeper did not stop within timeout");
                    return Err(CommonError::timeout("expiry_sweeper_stop", STOP_TIMEOUT));
                }
            }
        }

        info!("Expiry sweeper stopped");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let guard = self.task_handle.lock().await;
        guard.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Run one sweep immediately
    pub fn sweep_once(&self) -> usize {
        self.cache.clear_expired()
    }

    async fn sweep_loop(cache: TtlCache<V, C>, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Expiry sweep loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    let removed = cache.clear_expired();
                    debug!(removed, remaining = cache.len(), "Periodic expiry sweep completed");
                }
            }
        }
    }
}

impl<V, C> Drop for ExpirySweeper<V, C>
where
    V: Clone,
    C: Clock,
{
    fn drop(&mut self) {
        // Best effort: the loop exits on its next wake-up.
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::resilience::MockClock;

    fn mock_cache() -> (TtlCache<u32, MockClock>, MockClock) {
        let clock = MockClock::new();
        (TtlCache::with_clock(CacheConfig::default(), clock.clone()), clock)
    }

    #[tokio::test]
    async fn sweeps_expired_entries_in_background() {
        let (cache, clock) = mock_cache();
        cache.set("stale", 1, Duration::from_secs(5));
        cache.set("fresh", 2, Duration::from_secs(600));
        clock.advance(Duration::from_secs(10));

        let mut sweeper = ExpirySweeper::with_interval(cache.clone(), Duration::from_millis(10));
        sweeper.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key("fresh"));

        sweeper.stop().await.unwrap();
        assert!(!sweeper.is_running().await);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let (cache, _) = mock_cache();
        let mut sweeper = ExpirySweeper::with_interval(cache, Duration::from_secs(60));

        sweeper.start().await.unwrap();
        assert!(matches!(sweeper.start().await, Err(CommonError::Config { .. })));
        sweeper.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_when_idle_is_rejected() {
        let (cache, _) = mock_cache();
        let mut sweeper = ExpirySweeper::new(cache);
        assert!(matches!(sweeper.stop().await, Err(CommonError::Config { .. })));
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (cache, _) = mock_cache();
        let mut sweeper = ExpirySweeper::with_interval(cache, Duration::ZERO);
        assert!(sweeper.start().await.is_err());
    }

    #[test]
    fn sweep_once_runs_synchronously() {
        let (cache, clock) = mock_cache();
        cache.set("a", 1, Duration::from_secs(1));
        clock.advance(Duration::from_secs(1));

        let sweeper = ExpirySweeper::new(cache.clone());
        assert_eq!(sweeper.sweep_once(), 1);
        assert!(cache.is_empty());
    }
}
