use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Spaces successive upstream calls at least `min_interval` apart.
///
/// The first `acquire()` returns immediately; later calls wait until
/// `min_interval` has elapsed since the previous one completed.
pub struct MinIntervalLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let wait = ready_at.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                tracing::trace!("Rate limiter waiting {:?}", wait);
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}
