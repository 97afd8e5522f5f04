// Request pacing
//
// All deliberate waits in the pipeline (retry backoff, per-call pacing, the
// pause between translation batches) go through a `Sleeper`, so tests can
// record the schedule instead of waiting for it.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Suspends the current task for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Gate in front of a rate-limited service.
///
/// Callers record a wait after each event (`defer`) and pay it right before
/// the next outgoing call (`ready`). Nothing is paid after the final call.
pub struct RequestPacer {
    sleeper: Arc<dyn Sleeper>,
    pending: Duration,
    total_waited: Duration,
}

impl RequestPacer {
    pub fn new(sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            sleeper,
            pending: Duration::ZERO,
            total_waited: Duration::ZERO,
        }
    }

    /// Add a wait that must elapse before the next call
    pub fn defer(&mut self, duration: Duration) {
        self.pending += duration;
    }

    /// Pay any outstanding wait
    pub async fn ready(&mut self) {
        if self.pending.is_zero() {
            return;
        }
        let wait = std::mem::take(&mut self.pending);
        debug!("Pacing: waiting {:?} before next request", wait);
        self.sleeper.sleep(wait).await;
        self.total_waited += wait;
    }

    pub fn pending(&self) -> Duration {
        self.pending
    }

    pub fn total_waited(&self) -> Duration {
        self.total_waited
    }
}

/// Uniformly random duration in `[min_ms, max_ms]`
pub fn jitter(min_ms: u64, max_ms: u64) -> Duration {
    if min_ms >= max_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    #[tokio::test]
    async fn test_pacer_pays_accumulated_wait_once() {
        let sleeper = RecordingSleeper::new();
        let mut pacer = RequestPacer::new(sleeper.clone());

        pacer.ready().await;
        assert!(sleeper.slept().is_empty());

        pacer.defer(Duration::from_millis(200));
        pacer.defer(Duration::from_millis(3000));
        assert_eq!(pacer.pending(), Duration::from_millis(3200));

        pacer.ready().await;
        pacer.ready().await;
        assert_eq!(sleeper.slept(), vec![Duration::from_millis(3200)]);
        assert_eq!(pacer.pending(), Duration::ZERO);
        assert_eq!(pacer.total_waited(), Duration::from_millis(3200));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..100 {
            let d = jitter(3000, 5000);
            assert!(d >= Duration::from_millis(3000) && d <= Duration::from_millis(5000));
        }
        assert_eq!(jitter(10, 10), Duration::from_millis(10));
    }
}
