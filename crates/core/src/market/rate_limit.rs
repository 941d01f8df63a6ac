use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_MAX_CALLS: usize = 5;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Rolling-window limiter shared by every ticker: at most `max_calls` recorded calls in any
/// trailing `window`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_calls: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS, DEFAULT_WINDOW)
    }
}

impl SlidingWindowLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls: Mutex::new(VecDeque::with_capacity(max_calls.max(1))),
        }
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    /// Waits until the window admits another call, then records it. Returns the total time
    /// spent waiting.
    ///
    /// Prune, check and record happen under one lock so concurrent callers cannot over-admit.
    /// The lock is released while sleeping.
    pub async fn acquire(&self) -> Duration {
        let mut waited = Duration::ZERO;
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                self.prune(&mut calls, now);

                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return waited;
                }
                let oldest = calls.front().copied().unwrap_or(now);
                self.window.saturating_sub(now.duration_since(oldest))
            };

            tracing::info!(
                wait_ms = wait.as_millis() as u64,
                max_calls = self.max_calls,
                "market data rate limit reached; waiting"
            );
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }

    /// Calls currently inside the window.
    pub async fn recorded(&self) -> usize {
        let mut calls = self.calls.lock().await;
        self.prune(&mut calls, Instant::now());
        calls.len()
    }

    pub async fn is_saturated(&self) -> bool {
        self.recorded().await >= self.max_calls
    }

    pub async fn reset(&self) {
        self.calls.lock().await.clear();
    }

    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = calls.front() {
            if now.duration_since(*oldest) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn sixth_rapid_call_waits_for_window() {
        let limiter = SlidingWindowLimiter::default();
        let start = Instant::now();
        for _ in 0..5 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
        assert!(limiter.is_saturated().await);

        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::from_secs(60));
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(limiter.recorded().await <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_measured_from_oldest_call() {
        let limiter = SlidingWindowLimiter::default();
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(20)).await;
        for _ in 0..4 {
            limiter.acquire().await;
        }
        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::from_secs(40));
        // The first call aged out; the four from t=20s remain plus this one.
        assert_eq!(limiter.recorded().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn old_calls_expire() {
        let limiter = SlidingWindowLimiter::default();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.recorded().await, 0);
        assert_eq!(limiter.acquire().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_never_over_admit() {
        let limiter = Arc::new(SlidingWindowLimiter::default());
        let start = Instant::now();
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            set.spawn(async move {
                limiter.acquire().await;
                start.elapsed()
            });
        }

        let mut immediate = 0;
        while let Some(res) = set.join_next().await {
            if res.unwrap() < Duration::from_secs(60) {
                immediate += 1;
            }
        }
        assert_eq!(immediate, 5);
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let limiter = SlidingWindowLimiter::new(2, Duration::from_secs(60));
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(limiter.is_saturated().await);
        limiter.reset().await;
        assert_eq!(limiter.recorded().await, 0);
    }
}
