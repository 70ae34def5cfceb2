//! A shared pacing gate that keeps outgoing RPC requests below the
//! endpoint's request-per-second allowance.

use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{self, Interval, MissedTickBehavior},
};

/// Spaces callers at least `min_interval` apart. Cheap to share behind an
/// `Arc`; all requests through a client funnel through one gate.
pub struct RateLimitGate {
    interval: Mutex<Interval>,
}

impl RateLimitGate {
    /// Creates a new gate with the given minimum spacing between requests.
    pub fn new(min_interval: Duration) -> Self {
        // tokio intervals reject a zero period.
        let period = min_interval.max(Duration::from_millis(1));
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval: Mutex::new(interval) }
    }

    /// Waits until the next request slot is available. The first call
    /// completes immediately.
    pub async fn acquire(&self) {
        self.interval.lock().await.tick().await;
    }
}
