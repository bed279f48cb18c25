//! Request Throttle
//!
//! Cooperative rate limiting for calls to the document API. One throttle is
//! shared by every sweep task; `acquire` waits for the next free slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Default admission rate for the document API
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

/// Shared ticker admitting at most N requests per second
#[derive(Debug)]
pub struct Throttle {
    period: Option<Duration>,
    // Created on first use so the throttle can be built outside a runtime
    ticker: Mutex<Option<Interval>>,
    acquired: AtomicU64,
}

impl Throttle {
    /// Throttle admitting `requests_per_second` calls; `0` disables limiting
    pub fn new(requests_per_second: u32) -> Self {
        let period = (requests_per_second > 0)
            .then(|| Duration::from_secs(1) / requests_per_second);
        Self {
            period,
            ticker: Mutex::new(None),
            acquired: AtomicU64::new(0),
        }
    }

    /// Throttle that never waits
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Minimum spacing between admitted calls
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Wait until a request slot is free
    pub async fn acquire(&self) {
        if let Some(period) = self.period {
            let mut guard = self.ticker.lock().await;
            let ticker = guard.get_or_insert_with(|| {
                let mut ticker = interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker
            });
            ticker.tick().await;
        }
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of slots handed out so far
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_SECOND)
    }
}
