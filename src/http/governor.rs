//! Minimum-spacing gate in front of every API call of a session.

use log::debug;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Documented API budget.
pub const DEFAULT_CALLS_PER_MINUTE: u32 = 60;

/// Spaces call starts at least `min_interval` apart.
///
/// The lock is held while waiting, so concurrent callers sharing one governor
/// are serialized and each one measures from the previous caller's actual
/// start time rather than from a precomputed schedule.
#[derive(Debug)]
pub struct RateGovernor {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Governor for a per-minute call budget (60/min gives 1s spacing).
    pub fn per_minute(calls: u32) -> Self {
        Self::new(interval_for(calls))
    }

    /// Waits until the next call may start, then records its start time.
    /// Never fails; it only delays.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                debug!(
                    "Rate governor: waiting {:?} before next call",
                    ready_at - Instant::now()
                );
                sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

/// Spacing needed to stay within `calls` per minute.
pub fn interval_for(calls: u32) -> Duration {
    Duration::from_secs(60) / calls.max(1)
}
