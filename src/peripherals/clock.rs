use std::time::Duration;

use log::{info, warn};
use time::macros::datetime;
use time::OffsetDateTime;
use tokio::time::{sleep, Instant};

use crate::utils::format_datetime;

/// Anything earlier than this means the clock has not been set since boot
const SYNC_EPOCH: OffsetDateTime = datetime!(2025-01-01 00:00:00 UTC);
const SYNC_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Wall-clock time source. `None` means time is not synchronized.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> Option<OffsetDateTime>;
}

/// OS clock, trusted once it has been set past a sanity epoch
#[derive(Debug, Clone)]
pub struct SystemClock {
    sync_epoch: OffsetDateTime,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            sync_epoch: SYNC_EPOCH,
        }
    }

    /// Block until the clock looks synchronized or `timeout` runs out.
    ///
    /// Returns false on timeout; the engine then starts in fallback mode and
    /// picks up wall-clock alignment whenever the clock recovers.
    pub async fn wait_for_sync(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(now) = self.now() {
                info!("Clock synchronized: {}", format_datetime(&now));
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "Clock not synchronized after {}s, starting in fallback mode",
                    timeout.as_secs()
                );
                return false;
            }
            sleep(SYNC_POLL_INTERVAL).await;
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn now(&self) -> Option<OffsetDateTime> {
        let now = OffsetDateTime::now_utc();
        (now >= self.sync_epoch).then_some(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_clock_reports_unknown() {
        let clock = SystemClock {
            sync_epoch: OffsetDateTime::now_utc() + Duration::from_secs(3600),
        };
        assert_eq!(clock.now(), None);
    }

    #[tokio::test]
    async fn wait_gives_up_after_timeout() {
        let clock = SystemClock {
            sync_epoch: OffsetDateTime::now_utc() + Duration::from_secs(3600),
        };
        assert!(!clock.wait_for_sync(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn synced_clock_returns_immediately() {
        let clock = SystemClock::new();
        assert!(clock.now().is_some());
        assert!(clock.wait_for_sync(Duration::from_secs(1)).await);
    }
}
