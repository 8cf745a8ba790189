/// Sample and report timing
///
/// The scheduler runs in one of two modes, re-evaluated on every tick:
/// - wall-clock aligned: one sample per minute boundary, one report whenever the
///   minute of the hour is a multiple of the report interval
/// - monotonic fallback: one sample every `sample_interval`, one report when the
///   buffer has filled up
use std::time::{Duration, Instant};

use log::info;
use time::OffsetDateTime;

use crate::config::ScheduleConfig;
use crate::utils::minute_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    WallClock,
    MonotonicFallback,
}

/// Timing state carried between ticks. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    last_sample_at: Option<Instant>,
    /// Minute key of the last wall-clock report, suppresses a second report in the same minute
    last_reported_minute: Option<i64>,
    last_fallback_report_at: Option<Instant>,
    mode: ScheduleMode,
}

impl Default for ScheduleState {
    fn default() -> Self {
        ScheduleState {
            last_sample_at: None,
            last_reported_minute: None,
            last_fallback_report_at: None,
            mode: ScheduleMode::MonotonicFallback,
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    report_interval_minutes: u8,
    sample_interval: Duration,
    state: ScheduleState,
}

impl Scheduler {
    pub fn new(config: &ScheduleConfig) -> Self {
        Scheduler {
            report_interval_minutes: config.report_interval_minutes,
            sample_interval: config.sample_interval,
            state: ScheduleState::default(),
        }
    }

    /// Pick the mode for this tick from the clock's current answer
    pub fn update_mode(&mut self, wall: Option<OffsetDateTime>) -> ScheduleMode {
        let mode = match wall {
            Some(_) => ScheduleMode::WallClock,
            None => ScheduleMode::MonotonicFallback,
        };
        if mode != self.state.mode {
            info!("Scheduler switching from {:?} to {:?}", self.state.mode, mode);
            self.state.mode = mode;
        }
        mode
    }

    /// Whether a new sample should be taken on this tick
    pub fn sample_due(&self, now: Instant, wall: Option<OffsetDateTime>) -> bool {
        let Some(last) = self.state.last_sample_at else {
            return true;
        };
        let since_last = now.saturating_duration_since(last);

        match wall {
            // The last sample's wall time is derived from the monotonic gap, so a
            // sample taken in fallback mode still counts for its minute.
            Some(wall) => minute_key(&wall) != minute_key(&(wall - since_last)),
            None => since_last >= self.sample_interval,
        }
    }

    pub fn record_sample(&mut self, now: Instant) {
        self.state.last_sample_at = Some(now);
    }

    /// Whether a report should be attempted on this tick. A `true` answer is
    /// consumed: the same boundary never triggers twice.
    pub fn take_report_due(
        &mut self,
        now: Instant,
        wall: Option<OffsetDateTime>,
        buffer_full: bool,
    ) -> bool {
        match wall {
            Some(wall) => {
                let key = minute_key(&wall);
                let aligned = wall.minute() % self.report_interval_minutes == 0;
                if !aligned || self.state.last_reported_minute == Some(key) {
                    return false;
                }
                self.state.last_reported_minute = Some(key);
                true
            }
            None => {
                if !buffer_full {
                    return false;
                }
                // A full buffer whose delivery keeps failing is retried once per
                // sample interval, not on every tick.
                let retry_ready = self
                    .state
                    .last_fallback_report_at
                    .map_or(true, |last| {
                        now.saturating_duration_since(last) >= self.sample_interval
                    });
                if retry_ready {
                    self.state.last_fallback_report_at = Some(now);
                }
                retry_ready
            }
        }
    }
}
