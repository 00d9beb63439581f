use std::time::Duration;

/// Fixed-breakpoint poll cadence keyed on time since the session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub slow_phase_end: Duration,
    pub medium_phase_end: Duration,
    pub slow_interval: Duration,
    pub medium_interval: Duration,
    pub fast_interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            slow_phase_end: Duration::from_secs(90),
            medium_phase_end: Duration::from_secs(180),
            slow_interval: Duration::from_secs(15),
            medium_interval: Duration::from_secs(8),
            fast_interval: Duration::from_secs(3),
        }
    }
}

impl PollSchedule {
    pub fn next_delay(&self, elapsed: Duration) -> Duration {
        if elapsed < self.slow_phase_end {
            self.slow_interval
        } else if elapsed < self.medium_phase_end {
            self.medium_interval
        } else {
            self.fast_interval
        }
    }
}

/// Delay in milliseconds before the next poll, using the default schedule.
pub fn next_delay(elapsed_ms: u64) -> u64 {
    let delay = PollSchedule::default().next_delay(Duration::from_millis(elapsed_ms));
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
