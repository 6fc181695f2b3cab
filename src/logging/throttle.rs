//! Rate-limited logging.

use std::time::{Duration, Instant};

/// Allows one log line per interval and counts the ones it holds back.
#[derive(Debug)]
pub struct LogThrottle {
    last_emitted: Option<Instant>,
    suppressed: u64,
    interval: Duration,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_emitted: None,
            suppressed: 0,
            interval,
        }
    }

    /// Returns true when a line may be emitted now. The first call always passes;
    /// refused calls are counted.
    pub fn should_log(&mut self) -> bool {
        let now = Instant::now();
        let due = self
            .last_emitted
            .map_or(true, |last| now.duration_since(last) >= self.interval);

        if due {
            self.last_emitted = Some(now);
        } else {
            self.suppressed += 1;
        }
        due
    }

    /// Number of refused calls since the last reset.
    pub fn get_and_reset_suppressed_count(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }
}
