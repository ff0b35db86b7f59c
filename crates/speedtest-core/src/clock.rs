//! Server clock.
//!
//! Wall-clock milliseconds since the Unix epoch, sampled once at startup and
//! advanced with a monotonic `Instant`. Timestamps handed to clients therefore
//! never step backwards within one process, even if the system clock does.
//! No ordering is promised across restarts.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy)]
pub struct ServerClock {
    anchor_ms: i64,
    anchor: Instant,
}

impl Default for ServerClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerClock {
    pub fn new() -> Self {
        Self {
            anchor_ms: wall_ms(),
            anchor: Instant::now(),
        }
    }

    /// Current server time in Unix milliseconds.
    pub fn now_ms(&self) -> i64 {
        self.at_ms(Instant::now())
    }

    /// Server time of an `Instant` captured earlier in this process.
    pub fn at_ms(&self, instant: Instant) -> i64 {
        let offset = instant.saturating_duration_since(self.anchor).as_millis();
        self.anchor_ms + offset as i64
    }
}

fn wall_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
