//! Poll instrumentation.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Counters describing the ticks polled so far.
///
/// Ticks that produced events and ticks that produced none are counted
/// separately so the two paths can be timed apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    /// Total polls.
    pub ticks: u64,
    /// Polls that returned at least one event.
    pub ticks_with_updates: u64,
    /// Polls that returned nothing.
    pub ticks_without_updates: u64,
    /// Events relayed across all polls.
    pub events_relayed: u64,
    /// When the last poll finished.
    pub last_poll_at: Option<DateTime<Utc>>,
    /// How long the last service poll took.
    pub last_poll_duration: Option<Duration>,
}

impl PollStats {
    /// Records one poll that returned `event_count` events.
    pub fn record(&mut self, event_count: usize, duration: Duration) {
        self.ticks += 1;
        if event_count == 0 {
            self.ticks_without_updates += 1;
        } else {
            self.ticks_with_updates += 1;
        }
        self.events_relayed += event_count as u64;
        self.last_poll_at = Some(Utc::now());
        self.last_poll_duration = Some(duration);
    }
}
