//! Consumers of the events relayed by each poll.

use tracing::{debug, trace};

use super::types::SocialEvent;

/// Receives the batch of events produced by one poll.
///
/// Called with the registry guard held, so implementations must not call
/// back into the [`SocialManager`](super::SocialManager).
pub trait SocialEventSink: Send + Sync {
    /// Handles one tick's events, in service order. `events` may be empty.
    fn on_events(&self, events: &[SocialEvent]);
}

/// Sink that writes every event to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl SocialEventSink for TracingEventSink {
    fn on_events(&self, events: &[SocialEvent]) {
        if events.is_empty() {
            trace!("no social events this tick");
            return;
        }

        for event in events {
            debug!(
                event_type = event.event_type.as_str(),
                user = %event.user,
                affected = event.affected_ids.len(),
                error = event.error.as_deref().unwrap_or(""),
                "social event"
            );
        }
    }
}
