//! Event sinks.

use crate::events::ChannelEvent;
use crate::ports::EventPublisher;
use bridge_telemetry::{log_channel_event, log_event};
use parking_lot::RwLock;

/// Records every event in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<ChannelEvent>>,
}

impl InMemoryEventLog {
    /// Create empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events so far.
    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events.read().clone()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Count events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&ChannelEvent) -> bool) -> usize {
        self.events.read().iter().filter(|e| predicate(e)).count()
    }
}

impl EventPublisher for InMemoryEventLog {
    fn publish(&self, event: ChannelEvent) {
        self.events.write().push(event);
    }
}

/// Writes events as structured log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, event: ChannelEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_default();
        match event.channel() {
            Some(channel) => {
                log_channel_event!(info, "events", "Channel event", channel, event = %payload)
            }
            None => log_event!(info, "events", "Bridge event", event = %payload),
        }
    }
}
