//! Notification sinks.

use std::sync::Mutex;

use super::event::TransitionEvent;
use super::logger::{Logger, Severity};

/// Receiver of lifecycle transition events.
///
/// Sinks are fire-and-forget: `notify` is infallible and must not block.
/// Failure to deliver downstream never rolls back the transition.
pub trait NotificationSink: Send + Sync {
    /// Receive one committed transition.
    fn notify(&self, event: &TransitionEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: &TransitionEvent) {}
}

/// Sink that emits one structured log line per transition.
///
/// Transitions that carry a reason are refusals (rejections, refused
/// deletions); those surface at WARN so operators can scan for them.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    fn severity_for(event: &TransitionEvent) -> Severity {
        if event.reason.is_some() {
            Severity::Warn
        } else {
            Severity::Info
        }
    }
}

impl NotificationSink for LogSink {
    fn notify(&self, event: &TransitionEvent) {
        let entity_id = event.entity_id.to_string();
        let mut fields: Vec<(&str, &str)> = vec![
            ("entity", event.entity.as_str()),
            ("entity_id", &entity_id),
            ("from", &event.from),
            ("to", &event.to),
        ];
        if let Some(reason) = &event.reason {
            fields.push(("reason", reason));
        }
        match Self::severity_for(event) {
            Severity::Warn => Logger::warn(&event.wire_name(), &fields),
            _ => Logger::info(&event.wire_name(), &fields),
        }
    }
}

/// Sink that records events in arrival order, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TransitionEvent>>,
}

impl MemorySink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Check if no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, event: &TransitionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
