//! Where a recognition session publishes what it confirms.
//!
//! Sessions only see `EventBusRef`. A UI shell forwards topics to its
//! frontend, the replay CLI prints them, and tests record them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

/// Sink for recognition events such as confirmed symbols, text edits and control changes.
pub trait EventBus: Send + Sync {
    /// Publish `payload` under `topic` (one of [`crate::event_names`]).
    fn emit(&self, topic: &str, payload: serde_json::Value);
}

pub type EventBusRef = Arc<dyn EventBus>;

/// Serialize a DTO and emit it. Serialization failures are logged, not propagated.
pub fn emit_event<T: Serialize>(bus: &dyn EventBus, topic: &str, event: &T) {
    match serde_json::to_value(event) {
        Ok(payload) => bus.emit(topic, payload),
        Err(e) => tracing::warn!(topic, error = %e, "Failed to serialize event payload"),
    }
}

/// One event as a session published it.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Keeps every published event in order, for assertions on what a session emitted.
#[derive(Default)]
pub struct RecordingEventBus {
    log: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log().clone()
    }

    /// Events published under `topic`, oldest first.
    pub fn events_for(&self, topic: &str) -> Vec<RecordedEvent> {
        self.log()
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    /// Topics in emission order.
    pub fn topics(&self) -> Vec<String> {
        self.log().iter().map(|e| e.topic.clone()).collect()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    // A panicking emitter leaves the log intact.
    fn log(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventBus for RecordingEventBus {
    fn emit(&self, topic: &str, payload: serde_json::Value) {
        self.log().push(RecordedEvent {
            topic: topic.to_string(),
            payload,
        });
    }
}
