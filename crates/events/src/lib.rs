//! Event contracts published by a recognition session.
//!
//! Shared DTOs keep producers and UI consumers agreeing on field names.
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{emit_event, EventBus, EventBusRef, RecordedEvent, RecordingEventBus};

use serde::{Deserialize, Serialize};
use signa_context::{CameraFacing, RecognitionMode};
use uuid::Uuid;

/// Current wall-clock time in milliseconds since epoch, for event timestamps.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What kind of output the stabilizer confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmedKind {
    Symbol,
    Phrase,
    WordBreak,
}

/// Event emitted when the stabilizer confirms a symbol, phrase or word break.
///
/// Producers: recognition session
/// Consumers: UI, replay CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedEvent {
    pub session_id: Uuid,
    pub kind: ConfirmedKind,
    /// Confirmed text. Absent for word breaks.
    #[serde(default)]
    pub text: Option<String>,
    pub mode: RecognitionMode,
    /// Frame timestamp the confirmation happened at.
    pub frame_ts_ms: u64,
    /// Wall-clock timestamp in milliseconds since epoch.
    #[serde(default)]
    pub ts_ms: i64,
}

/// Event emitted whenever the translated text changes.
///
/// Producers: recognition session
/// Consumers: UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChangedEvent {
    pub session_id: Uuid,
    /// Committed text.
    pub text: String,
    /// Letters of the word still being signed.
    #[serde(default)]
    pub pending_word: String,
    /// What the UI should render.
    pub display_text: String,
    #[serde(default)]
    pub ts_ms: i64,
}

/// Event emitted when the user switches recognition mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeChangedEvent {
    pub session_id: Uuid,
    pub mode: RecognitionMode,
    pub previous: RecognitionMode,
    #[serde(default)]
    pub ts_ms: i64,
}

/// Event emitted when the user switches camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacingChangedEvent {
    pub session_id: Uuid,
    pub facing: CameraFacing,
    pub previous: CameraFacing,
    #[serde(default)]
    pub ts_ms: i64,
}

/// Event emitted when recognition keeps running without a working classifier.
///
/// Producers: recognition listener
/// Consumers: UI (shows a degraded-mode banner)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedEvent {
    pub session_id: Uuid,
    /// Classifier name.
    pub classifier: String,
    /// Error message.
    pub reason: String,
    #[serde(default)]
    pub ts_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Stabilizer confirmed a symbol, phrase or word break.
    pub const CONFIRMED: &str = "recognition:confirmed";
    /// Translated text changed.
    pub const TEXT_CHANGED: &str = "recognition:text_changed";
    /// Recognition mode toggled.
    pub const MODE_CHANGED: &str = "control:mode_changed";
    /// Camera facing toggled.
    pub const FACING_CHANGED: &str = "control:facing_changed";
    /// Classifier unavailable.
    pub const DEGRADED: &str = "pipeline:degraded";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_event_serialize() {
        let event = ConfirmedEvent {
            session_id: Uuid::nil(),
            kind: ConfirmedKind::WordBreak,
            text: None,
            mode: RecognitionMode::Letter,
            frame_ts_ms: 3001,
            ts_ms: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "word_break");
        assert_eq!(json["mode"], "letter");
        assert_eq!(json["frame_ts_ms"], 3001);
        assert!(json["text"].is_null());
    }

    #[test]
    fn test_text_changed_deserialize_minimal() {
        let json = r#"{
            "session_id": "00000000-0000-0000-0000-000000000000",
            "text": "hello",
            "display_text": "hello"
        }"#;
        let event: TextChangedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.text, "hello");
        assert!(event.pending_word.is_empty());
        assert_eq!(event.ts_ms, 0);
    }

    #[test]
    fn test_mode_changed_round_trip() {
        let json = r#"{
            "session_id": "00000000-0000-0000-0000-000000000000",
            "mode": "phrase",
            "previous": "letter"
        }"#;
        let event: ModeChangedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.mode, RecognitionMode::Phrase);
        assert_eq!(event.previous, RecognitionMode::Letter);
    }

    #[test]
    fn test_now_ms_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_ms() > 1_577_836_800_000);
    }
}
