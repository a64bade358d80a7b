//! One recognition session: controls, stabilizer and translated text.
//!
//! All state lives behind `&mut self`, so every control action is atomic
//! for whoever holds the session (see `SessionHandle`).

use serde::{Deserialize, Serialize};
use signa_classifier::Detection;
use signa_context::{CameraFacing, ControlState, RecognitionMode};
use signa_stabilizer::{Event, Stabilizer, StabilizerConfig, Timestamp};
use signa_text::TextAccumulator;
use uuid::Uuid;

use crate::settings::RecognitionSettings;

/// Read-only view of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: RecognitionMode,
    pub facing: CameraFacing,
    /// Committed text.
    pub text: String,
    pub pending_word: String,
    pub display_text: String,
    /// Last classifier output, for on-screen feedback.
    pub current_prediction: Option<Detection>,
    pub generation: u64,
}

pub struct RecognitionSession {
    id: Uuid,
    control: ControlState,
    stabilizer: Stabilizer,
    text: TextAccumulator,
    current_prediction: Option<Detection>,
    /// Bumped by every action that resets recognition state.
    generation: u64,
}

impl RecognitionSession {
    pub fn new(config: StabilizerConfig, control: ControlState) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, mode = %control.mode, facing = %control.facing, "Created recognition session");
        Self {
            id,
            control,
            stabilizer: Stabilizer::new(config, control.mode),
            text: TextAccumulator::new(),
            current_prediction: None,
            generation: 0,
        }
    }

    pub fn from_settings(settings: &RecognitionSettings) -> Self {
        Self::new(
            settings.stabilizer,
            ControlState::new(settings.initial_mode, settings.initial_facing),
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> RecognitionMode {
        self.control.mode
    }

    pub fn facing(&self) -> CameraFacing {
        self.control.facing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn text(&self) -> &TextAccumulator {
        &self.text
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn current_prediction(&self) -> Option<&Detection> {
        self.current_prediction.as_ref()
    }

    /// Feed one processed frame. `None` means no subject was detected.
    ///
    /// A confirmed event is applied to the text before it is returned.
    /// Frames older than the last accepted one leave the session untouched.
    pub fn process_frame(&mut self, detection: Option<Detection>, now: Timestamp) -> Option<Event> {
        if !self.stabilizer.accepts_frame_at(now, self.control.mode) {
            tracing::debug!(session_id = %self.id, now, "Ignoring out-of-order frame");
            return None;
        }

        let prediction = detection.as_ref().map(|d| d.prediction.clone());
        self.current_prediction = detection;

        let event = self
            .stabilizer
            .process(prediction, now, self.control.mode, &self.text)?;

        self.text.apply(&event);
        tracing::debug!(session_id = %self.id, ?event, now, "Applied confirmed event");
        Some(event)
    }

    /// Switch mode. Text and stabilizer state from the old mode are discarded.
    pub fn toggle_mode(&mut self) -> RecognitionMode {
        let mode = self.control.toggle_mode();
        self.text.clear();
        self.stabilizer.switch_mode(mode);
        self.current_prediction = None;
        self.generation += 1;
        mode
    }

    /// Switch camera. Recognition state is kept.
    pub fn toggle_facing(&mut self) -> CameraFacing {
        self.control.toggle_facing()
    }

    /// Empty the text and restart recognition under the current mode.
    pub fn clear(&mut self) {
        self.text.clear();
        self.stabilizer.reset();
        self.current_prediction = None;
        self.generation += 1;
    }

    /// Remove the last character. The last confirmed symbol may then be
    /// confirmed again right away.
    pub fn delete_last(&mut self) -> Option<char> {
        let removed = self.text.delete_last();
        self.stabilizer.forget_last_confirmed();
        self.generation += 1;
        removed
    }

    /// Text added by the most recent confirmation (consumed on read).
    pub fn take_last_committed_delta(&mut self) -> Option<String> {
        self.text.take_last_committed_delta()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let text = self.text.snapshot();
        SessionSnapshot {
            session_id: self.id,
            mode: self.control.mode,
            facing: self.control.facing,
            text: text.text,
            pending_word: text.pending_word,
            display_text: text.display,
            current_prediction: self.current_prediction.clone(),
            generation: self.generation,
        }
    }
}

impl Default for RecognitionSession {
    fn default() -> Self {
        Self::new(StabilizerConfig::default(), ControlState::default())
    }
}
