//! Shared, event-publishing access to a recognition session.

use std::sync::Arc;

use signa_classifier::Detection;
use signa_context::{CameraFacing, RecognitionMode};
use signa_events::{
    emit_event, event_names, now_ms, ConfirmedEvent, ConfirmedKind, DegradedEvent, EventBusRef,
    FacingChangedEvent, ModeChangedEvent, TextChangedEvent,
};
use signa_stabilizer::{Event, Timestamp};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::session::{RecognitionSession, SessionSnapshot};

/// Result of applying a classification that may have been overtaken by a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Applied(Option<Event>),
    /// The session was reset after the frame was dispatched.
    Stale,
}

/// Cloneable handle used by the UI and the recognition listener.
///
/// Events are emitted while the session lock is held, so subscribers see
/// them in the same order as the state transitions.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<RecognitionSession>>,
    events: EventBusRef,
    session_id: Uuid,
}

impl SessionHandle {
    pub fn new(session: RecognitionSession, events: EventBusRef) -> Self {
        let session_id = session.id();
        Self {
            session: Arc::new(Mutex::new(session)),
            events,
            session_id,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn generation(&self) -> u64 {
        self.session.lock().await.generation()
    }

    pub async fn facing(&self) -> CameraFacing {
        self.session.lock().await.facing()
    }

    pub async fn mode(&self) -> RecognitionMode {
        self.session.lock().await.mode()
    }

    /// Feed one processed frame and publish whatever it confirms.
    pub async fn process_detection(
        &self,
        detection: Option<Detection>,
        now: Timestamp,
    ) -> Option<Event> {
        let mut session = self.session.lock().await;
        self.apply(&mut session, detection, now)
    }

    /// Like `process_detection`, but only if no reset happened since `generation` was read.
    pub async fn process_detection_at(
        &self,
        generation: u64,
        detection: Option<Detection>,
        now: Timestamp,
    ) -> FrameOutcome {
        let mut session = self.session.lock().await;
        if session.generation() != generation {
            tracing::debug!(
                expected = generation,
                current = session.generation(),
                now,
                "Discarding stale classification"
            );
            return FrameOutcome::Stale;
        }
        FrameOutcome::Applied(self.apply(&mut session, detection, now))
    }

    pub async fn toggle_mode(&self) -> RecognitionMode {
        let mut session = self.session.lock().await;
        let previous = session.mode();
        let had_text = !session.text().is_empty();
        let mode = session.toggle_mode();

        emit_event(
            self.events.as_ref(),
            event_names::MODE_CHANGED,
            &ModeChangedEvent {
                session_id: self.session_id,
                mode,
                previous,
                ts_ms: now_ms(),
            },
        );
        if had_text {
            self.emit_text_changed(&session);
        }
        mode
    }

    pub async fn toggle_facing(&self) -> CameraFacing {
        let mut session = self.session.lock().await;
        let previous = session.facing();
        let facing = session.toggle_facing();

        emit_event(
            self.events.as_ref(),
            event_names::FACING_CHANGED,
            &FacingChangedEvent {
                session_id: self.session_id,
                facing,
                previous,
                ts_ms: now_ms(),
            },
        );
        facing
    }

    pub async fn clear(&self) {
        let mut session = self.session.lock().await;
        let had_text = !session.text().is_empty();
        session.clear();
        if had_text {
            self.emit_text_changed(&session);
        }
    }

    pub async fn delete_last(&self) -> Option<char> {
        let mut session = self.session.lock().await;
        let removed = session.delete_last();
        if removed.is_some() {
            self.emit_text_changed(&session);
        }
        removed
    }

    /// Publish that recognition continues without a working classifier.
    pub fn report_degraded(&self, classifier: &str, reason: &str) {
        tracing::warn!(session_id = %self.session_id, classifier, reason, "Recognition degraded");
        emit_event(
            self.events.as_ref(),
            event_names::DEGRADED,
            &DegradedEvent {
                session_id: self.session_id,
                classifier: classifier.to_string(),
                reason: reason.to_string(),
                ts_ms: now_ms(),
            },
        );
    }

    fn apply(
        &self,
        session: &mut RecognitionSession,
        detection: Option<Detection>,
        now: Timestamp,
    ) -> Option<Event> {
        let event = session.process_frame(detection, now)?;
        let mode = session.mode();
        let (kind, text) = match &event {
            Event::Symbol(s) => (ConfirmedKind::Symbol, Some(s.clone())),
            Event::Phrase(s) => (ConfirmedKind::Phrase, Some(s.clone())),
            Event::WordBreak => (ConfirmedKind::WordBreak, None),
        };

        emit_event(
            self.events.as_ref(),
            event_names::CONFIRMED,
            &ConfirmedEvent {
                session_id: self.session_id,
                kind,
                text,
                mode,
                frame_ts_ms: now,
                ts_ms: now_ms(),
            },
        );
        self.emit_text_changed(session);
        Some(event)
    }

    fn emit_text_changed(&self, session: &RecognitionSession) {
        let text = session.text().snapshot();
        emit_event(
            self.events.as_ref(),
            event_names::TEXT_CHANGED,
            &TextChangedEvent {
                session_id: self.session_id,
                text: text.text,
                pending_word: text.pending_word,
                display_text: text.display,
                ts_ms: now_ms(),
            },
        );
    }
}
