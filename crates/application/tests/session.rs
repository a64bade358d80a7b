//! Integration tests for recognition sessions.
//!
//! Drive `RecognitionSession` and `SessionHandle` with scripted frames the
//! way a camera loop would.

use std::io::Write;
use std::sync::Arc;

use signa_application::{
    load_settings, InvalidSettings, RecognitionSession, SessionHandle, SettingsError,
};
use signa_classifier::Detection;
use signa_context::{ControlState, RecognitionMode};
use signa_events::{event_names, RecordingEventBus};
use signa_stabilizer::{Event, Prediction, StabilizerConfig, Timestamp};

fn seen(symbol: &str, confidence: f32) -> Option<Detection> {
    Some(Detection::new(Prediction::new(symbol, confidence)))
}

/// Hold `symbol` at 0.9 confidence on every 100ms frame in `[from, to]`.
fn hold(
    session: &mut RecognitionSession,
    symbol: &str,
    from: Timestamp,
    to: Timestamp,
) -> Vec<Event> {
    (from..=to)
        .step_by(100)
        .filter_map(|t| session.process_frame(seen(symbol, 0.9), t))
        .collect()
}

fn phrase_session() -> RecognitionSession {
    RecognitionSession::new(
        StabilizerConfig::default(),
        ControlState::new(RecognitionMode::Phrase, Default::default()),
    )
}

// =============================================================================
// Letter Mode Tests
// =============================================================================

mod letter_mode {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let mut session = RecognitionSession::default();
        for t in (0..=1000).step_by(100) {
            assert_eq!(session.process_frame(seen("A", 0.55), t), None);
        }

        let events: Vec<_> = (1100..=1600)
            .step_by(100)
            .filter_map(|t| session.process_frame(seen("A", 0.5501), t))
            .collect();
        assert_eq!(events, vec![Event::Symbol("A".into())]);
    }

    #[test]
    fn test_held_letter_confirms_once_at_stability_time() {
        let mut session = RecognitionSession::default();
        let mut confirmed_at = Vec::new();
        for t in (0..=500).step_by(100) {
            if session.process_frame(seen("A", 0.9), t).is_some() {
                confirmed_at.push(t);
            }
        }
        assert_eq!(confirmed_at, vec![500]);
        assert_eq!(session.snapshot().display_text, "A");
    }

    #[test]
    fn test_cooldown_suppresses_then_allows_repeat() {
        let config = StabilizerConfig {
            letter: signa_stabilizer::LetterConfig {
                stability_time_ms: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = RecognitionSession::new(config, ControlState::default());

        assert!(session.process_frame(seen("A", 0.9), 0).is_none());
        assert_eq!(
            session.process_frame(seen("A", 0.9), 100),
            Some(Event::Symbol("A".into()))
        );

        // Stable again at t=300, but only 200ms after the confirmation.
        assert!(session.process_frame(seen("A", 0.9), 200).is_none());
        assert!(session.process_frame(seen("A", 0.9), 300).is_none());
        assert!(session.process_frame(seen("A", 0.9), 900).is_none());
        assert_eq!(
            session.process_frame(seen("A", 0.9), 901),
            Some(Event::Symbol("A".into()))
        );
        assert_eq!(session.snapshot().pending_word, "AA");
    }

    #[test]
    fn test_word_break_fires_once_after_absence() {
        let mut session = RecognitionSession::default();
        assert_eq!(hold(&mut session, "A", 0, 500), vec![Event::Symbol("A".into())]);

        // Last subject seen at t=500.
        assert_eq!(session.process_frame(None, 600), None);
        assert_eq!(session.process_frame(None, 3500), None);
        assert_eq!(session.process_frame(None, 3501), Some(Event::WordBreak));
        assert_eq!(session.process_frame(None, 3502), None);
        assert_eq!(session.process_frame(None, 10_000), None);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.text, "A ");
        assert!(snapshot.pending_word.is_empty());
    }

    #[test]
    fn test_no_word_break_on_empty_text() {
        let mut session = RecognitionSession::default();
        session.process_frame(seen("A", 0.2), 0);
        assert_eq!(session.process_frame(None, 3001), None);
        assert_eq!(session.process_frame(None, 9000), None);
    }

    #[test]
    fn test_spelled_words() {
        let mut session = RecognitionSession::default();
        hold(&mut session, "H", 0, 500);
        hold(&mut session, "I", 600, 1100);
        session.process_frame(None, 1200);
        session.process_frame(None, 4200);
        hold(&mut session, "Y", 4300, 4800);
        hold(&mut session, "O", 4900, 5400);

        assert_eq!(session.snapshot().display_text, "HI YO");
    }
}

// =============================================================================
// Phrase Mode Tests
// =============================================================================

mod phrase_mode {
    use super::*;

    #[test]
    fn test_full_window_confirms_once() {
        let mut session = phrase_session();
        let events: Vec<_> = (0..8)
            .filter_map(|i| session.process_frame(seen("hello", 0.8), i * 33))
            .collect();
        assert_eq!(events, vec![Event::Phrase("hello".into())]);
        assert_eq!(session.snapshot().text, "hello");
    }

    #[test]
    fn test_interrupted_window_does_not_confirm() {
        let mut session = phrase_session();
        for i in 0..7 {
            assert!(session.process_frame(seen("hello", 0.8), i * 33).is_none());
        }
        assert!(session.process_frame(seen("thanks", 0.8), 231).is_none());
        assert!(session.stabilizer().state().recent_window().len() <= 1);
    }

    #[test]
    fn test_phrases_are_space_separated() {
        let mut session = phrase_session();
        for i in 0..8 {
            session.process_frame(seen("hello", 0.8), i * 33);
        }
        for i in 8..16 {
            session.process_frame(seen("friend", 0.8), i * 33);
        }
        assert_eq!(session.snapshot().text, "hello friend");
    }

    #[test]
    fn test_absence_never_breaks_words() {
        let mut session = phrase_session();
        for i in 0..8 {
            session.process_frame(seen("hello", 0.8), i * 33);
        }
        assert_eq!(session.process_frame(None, 10_000), None);
        assert_eq!(session.snapshot().text, "hello");
    }
}

// =============================================================================
// Control Tests
// =============================================================================

mod controls {
    use super::*;

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = RecognitionSession::default();
        hold(&mut session, "A", 0, 500);
        session.process_frame(seen("B", 0.9), 600);

        for _ in 0..2 {
            session.clear();
            let snapshot = session.snapshot();
            assert!(snapshot.display_text.is_empty());
            assert!(session.stabilizer().state().is_pristine());
        }
        assert_eq!(session.mode(), RecognitionMode::Letter);
    }

    #[test]
    fn test_delete_last_then_reconfirm() {
        let mut session = RecognitionSession::default();
        hold(&mut session, "A", 0, 500);
        hold(&mut session, "B", 600, 1100);
        assert_eq!(session.snapshot().display_text, "AB");

        assert_eq!(session.delete_last(), Some('B'));
        assert_eq!(session.snapshot().display_text, "A");
        assert!(session.stabilizer().state().last_confirmed_symbol().is_none());

        assert_eq!(hold(&mut session, "A", 1200, 1700), vec![Event::Symbol("A".into())]);
        assert_eq!(session.snapshot().display_text, "AA");
    }

    #[test]
    fn test_delete_last_skips_cooldown() {
        let mut session = RecognitionSession::default();
        hold(&mut session, "A", 0, 500);
        session.delete_last();

        // Well within the 800ms cooldown of the confirmation at t=500.
        assert_eq!(hold(&mut session, "A", 600, 1100), vec![Event::Symbol("A".into())]);
    }

    #[test]
    fn test_mode_switch_isolation() {
        let mut session = RecognitionSession::default();
        hold(&mut session, "A", 0, 500);
        session.process_frame(seen("A", 0.9), 600);

        assert_eq!(session.toggle_mode(), RecognitionMode::Phrase);

        let state = session.stabilizer().state();
        assert!(state.is_pristine());
        assert!(state.current_stable_symbol().is_none());
        assert!(session.text().is_empty());

        // "A" must need a full window of its own.
        let events: Vec<_> = (0..7)
            .filter_map(|i| session.process_frame(seen("A", 0.9), 700 + i * 33))
            .collect();
        assert!(events.is_empty());
    }

    #[test]
    fn test_replay_is_deterministic() {
        let script: Vec<(Option<(&str, f32)>, Timestamp)> = vec![
            (Some(("A", 0.9)), 0),
            (Some(("A", 0.9)), 250),
            (Some(("A", 0.9)), 500),
            (Some(("B", 0.4)), 600),
            (Some(("B", 0.9)), 700),
            (None, 800),
            (Some(("B", 0.9)), 900),
            (Some(("B", 0.9)), 1400),
            (None, 1500),
            (None, 4500),
        ];

        let run = |session: &mut RecognitionSession| -> Vec<Event> {
            script
                .iter()
                .filter_map(|(p, t)| {
                    session.process_frame(p.and_then(|(s, c)| seen(s, c)), *t)
                })
                .collect()
        };

        let mut session = RecognitionSession::default();
        let first = run(&mut session);
        session.clear();
        let second = run(&mut session);

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                Event::Symbol("A".into()),
                Event::Symbol("B".into()),
                Event::WordBreak
            ]
        );
    }
}

// =============================================================================
// Session Handle Tests
// =============================================================================

mod handle {
    use super::*;

    #[tokio::test]
    async fn test_events_follow_state_transitions() {
        let bus = Arc::new(RecordingEventBus::new());
        let handle = SessionHandle::new(RecognitionSession::default(), bus.clone());

        handle.process_detection(seen("A", 0.9), 0).await;
        handle.process_detection(seen("A", 0.9), 500).await;
        handle.delete_last().await;
        handle.toggle_facing().await;
        handle.toggle_mode().await;

        assert_eq!(
            bus.topics(),
            vec![
                event_names::CONFIRMED,
                event_names::TEXT_CHANGED,
                event_names::TEXT_CHANGED,
                event_names::FACING_CHANGED,
                event_names::MODE_CHANGED,
            ]
        );

        let snapshot = handle.snapshot().await;
        assert_eq!(snapshot.session_id, handle.session_id());
        assert_eq!(snapshot.generation, 2);
    }

    #[tokio::test]
    async fn test_word_break_event_has_no_text() {
        let bus = Arc::new(RecordingEventBus::new());
        let handle = SessionHandle::new(RecognitionSession::default(), bus.clone());

        handle.process_detection(seen("A", 0.9), 0).await;
        handle.process_detection(seen("A", 0.9), 500).await;
        handle.process_detection(None, 3501).await;

        let confirmed = bus.events_for(event_names::CONFIRMED);
        assert_eq!(confirmed.len(), 2);
        assert_eq!(confirmed[1].payload["kind"], "word_break");
        assert!(confirmed[1].payload["text"].is_null());

        let text = bus.events_for(event_names::TEXT_CHANGED);
        assert_eq!(text[1].payload["text"], "A ");
    }
}

// =============================================================================
// Settings File Tests
// =============================================================================

mod settings {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_settings(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_partial_settings() {
        let file = write_settings(
            r#"{"stabilizer": {"phrase": {"stability_frames": 5}}, "initial_mode": "phrase"}"#,
        );
        let settings = load_settings(file.path()).unwrap();

        assert_eq!(settings.stabilizer.phrase.stability_frames, 5);
        assert_eq!(settings.stabilizer.letter.stability_time_ms, 500);
        assert_eq!(settings.initial_mode, RecognitionMode::Phrase);

        let mut session = RecognitionSession::from_settings(&settings);
        let events: Vec<_> = (0..5)
            .filter_map(|i| session.process_frame(seen("yes", 0.9), i * 33))
            .collect();
        assert_eq!(events, vec![Event::Phrase("yes".into())]);
    }

    #[test]
    fn test_empty_object_is_defaults() {
        let file = write_settings("{}");
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.stabilizer, StabilizerConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Io { path: p, .. } if p == path));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_settings("{ not json");
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let file = write_settings(r#"{"stabilizer": {"letter": {"confidence_threshold": 1.5}}}"#);
        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid {
                source: InvalidSettings::Stabilizer(_),
                ..
            }
        ));

        let file = write_settings(r#"{"stabilizer": {"phrase": {"stability_frames": 0}}}"#);
        assert!(load_settings(file.path()).is_err());
    }
}
