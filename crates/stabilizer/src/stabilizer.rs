use signa_context::RecognitionMode;

use crate::config::StabilizerConfig;
use crate::prediction::{Event, Prediction, Timestamp};
use crate::state::StabilizerState;
use crate::{letter, phrase};

/// Answers whether the text buffer can take a word break right now.
///
/// Implemented by the text accumulator: a break is accepted when the buffer is
/// non-empty and does not already end in a separator.
pub trait WordBreakGate {
    fn accepts_word_break(&self) -> bool;
}

impl WordBreakGate for bool {
    fn accepts_word_break(&self) -> bool {
        *self
    }
}

/// Stateful filter from per-frame predictions to confirmed events.
///
/// Single-threaded by construction: `process` takes `&mut self`, so callers
/// sharing a stabilizer across tasks must serialize access behind one lock.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    config: StabilizerConfig,
    mode: RecognitionMode,
    state: StabilizerState,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig, mode: RecognitionMode) -> Self {
        Self {
            state: StabilizerState::new(config.phrase.stability_frames),
            config,
            mode,
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn mode(&self) -> RecognitionMode {
        self.mode
    }

    pub fn state(&self) -> &StabilizerState {
        &self.state
    }

    /// Feed one processed frame.
    ///
    /// `prediction` is `None` when no subject was detected. Malformed
    /// predictions are treated as `None`; frames older than the previous one
    /// are dropped. Emits at most one event per call.
    #[tracing::instrument(level = "trace", skip_all, fields(%mode, now = now))]
    pub fn process<G: WordBreakGate + ?Sized>(
        &mut self,
        prediction: Option<Prediction>,
        now: Timestamp,
        mode: RecognitionMode,
        gate: &G,
    ) -> Option<Event> {
        if mode != self.mode {
            self.switch_mode(mode);
        }

        if !self.accepts_frame_at(now, mode) {
            tracing::warn!(now, last = ?self.state.last_frame_at, "Dropping out-of-order frame");
            return None;
        }
        self.state.last_frame_at = Some(now);

        let prediction = prediction.filter(|p| match p.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!(error = %e, "Rejected prediction");
                false
            }
        });

        match self.mode {
            RecognitionMode::Letter => letter::process(
                &mut self.state,
                &self.config.letter,
                prediction.as_ref(),
                now,
                gate,
            ),
            RecognitionMode::Phrase => phrase::process(
                &mut self.state,
                &self.config.phrase,
                prediction.as_ref(),
                now,
            ),
        }
    }

    /// Whether `process` would take a frame stamped `now` in `mode`.
    ///
    /// Frames older than the last one are rejected; a mode change resets that mark.
    pub fn accepts_frame_at(&self, now: Timestamp, mode: RecognitionMode) -> bool {
        mode != self.mode || self.state.last_frame_at.map_or(true, |last| now >= last)
    }

    /// Return to the initial empty state. Never emits.
    pub fn reset(&mut self) {
        self.state = StabilizerState::new(self.config.phrase.stability_frames);
        tracing::debug!(mode = %self.mode, "stabilizer_reset");
    }

    /// Change policy, discarding everything tracked under the old one.
    pub fn switch_mode(&mut self, mode: RecognitionMode) {
        self.mode = mode;
        self.reset();
    }

    /// Let the last confirmed symbol be confirmed again without waiting for the cooldown.
    pub fn forget_last_confirmed(&mut self) {
        self.state.forget_last_confirmed();
    }
}
