//! Prediction stabilization for sign recognition.
//!
//! Consumes one `Option<Prediction>` per processed camera frame and emits at
//! most one `Event` per frame:
//! - Letter mode: a symbol must be held for `stability_time_ms`
//! - Phrase mode: a symbol must fill a window of `stability_frames` frames
//! - Both: the same symbol is not confirmed again within its cooldown
//! - Letter mode only: a long absence of the subject ends the current word

mod config;
mod letter;
mod phrase;
mod prediction;
mod stabilizer;
mod state;
mod window;

pub use config::{
    ConfigError, LetterConfig, PhraseConfig, StabilizerConfig, DEFAULT_LETTER_COOLDOWN_MS,
    DEFAULT_LETTER_STABILITY_MS, DEFAULT_LETTER_THRESHOLD, DEFAULT_PHRASE_COOLDOWN_MS,
    DEFAULT_PHRASE_STABILITY_FRAMES, DEFAULT_PHRASE_THRESHOLD, DEFAULT_WORD_SEPARATOR_DELAY_MS,
    MAX_STABILITY_FRAMES,
};
pub use prediction::{Event, InvalidPrediction, Prediction, Timestamp};
pub use stabilizer::{Stabilizer, WordBreakGate};
pub use state::StabilizerState;
pub use window::RecentWindow;

pub use signa_context::RecognitionMode;
