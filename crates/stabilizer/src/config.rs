//! Tunable thresholds and timings for both recognition policies.

use serde::{Deserialize, Serialize};
use signa_context::RecognitionMode;

/// Upper bound on the phrase window, keeps the window allocation bounded.
pub const MAX_STABILITY_FRAMES: usize = 64;

pub const DEFAULT_LETTER_THRESHOLD: f32 = 0.55;
pub const DEFAULT_LETTER_STABILITY_MS: u64 = 500;
pub const DEFAULT_LETTER_COOLDOWN_MS: u64 = 800;
pub const DEFAULT_WORD_SEPARATOR_DELAY_MS: u64 = 3000;

pub const DEFAULT_PHRASE_THRESHOLD: f32 = 0.50;
pub const DEFAULT_PHRASE_STABILITY_FRAMES: usize = 8;
pub const DEFAULT_PHRASE_COOLDOWN_MS: u64 = 1000;

/// Time-based confirmation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterConfig {
    pub confidence_threshold: f32,
    /// How long a letter must be held before it is confirmed.
    pub stability_time_ms: u64,
    /// Minimum gap before the same letter may be confirmed again.
    pub same_symbol_cooldown_ms: u64,
    /// Absence of a subject for longer than this ends the current word.
    pub word_separator_delay_ms: u64,
}

impl Default for LetterConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_LETTER_THRESHOLD,
            stability_time_ms: DEFAULT_LETTER_STABILITY_MS,
            same_symbol_cooldown_ms: DEFAULT_LETTER_COOLDOWN_MS,
            word_separator_delay_ms: DEFAULT_WORD_SEPARATOR_DELAY_MS,
        }
    }
}

/// Frame-window confirmation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseConfig {
    pub confidence_threshold: f32,
    /// Consecutive identical frames required to confirm a phrase.
    pub stability_frames: usize,
    pub same_symbol_cooldown_ms: u64,
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_PHRASE_THRESHOLD,
            stability_frames: DEFAULT_PHRASE_STABILITY_FRAMES,
            same_symbol_cooldown_ms: DEFAULT_PHRASE_COOLDOWN_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub letter: LetterConfig,
    pub phrase: PhraseConfig,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{mode} confidence threshold {value} must be within [0, 1)")]
    InvalidThreshold { mode: RecognitionMode, value: f32 },
    #[error("phrase stability_frames must be between 1 and {max}, got {value}")]
    InvalidStabilityFrames { value: usize, max: usize },
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold(RecognitionMode::Letter, self.letter.confidence_threshold)?;
        check_threshold(RecognitionMode::Phrase, self.phrase.confidence_threshold)?;

        let frames = self.phrase.stability_frames;
        if frames == 0 || frames > MAX_STABILITY_FRAMES {
            return Err(ConfigError::InvalidStabilityFrames {
                value: frames,
                max: MAX_STABILITY_FRAMES,
            });
        }
        Ok(())
    }

    pub fn threshold_for(&self, mode: RecognitionMode) -> f32 {
        match mode {
            RecognitionMode::Letter => self.letter.confidence_threshold,
            RecognitionMode::Phrase => self.phrase.confidence_threshold,
        }
    }
}

// A threshold of 1.0 could never be exceeded, so it is rejected along with NaN.
fn check_threshold(mode: RecognitionMode, value: f32) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { mode, value })
    }
}
