//! Translated text buffer driven by stabilizer events.
//!
//! Letters collect in a pending word until a word break folds them into the
//! committed text. Phrases go straight into the committed text.

use serde::{Deserialize, Serialize};
use signa_stabilizer::{Event, WordBreakGate};

const SEPARATOR: char = ' ';

/// Read-only view of the buffer for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnapshot {
    /// Text folded in by word breaks and phrases.
    pub text: String,
    /// Letters of the word still being signed.
    pub pending_word: String,
    /// `text` followed by `pending_word`, space-separated when needed.
    pub display: String,
}

/// Append-only text buffer with delete-last and clear.
#[derive(Debug, Clone, Default)]
pub struct TextAccumulator {
    committed_text: String,
    pending_word: String,
    /// Text added by the most recent event (cleared after read).
    last_committed_delta: Option<String>,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed_text(&self) -> &str {
        &self.committed_text
    }

    pub fn pending_word(&self) -> &str {
        &self.pending_word
    }

    /// The text as it will read once the pending word is folded in.
    pub fn display_text(&self) -> String {
        let mut display = self.committed_text.clone();
        if !self.pending_word.is_empty() && self.needs_separator() {
            display.push(SEPARATOR);
        }
        display.push_str(&self.pending_word);
        display
    }

    pub fn is_empty(&self) -> bool {
        self.committed_text.is_empty() && self.pending_word.is_empty()
    }

    /// Apply a stabilizer event. Returns whether the buffer changed.
    pub fn apply(&mut self, event: &Event) -> bool {
        match event {
            Event::Symbol(symbol) => self.append_symbol(symbol),
            Event::Phrase(phrase) => self.append_phrase(phrase),
            Event::WordBreak => self.commit_word_break(),
        }
    }

    /// Add a confirmed letter to the pending word.
    pub fn append_symbol(&mut self, symbol: &str) -> bool {
        if symbol.is_empty() {
            return false;
        }
        self.pending_word.push_str(symbol);
        self.last_committed_delta = Some(symbol.to_string());
        true
    }

    /// Add a confirmed phrase, separated from earlier text by a single space.
    pub fn append_phrase(&mut self, phrase: &str) -> bool {
        let trimmed = phrase.trim();
        if trimmed.is_empty() {
            return false;
        }

        self.fold_pending_word();
        if self.needs_separator() {
            self.committed_text.push(SEPARATOR);
        }
        self.committed_text.push_str(trimmed);
        self.last_committed_delta = Some(trimmed.to_string());
        true
    }

    /// Close the pending word and end the text with a separator.
    ///
    /// A no-op when the text is empty or already ends in a separator.
    pub fn commit_word_break(&mut self) -> bool {
        self.fold_pending_word();
        if !self.needs_separator() {
            return false;
        }

        self.committed_text.push(SEPARATOR);
        self.last_committed_delta = Some(SEPARATOR.to_string());
        tracing::trace!(text_len = self.committed_text.len(), "word_committed");
        true
    }

    /// Remove the last character: from the pending word first, then the committed text.
    pub fn delete_last(&mut self) -> Option<char> {
        let removed = self
            .pending_word
            .pop()
            .or_else(|| self.committed_text.pop());
        self.last_committed_delta = None;
        removed
    }

    pub fn clear(&mut self) {
        self.committed_text.clear();
        self.pending_word.clear();
        self.last_committed_delta = None;
    }

    /// Take the text added by the most recent event (consumes it).
    pub fn take_last_committed_delta(&mut self) -> Option<String> {
        self.last_committed_delta.take()
    }

    pub fn snapshot(&self) -> TextSnapshot {
        TextSnapshot {
            text: self.committed_text.clone(),
            pending_word: self.pending_word.clone(),
            display: self.display_text(),
        }
    }

    // Committed text may lose its trailing separator to delete_last.
    fn fold_pending_word(&mut self) {
        if !self.pending_word.is_empty() {
            if self.needs_separator() {
                self.committed_text.push(SEPARATOR);
            }
            self.committed_text.push_str(&self.pending_word);
            self.pending_word.clear();
        }
    }

    fn needs_separator(&self) -> bool {
        !self.committed_text.is_empty() && !self.committed_text.ends_with(SEPARATOR)
    }
}

impl WordBreakGate for TextAccumulator {
    fn accepts_word_break(&self) -> bool {
        !self.pending_word.is_empty() || self.needs_separator()
    }
}
