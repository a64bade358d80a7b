//! Bounded window of recent phrase symbols.

use std::collections::VecDeque;

use crate::config::MAX_STABILITY_FRAMES;

/// FIFO of the most recent above-threshold symbols, capped at `capacity`.
///
/// Confirmation only cares whether the last `capacity` pushes were identical,
/// so a push that differs from the newest entry restarts the window instead of
/// carrying entries that can never form a uniform run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentWindow {
    entries: VecDeque<String>,
    capacity: usize,
}

impl RecentWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            // Unvalidated configs may carry any size; grow past the usual bound on demand.
            entries: VecDeque::with_capacity(capacity.min(MAX_STABILITY_FRAMES)),
            capacity,
        }
    }

    pub fn push(&mut self, symbol: &str) {
        if self.entries.back().is_some_and(|last| last != symbol) {
            self.entries.clear();
        }

        self.entries.push_back(symbol.to_string());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.entries.len() == self.capacity
    }

    /// The shared symbol when the window is full and every entry matches.
    pub fn uniform_symbol(&self) -> Option<&str> {
        if !self.is_full() {
            return None;
        }
        let first = self.entries.front()?;
        self.entries
            .iter()
            .all(|s| s == first)
            .then_some(first.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
