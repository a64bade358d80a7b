//! Mutable tracking state shared by both policies.

use crate::prediction::Timestamp;
use crate::window::RecentWindow;

/// Everything the stabilizer remembers between frames.
///
/// Owned exclusively by one `Stabilizer`; replaced wholesale on mode switch,
/// clear and delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilizerState {
    pub(crate) current_stable_symbol: Option<String>,
    pub(crate) stable_since: Option<Timestamp>,
    pub(crate) recent_window: RecentWindow,
    pub(crate) last_confirmed_symbol: Option<String>,
    pub(crate) last_confirmed_at: Option<Timestamp>,
    /// Drives the word separator timer. `None` once a break has fired.
    pub(crate) last_subject_seen_at: Option<Timestamp>,
    pub(crate) last_frame_at: Option<Timestamp>,
}

impl StabilizerState {
    pub fn new(window_capacity: usize) -> Self {
        Self {
            current_stable_symbol: None,
            stable_since: None,
            recent_window: RecentWindow::new(window_capacity),
            last_confirmed_symbol: None,
            last_confirmed_at: None,
            last_subject_seen_at: None,
            last_frame_at: None,
        }
    }

    pub fn current_stable_symbol(&self) -> Option<&str> {
        self.current_stable_symbol.as_deref()
    }

    pub fn stable_since(&self) -> Option<Timestamp> {
        self.stable_since
    }

    pub fn recent_window(&self) -> &RecentWindow {
        &self.recent_window
    }

    pub fn last_confirmed_symbol(&self) -> Option<&str> {
        self.last_confirmed_symbol.as_deref()
    }

    pub fn last_confirmed_at(&self) -> Option<Timestamp> {
        self.last_confirmed_at
    }

    pub fn last_subject_seen_at(&self) -> Option<Timestamp> {
        self.last_subject_seen_at
    }

    /// True when nothing has been tracked, confirmed or seen.
    pub fn is_pristine(&self) -> bool {
        self.current_stable_symbol.is_none()
            && self.stable_since.is_none()
            && self.recent_window.is_empty()
            && self.last_confirmed_symbol.is_none()
            && self.last_confirmed_at.is_none()
            && self.last_subject_seen_at.is_none()
            && self.last_frame_at.is_none()
    }

    pub(crate) fn start_tracking(&mut self, symbol: &str, now: Timestamp) {
        self.current_stable_symbol = Some(symbol.to_string());
        self.stable_since = Some(now);
    }

    /// Drop the active tracking run. Returns whether one was active.
    pub(crate) fn clear_tracking(&mut self) -> bool {
        self.stable_since = None;
        self.current_stable_symbol.take().is_some()
    }

    /// De-duplication rule: a different symbol, or the same one after the cooldown.
    pub(crate) fn may_confirm(&self, symbol: &str, now: Timestamp, cooldown_ms: u64) -> bool {
        match (self.last_confirmed_symbol.as_deref(), self.last_confirmed_at) {
            (Some(last), Some(at)) if last == symbol => now.saturating_sub(at) > cooldown_ms,
            _ => true,
        }
    }

    pub(crate) fn record_confirmation(&mut self, symbol: &str, now: Timestamp) {
        self.last_confirmed_symbol = Some(symbol.to_string());
        // Frames arrive in non-decreasing order, max() keeps the invariant explicit.
        self.last_confirmed_at = Some(self.last_confirmed_at.map_or(now, |at| at.max(now)));
    }

    pub(crate) fn forget_last_confirmed(&mut self) {
        self.last_confirmed_symbol = None;
        self.last_confirmed_at = None;
    }
}
