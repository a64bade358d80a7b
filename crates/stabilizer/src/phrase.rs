//! Phrase policy: confirm a symbol after a full window of identical frames.
//!
//! Frame-count based, so it tolerates frames dropped upstream.

use crate::config::PhraseConfig;
use crate::prediction::{Event, Prediction, Timestamp};
use crate::state::StabilizerState;

pub(crate) fn process(
    state: &mut StabilizerState,
    config: &PhraseConfig,
    prediction: Option<&Prediction>,
    now: Timestamp,
) -> Option<Event> {
    let Some(prediction) = prediction.filter(|p| p.exceeds(config.confidence_threshold)) else {
        if !state.recent_window.is_empty() {
            tracing::trace!(now, "phrase_window_cleared");
            state.recent_window.clear();
        }
        return None;
    };

    state.recent_window.push(&prediction.symbol);
    let symbol = state.recent_window.uniform_symbol()?.to_string();

    if !state.may_confirm(&symbol, now, config.same_symbol_cooldown_ms) {
        tracing::trace!(symbol = %symbol, now, "phrase_suppressed_by_cooldown");
        return None;
    }

    state.record_confirmation(&symbol, now);
    state.recent_window.clear();
    tracing::debug!(symbol = %symbol, now, "phrase_confirmed");
    Some(Event::Phrase(symbol))
}
