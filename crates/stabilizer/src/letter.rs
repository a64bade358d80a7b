//! Letter policy: confirm a symbol once it has been held for a minimum time.

use crate::config::LetterConfig;
use crate::prediction::{Event, Prediction, Timestamp};
use crate::state::StabilizerState;
use crate::WordBreakGate;

pub(crate) fn process<G: WordBreakGate + ?Sized>(
    state: &mut StabilizerState,
    config: &LetterConfig,
    prediction: Option<&Prediction>,
    now: Timestamp,
    gate: &G,
) -> Option<Event> {
    let Some(prediction) = prediction else {
        if state.clear_tracking() {
            tracing::debug!(now, "letter_tracking_lost");
        }
        return word_break(state, config, now, gate);
    };

    // Any detected subject keeps the current word open, even below threshold.
    state.last_subject_seen_at = Some(now);

    if !prediction.exceeds(config.confidence_threshold) {
        if state.clear_tracking() {
            tracing::debug!(
                now,
                confidence = prediction.confidence,
                "letter_tracking_lost"
            );
        }
        return None;
    }

    let symbol = prediction.symbol.as_str();
    let since = match (state.current_stable_symbol.as_deref(), state.stable_since) {
        (Some(current), Some(since)) if current == symbol => since,
        _ => {
            state.start_tracking(symbol, now);
            tracing::trace!(symbol, now, "letter_tracking_started");
            return None;
        }
    };

    if now.saturating_sub(since) < config.stability_time_ms {
        return None;
    }

    // The run stays active while suppressed so a held sign repeats after the cooldown.
    if !state.may_confirm(symbol, now, config.same_symbol_cooldown_ms) {
        tracing::trace!(symbol, now, "letter_suppressed_by_cooldown");
        return None;
    }

    state.record_confirmation(symbol, now);
    state.clear_tracking();
    tracing::debug!(symbol, now, held_ms = now - since, "letter_confirmed");
    Some(Event::Symbol(symbol.to_string()))
}

fn word_break<G: WordBreakGate + ?Sized>(
    state: &mut StabilizerState,
    config: &LetterConfig,
    now: Timestamp,
    gate: &G,
) -> Option<Event> {
    let seen = state.last_subject_seen_at?;
    if now.saturating_sub(seen) <= config.word_separator_delay_ms {
        return None;
    }
    if !gate.accepts_word_break() {
        return None;
    }

    state.last_subject_seen_at = None;
    tracing::debug!(now, absent_ms = now - seen, "word_break");
    Some(Event::WordBreak)
}
