//! Per-frame classifier output and the events the stabilizer emits.

use serde::{Deserialize, Serialize};

/// Milliseconds since an arbitrary monotonic epoch.
pub type Timestamp = u64;

/// One classifier output for one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub symbol: String,
    pub confidence: f32,
}

/// Why a prediction was rejected at the stabilizer boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidPrediction {
    #[error("prediction symbol is empty")]
    EmptySymbol,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f32),
}

impl Prediction {
    pub fn new(symbol: impl Into<String>, confidence: f32) -> Self {
        Self {
            symbol: symbol.into(),
            confidence,
        }
    }

    /// Check the boundary contract: non-blank symbol, finite confidence in `[0, 1]`.
    pub fn validate(&self) -> Result<(), InvalidPrediction> {
        if self.symbol.trim().is_empty() {
            return Err(InvalidPrediction::EmptySymbol);
        }
        // NaN fails the range check too.
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(InvalidPrediction::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }

    /// Strictly above the threshold. A confidence equal to the threshold does not count.
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }
}

/// Output of one stabilizer step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Event {
    /// A letter held long enough to be confirmed.
    Symbol(String),
    /// A phrase seen in a full window of identical frames.
    Phrase(String),
    /// The subject left the frame long enough to end the current word.
    WordBreak,
}

impl Event {
    /// Confirmed text carried by the event, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Event::Symbol(s) | Event::Phrase(s) => Some(s),
            Event::WordBreak => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(Prediction::new("A", 0.0).validate().is_ok());
        assert!(Prediction::new("A", 1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert_eq!(
            Prediction::new("", 0.9).validate(),
            Err(InvalidPrediction::EmptySymbol)
        );
        assert_eq!(
            Prediction::new("   ", 0.9).validate(),
            Err(InvalidPrediction::EmptySymbol)
        );
        assert!(matches!(
            Prediction::new("A", -0.1).validate(),
            Err(InvalidPrediction::ConfidenceOutOfRange(_))
        ));
        assert!(matches!(
            Prediction::new("A", 1.5).validate(),
            Err(InvalidPrediction::ConfidenceOutOfRange(_))
        ));
        assert!(Prediction::new("A", f32::NAN).validate().is_err());
    }

    #[test]
    fn test_exceeds_is_strict() {
        let p = Prediction::new("A", 0.55);
        assert!(!p.exceeds(0.55));
        assert!(p.exceeds(0.549));
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(Event::Symbol("A".into())).unwrap();
        assert_eq!(json["kind"], "symbol");
        assert_eq!(json["text"], "A");

        let json = serde_json::to_value(Event::WordBreak).unwrap();
        assert_eq!(json["kind"], "word_break");
    }
}
