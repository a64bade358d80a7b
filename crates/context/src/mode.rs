//! Recognition mode and camera facing definitions.
//!
//! Pure domain logic - no I/O, no platform dependencies.

use serde::{Deserialize, Serialize};

/// Recognition policy the stabilizer applies to incoming predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    /// Single-character signs confirmed by how long they are held.
    #[default]
    Letter,

    /// Whole-word signs confirmed by a run of identical frames.
    Phrase,
}

impl RecognitionMode {
    /// Returns a human-readable label for the mode.
    pub fn label(&self) -> &'static str {
        match self {
            RecognitionMode::Letter => "Letter",
            RecognitionMode::Phrase => "Phrase",
        }
    }

    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            RecognitionMode::Letter => RecognitionMode::Phrase,
            RecognitionMode::Phrase => RecognitionMode::Letter,
        }
    }
}

impl std::fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which camera feeds the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    #[default]
    Front,
    Back,
}

impl CameraFacing {
    pub fn label(&self) -> &'static str {
        match self {
            CameraFacing::Front => "Front",
            CameraFacing::Back => "Back",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
