//! User-controlled recognition state.

use crate::mode::{CameraFacing, RecognitionMode};
use serde::{Deserialize, Serialize};

/// Current mode and camera selection.
///
/// Both values change only through explicit user toggles. The owner of this
/// struct is responsible for resetting recognition state when the mode flips;
/// see `RecognitionSession::toggle_mode` in the application crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub mode: RecognitionMode,
    pub facing: CameraFacing,
}

impl ControlState {
    pub fn new(mode: RecognitionMode, facing: CameraFacing) -> Self {
        Self { mode, facing }
    }

    /// Flip the recognition mode and return the new value.
    pub fn toggle_mode(&mut self) -> RecognitionMode {
        let previous = self.mode;
        self.mode = previous.toggled();
        tracing::debug!(from = %previous, to = %self.mode, "recognition_mode_toggled");
        self.mode
    }

    /// Flip the camera and return the new value.
    pub fn toggle_facing(&mut self) -> CameraFacing {
        self.facing = self.facing.toggled();
        tracing::debug!(facing = %self.facing, "camera_facing_toggled");
        self.facing
    }
}
