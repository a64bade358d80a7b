//! Recognition context for signa.
//!
//! Holds the two user-facing switches that steer recognition:
//! - `RecognitionMode`: letter-by-letter or whole-phrase confirmation
//! - `CameraFacing`: which camera feeds the detector
//!
//! Both are plain values; the application layer decides what a toggle resets.

mod mode;
mod state;

pub use mode::{CameraFacing, RecognitionMode};
pub use state::ControlState;
