//! Recognition session orchestration.
//!
//! Ties the stabilizer and text accumulator to user controls, publishes
//! session events, and runs the frame listener that feeds a session from
//! a classifier.

mod error;
mod handle;
mod listener;
mod session;
mod settings;

pub use error::{InvalidSettings, SettingsError};
pub use handle::{FrameOutcome, SessionHandle};
pub use listener::{start_recognition_listener, RecognitionListenerHandle};
pub use session::{RecognitionSession, SessionSnapshot};
pub use settings::{load_settings, ClassifierSettings, RecognitionSettings};
