use std::path::Path;

use signa_bus::Frame;
use signa_stabilizer::Prediction;

/// Normalized bounding box of the detected hand or body, in `[0, 1]` frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// What a classifier reports for one frame.
///
/// The region is for display only; stabilization looks at the prediction alone.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub prediction: Prediction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingRegion>,
}

impl Detection {
    pub fn new(prediction: Prediction) -> Self {
        Self {
            prediction,
            region: None,
        }
    }

    pub fn with_region(mut self, region: BoundingRegion) -> Self {
        self.region = Some(region);
        self
    }
}

pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Classify one frame.
    ///
    /// `Ok(None)` means no subject was detected. Called from a blocking
    /// thread, so implementations may run heavy inference synchronously.
    fn classify(&self, frame: &Frame) -> crate::Result<Option<Detection>>;
}

/// Factory trait for creating classifiers.
///
/// Backends implement this to register their model types with a
/// [`ClassifierRegistry`](crate::ClassifierRegistry).
pub trait ClassifierLoader: Send + Sync {
    /// Human-readable name of the backend (e.g., "Replay trace").
    fn name(&self) -> &str;

    /// Check if this loader can handle the given model identifier.
    fn can_load(&self, model_id: &str) -> bool;

    /// Load a classifier for the given model.
    ///
    /// `model_path` points at the model file or directory; its meaning is
    /// backend specific.
    fn load(&self, model_id: &str, model_path: &Path) -> crate::Result<Box<dyn Classifier>>;
}
