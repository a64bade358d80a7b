mod engine;
mod registry;
mod replay;

pub use engine::{BoundingRegion, Classifier, ClassifierLoader, Detection};
pub use registry::ClassifierRegistry;
pub use replay::{
    load_trace, parse_trace, ReplayClassifier, ReplayLoader, TraceAction, TraceEntry, TraceError,
    REPLAY_MODEL_ID,
};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// The backend cannot run at all (missing runtime, device lost).
    #[error("classifier unavailable: {0}")]
    Unavailable(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("load failed: {0}")]
    LoadFailed(String),
    #[error("no loader found for model: {0}")]
    UnknownModel(String),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
