use std::path::Path;

use crate::{Classifier, ClassifierError, ClassifierLoader};

/// Registry of classifier loaders, selected by model id.
pub struct ClassifierRegistry {
    loaders: Vec<Box<dyn ClassifierLoader>>,
}

impl ClassifierRegistry {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Registry with every loader built into this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::ReplayLoader));
        registry
    }

    pub fn register(&mut self, loader: Box<dyn ClassifierLoader>) {
        tracing::debug!("Registering classifier loader: {}", loader.name());
        self.loaders.push(loader);
    }

    /// Find a loader that can handle the given model ID.
    pub fn find_loader(&self, model_id: &str) -> Option<&dyn ClassifierLoader> {
        self.loaders
            .iter()
            .find(|l| l.can_load(model_id))
            .map(|l| l.as_ref())
    }

    pub fn can_load(&self, model_id: &str) -> bool {
        self.loaders.iter().any(|l| l.can_load(model_id))
    }

    /// Load a classifier with the first loader that accepts `model_id`.
    pub fn load(&self, model_id: &str, model_path: &Path) -> crate::Result<Box<dyn Classifier>> {
        let loader = self
            .find_loader(model_id)
            .ok_or_else(|| ClassifierError::UnknownModel(model_id.to_string()))?;

        tracing::info!(
            model_id,
            loader = loader.name(),
            path = %model_path.display(),
            "Loading classifier"
        );
        loader.load(model_id, model_path)
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
