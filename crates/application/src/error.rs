//! Error types for loading recognition settings.

use std::path::PathBuf;

use signa_stabilizer::ConfigError;
use thiserror::Error;

/// Settings that parsed but cannot drive a session.
#[derive(Debug, Error)]
pub enum InvalidSettings {
    #[error(transparent)]
    Stabilizer(#[from] ConfigError),

    #[error("classifier model_id must not be empty")]
    EmptyModelId,
}

/// Errors that can occur while loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the settings file.
    #[error("Failed to read settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid settings JSON.
    #[error("Invalid settings JSON in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Values are out of range.
    #[error("Invalid settings in '{path}': {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: InvalidSettings,
    },
}
