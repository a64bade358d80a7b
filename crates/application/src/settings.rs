//! Recognition settings loaded from a JSON file.
//!
//! Every field has a default, so a partial file (or `{}`) is valid:
//!
//! ```json
//! {
//!   "stabilizer": { "letter": { "stability_time_ms": 400 } },
//!   "initial_mode": "phrase",
//!   "classifier": { "model_id": "replay", "model_path": "trace.jsonl" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signa_bus::FrameBusConfig;
use signa_classifier::REPLAY_MODEL_ID;
use signa_context::{CameraFacing, RecognitionMode};
use signa_stabilizer::StabilizerConfig;

use crate::error::{InvalidSettings, SettingsError};

/// Which classifier backend to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub model_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            model_id: REPLAY_MODEL_ID.to_string(),
            model_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub stabilizer: StabilizerConfig,
    pub initial_mode: RecognitionMode,
    pub initial_facing: CameraFacing,
    pub classifier: ClassifierSettings,
    pub frame_bus: FrameBusConfig,
}

impl RecognitionSettings {
    pub fn validate(&self) -> Result<(), InvalidSettings> {
        self.stabilizer.validate()?;
        if self.classifier.model_id.trim().is_empty() {
            return Err(InvalidSettings::EmptyModelId);
        }
        Ok(())
    }
}

/// Read, parse and validate a settings file.
pub fn load_settings(path: &Path) -> Result<RecognitionSettings, SettingsError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let settings: RecognitionSettings =
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    settings.validate().map_err(|source| SettingsError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        mode = %settings.initial_mode,
        model_id = %settings.classifier.model_id,
        "Loaded recognition settings"
    );
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RecognitionSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.classifier.model_id, "replay");
        assert_eq!(settings.initial_mode, RecognitionMode::Letter);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"stabilizer": {"letter": {"stability_time_ms": 400}}, "initial_facing": "back"}"#;
        let settings: RecognitionSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.stabilizer.letter.stability_time_ms, 400);
        assert_eq!(settings.stabilizer.letter.same_symbol_cooldown_ms, 800);
        assert_eq!(settings.stabilizer.phrase.stability_frames, 8);
        assert_eq!(settings.initial_facing, CameraFacing::Back);
    }

    #[test]
    fn test_empty_model_id_rejected() {
        let mut settings = RecognitionSettings::default();
        settings.classifier.model_id = "  ".to_string();
        assert!(matches!(
            settings.validate(),
            Err(InvalidSettings::EmptyModelId)
        ));
    }
}
