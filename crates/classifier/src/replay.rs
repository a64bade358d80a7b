//! Recorded prediction traces.
//!
//! A trace is a JSON-lines file, one entry per processed frame or control action:
//!
//! ```text
//! {"ts_ms": 0, "symbol": "A", "confidence": 0.9}
//! {"ts_ms": 33}
//! {"ts_ms": 66, "action": "toggle_mode"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. An entry without a
//! symbol is a frame where no subject was detected.

use std::path::{Path, PathBuf};

use signa_bus::Frame;
use signa_stabilizer::Prediction;

use crate::{BoundingRegion, Classifier, ClassifierError, ClassifierLoader, Detection};

pub const REPLAY_MODEL_ID: &str = "replay";

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path} line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// User control recorded in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceAction {
    ToggleMode,
    ToggleFacing,
    Clear,
    DeleteLast,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TraceEntry {
    pub ts_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<BoundingRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<TraceAction>,
}

impl TraceEntry {
    /// True for entries that stand for a processed frame.
    pub fn is_frame(&self) -> bool {
        self.action.is_none()
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.symbol
            .as_ref()
            .map(|symbol| Prediction::new(symbol.clone(), self.confidence))
    }

    pub fn detection(&self) -> Option<Detection> {
        let detection = Detection::new(self.prediction()?);
        Some(match self.region {
            Some(region) => detection.with_region(region),
            None => detection,
        })
    }
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = parse_lines(path, &contents)?;
    tracing::debug!(path = %path.display(), entries = entries.len(), "Loaded trace");
    Ok(entries)
}

/// Parse trace contents that did not come from a file.
pub fn parse_trace(contents: &str) -> Result<Vec<TraceEntry>, TraceError> {
    parse_lines(Path::new("<inline>"), contents)
}

fn parse_lines(path: &Path, contents: &str) -> Result<Vec<TraceEntry>, TraceError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| TraceError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

/// Classifier that answers from a recorded trace.
///
/// Frame `seq` N gets the N-th frame entry of the trace; frames past the
/// end see no subject.
pub struct ReplayClassifier {
    frames: Vec<Option<Detection>>,
}

impl ReplayClassifier {
    pub fn from_entries(entries: &[TraceEntry]) -> Self {
        let frames = entries
            .iter()
            .filter(|e| e.is_frame())
            .map(TraceEntry::detection)
            .collect();
        Self { frames }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Classifier for ReplayClassifier {
    fn name(&self) -> &str {
        REPLAY_MODEL_ID
    }

    fn classify(&self, frame: &Frame) -> crate::Result<Option<Detection>> {
        let detection = usize::try_from(frame.seq)
            .ok()
            .and_then(|idx| self.frames.get(idx))
            .cloned()
            .flatten();
        Ok(detection)
    }
}

/// Loader for recorded traces (model id `replay`, path is the trace file).
pub struct ReplayLoader;

impl ClassifierLoader for ReplayLoader {
    fn name(&self) -> &str {
        "Replay trace"
    }

    fn can_load(&self, model_id: &str) -> bool {
        model_id == REPLAY_MODEL_ID
    }

    fn load(&self, _model_id: &str, model_path: &Path) -> crate::Result<Box<dyn Classifier>> {
        let entries =
            load_trace(model_path).map_err(|e| ClassifierError::LoadFailed(e.to_string()))?;
        Ok(Box::new(ReplayClassifier::from_entries(&entries)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use signa_context::CameraFacing;

    use super::*;

    const TRACE: &str = r#"
# letter A held, then gone
{"ts_ms": 0, "symbol": "A", "confidence": 0.9}
{"ts_ms": 33}
{"ts_ms": 50, "action": "toggle_mode"}
{"ts_ms": 66, "symbol": "hello", "confidence": 0.8, "region": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4}}
"#;

    fn frame(seq: u64) -> Frame {
        Frame::new(seq, seq * 33, CameraFacing::Front, 1, 1, vec![0u8; 3])
    }

    #[test]
    fn test_parse_trace() {
        let entries = parse_trace(TRACE).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].prediction(), Some(Prediction::new("A", 0.9)));
        assert_eq!(entries[1].prediction(), None);
        assert_eq!(entries[2].action, Some(TraceAction::ToggleMode));
        assert!(!entries[2].is_frame());
        assert!(entries[3].region.is_some());

        assert!(entries[0].detection().is_some_and(|d| d.region.is_none()));
        assert_eq!(
            entries[3].detection().and_then(|d| d.region).map(|r| r.x),
            Some(0.1)
        );
        assert!(entries[2].detection().is_none());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_trace("{\"ts_ms\": 0}\nnot json\n").unwrap_err();
        assert!(matches!(err, TraceError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_replay_indexes_frames_by_seq() {
        let entries = parse_trace(TRACE).unwrap();
        let classifier = ReplayClassifier::from_entries(&entries);
        assert_eq!(classifier.frame_count(), 3);

        let first = classifier.classify(&frame(0)).unwrap().unwrap();
        assert_eq!(first.prediction.symbol, "A");
        assert!(classifier.classify(&frame(1)).unwrap().is_none());

        // Control actions are not frames.
        let third = classifier.classify(&frame(2)).unwrap().unwrap();
        assert_eq!(third.prediction.symbol, "hello");
        assert_eq!(third.region.map(|r| r.width), Some(0.3));

        assert!(classifier.classify(&frame(99)).unwrap().is_none());
    }

    #[test]
    fn test_loader_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRACE.as_bytes()).unwrap();

        let classifier = ReplayLoader.load(REPLAY_MODEL_ID, file.path()).unwrap();
        assert_eq!(classifier.name(), "replay");
        assert!(classifier.classify(&frame(0)).unwrap().is_some());
    }

    #[test]
    fn test_loader_missing_file() {
        let result = ReplayLoader.load(REPLAY_MODEL_ID, Path::new("/nonexistent/trace.jsonl"));
        assert!(matches!(result, Err(ClassifierError::LoadFailed(_))));
    }
}
