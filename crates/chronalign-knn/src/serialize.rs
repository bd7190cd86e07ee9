//! Model set persistence as versioned JSON.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::KnnError;
use crate::knn::KnnClassifier;
use crate::model_set::ModelSet;

/// Current model file format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope written around the model set.
#[derive(serde::Serialize)]
struct ModelEnvelope<'a> {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Width of the shared input vector.
    num_inputs: usize,
    /// Number of models.
    num_outputs: usize,
    /// Input names, one per input.
    input_names: &'a [String],
    /// The serialized models.
    models: &'a [KnnClassifier],
}

/// Owned counterpart of [`ModelEnvelope`] used when reading. The version is
/// checked separately through [`VersionProbe`].
#[derive(serde::Deserialize)]
struct OwnedEnvelope {
    num_inputs: usize,
    num_outputs: usize,
    input_names: Vec<String>,
    models: Vec<KnnClassifier>,
}

/// Peeked before the full parse so a newer layout reports its version
/// instead of a field error.
#[derive(serde::Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl ModelSet {
    /// Render the model set as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`KnnError::SerializeModel`] if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, KnnError> {
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            num_inputs: self.num_inputs,
            num_outputs: self.models.len(),
            input_names: &self.input_names,
            models: &self.models,
        };
        serde_json::to_string_pretty(&envelope).map_err(|e| KnnError::SerializeModel { source: e })
    }

    /// Parse a model set from JSON produced by [`ModelSet::to_json`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::ParseModel`] | The text is not a model envelope |
    /// | [`KnnError::IncompatibleModelVersion`] | Format version mismatch |
    /// | [`KnnError::InvalidModel`] | Envelope metadata disagrees with the models, or a model is malformed |
    pub fn from_json(text: &str) -> Result<Self, KnnError> {
        let probe: VersionProbe =
            serde_json::from_str(text).map_err(|e| KnnError::ParseModel { source: e })?;
        if probe.format_version != FORMAT_VERSION {
            return Err(KnnError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: probe.format_version,
            });
        }

        let envelope: OwnedEnvelope =
            serde_json::from_str(text).map_err(|e| KnnError::ParseModel { source: e })?;

        if envelope.num_outputs != envelope.models.len() {
            return Err(KnnError::InvalidModel {
                reason: format!(
                    "header declares {} outputs but {} models are stored",
                    envelope.num_outputs,
                    envelope.models.len()
                ),
            });
        }

        let set = Self {
            num_inputs: envelope.num_inputs,
            input_names: envelope.input_names,
            models: envelope.models,
        };
        set.validate().map_err(|e| match e {
            KnnError::InvalidModel { .. } => e,
            other => KnnError::InvalidModel {
                reason: other.to_string(),
            },
        })?;
        Ok(set)
    }

    /// Save the model set to a JSON file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::SerializeModel`] | JSON encoding failed |
    /// | [`KnnError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), KnnError> {
        let path = path.as_ref();
        let text = self.to_json()?;

        std::fs::write(path, &text).map_err(|e| KnnError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = text.len(),
            num_outputs = self.models.len(),
            "model set saved"
        );
        Ok(())
    }

    /// Load a model set from a JSON file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`KnnError::ReadModel`] | file read failed |
    /// | [`KnnError::ParseModel`] | The file is not a model envelope |
    /// | [`KnnError::IncompatibleModelVersion`] | Format version mismatch |
    /// | [`KnnError::InvalidModel`] | The stored models are malformed |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KnnError> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).map_err(|e| KnnError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;
        let set = Self::from_json(&text)?;

        debug!(
            num_inputs = set.num_inputs,
            num_outputs = set.models.len(),
            "model set parsed"
        );
        info!(path = %path.display(), "model set loaded");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::error::KnnError;
    use crate::model_set::{ModelSet, TrainingExample};

    fn trained() -> ModelSet {
        let rows = vec![
            TrainingExample::new(vec![1.0, 0.0], vec![0]),
            TrainingExample::new(vec![2.0, 0.0], vec![0]),
            TrainingExample::new(vec![10.0, 0.0], vec![1]),
            TrainingExample::new(vec![11.0, 0.0], vec![1]),
        ];
        ModelSet::train(&rows, 1)
            .unwrap()
            .with_input_names(vec!["x".into(), "y".into()])
            .unwrap()
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");

        let set = trained();
        set.save(&path).unwrap();
        let loaded = ModelSet::load(&path).unwrap();

        assert_eq!(loaded, set);
        for probe in [[0.0, 0.0], [1.6, 0.0], [9.0, 1.0], [20.0, 0.0]] {
            assert_eq!(loaded.process(&probe).unwrap(), set.process(&probe).unwrap());
        }
    }

    #[test]
    fn json_carries_envelope_fields() {
        let text = trained().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["format_version"], 1);
        assert_eq!(value["num_inputs"], 2);
        assert_eq!(value["num_outputs"], 1);
        assert_eq!(value["input_names"][1], "y");
        assert_eq!(value["models"][0]["k"], 1);
    }

    #[test]
    fn version_mismatch_rejected() {
        let text = trained().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["format_version"] = serde_json::json!(999);

        let err = ModelSet::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            KnnError::IncompatibleModelVersion {
                expected: 1,
                found: 999
            }
        ));
    }

    #[test]
    fn output_count_mismatch_rejected() {
        let text = trained().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["num_outputs"] = serde_json::json!(3);
        let err = ModelSet::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, KnnError::InvalidModel { .. }));
    }

    #[test]
    fn zero_k_in_file_rejected() {
        let text = trained().to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["models"][0]["k"] = serde_json::json!(0);
        let err = ModelSet::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, KnnError::InvalidModel { .. }));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            ModelSet::from_json("not json"),
            Err(KnnError::ParseModel { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        match ModelSet::load(&path).unwrap_err() {
            KnnError::ReadModel { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
