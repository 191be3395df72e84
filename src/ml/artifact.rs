//! The persisted model artifact.
//!
//! An artifact is everything inference needs: the vectorizer settings, the
//! vocabulary with its idf weights, the classifier weight matrix and biases,
//! and the ordered label list. It is stored as JSON by default, or bincode
//! when the path ends in `.bin`.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so a failed save never leaves a partial artifact.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{CommentaryError, Result};
use crate::ml::{Category, ClassifierConfig, TrainingStats, VectorizerConfig};

/// Version written into every new artifact.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// On-disk encoding of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Bincode,
}

impl ArtifactFormat {
    /// Pick the encoding from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => ArtifactFormat::Bincode,
            _ => ArtifactFormat::Json,
        }
    }
}

/// Provenance and evaluation figures for a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub format_version: u32,
    /// Number of documents the shipped model was fitted on.
    pub documents: usize,
    pub train_accuracy: f64,
    pub heldout_accuracy: f64,
    pub stats: TrainingStats,
}

impl ArtifactMetadata {
    pub fn new(documents: usize, stats: TrainingStats) -> Self {
        Self {
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            format_version: ARTIFACT_FORMAT_VERSION,
            documents,
            train_accuracy: 0.0,
            heldout_accuracy: 0.0,
            stats,
        }
    }
}

/// The deployable unit written by training and read by inference.
///
/// Row `i` of `weights` and `biases[i]` belong to `labels[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub labels: Vec<Category>,
}

impl ModelArtifact {
    /// Serialize in the given format.
    pub fn encode(&self, format: ArtifactFormat) -> Result<Vec<u8>> {
        Ok(match format {
            ArtifactFormat::Json => serde_json::to_vec_pretty(self)?,
            ArtifactFormat::Bincode => bincode::serialize(self)?,
        })
    }

    /// Deserialize from the given format.
    pub fn decode(bytes: &[u8], format: ArtifactFormat) -> Result<Self> {
        Ok(match format {
            ArtifactFormat::Json => serde_json::from_slice(bytes)?,
            ArtifactFormat::Bincode => bincode::deserialize(bytes)?,
        })
    }

    /// Atomically write the artifact to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self
            .encode(ArtifactFormat::from_path(path))
            .map_err(|e| CommentaryError::artifact(path, e.to_string()))?;

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| CommentaryError::artifact(path, e.to_string()))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| CommentaryError::artifact(path, e.to_string()))?;
        temp.write_all(&bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| CommentaryError::artifact(path, e.to_string()))?;
        temp.persist(path)
            .map_err(|e| CommentaryError::artifact(path, e.error.to_string()))?;

        info!(
            "saved model {} ({} labels, {} terms) to {}",
            self.metadata.model_id,
            self.labels.len(),
            self.vocabulary.len(),
            path.display()
        );
        Ok(())
    }

    /// Read an artifact from `path`.
    ///
    /// A missing file is [`CommentaryError::ModelNotTrained`]; an unreadable
    /// or undecodable one is [`CommentaryError::ArtifactIo`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CommentaryError::not_trained(path));
        }

        let bytes = fs::read(path).map_err(|e| CommentaryError::artifact(path, e.to_string()))?;
        let artifact = Self::decode(&bytes, ArtifactFormat::from_path(path))
            .map_err(|e| CommentaryError::artifact(path, e.to_string()))?;

        if artifact.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CommentaryError::artifact(
                path,
                format!(
                    "unsupported format version {} (expected {})",
                    artifact.metadata.format_version, ARTIFACT_FORMAT_VERSION
                ),
            ));
        }

        info!(
            "loaded model {} trained at {} from {}",
            artifact.metadata.model_id,
            artifact.metadata.trained_at,
            path.display()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ModelArtifact {
        ModelArtifact {
            metadata: ArtifactMetadata::new(4, TrainingStats::default()),
            vectorizer: VectorizerConfig::default(),
            classifier: ClassifierConfig::default(),
            vocabulary: [("great".to_string(), 0), ("trash".to_string(), 1)].into(),
            idf: vec![1.0, 1.4054651081081644],
            weights: vec![vec![0.123456789012, -0.5], vec![-0.25, 0.987654321]],
            biases: vec![0.1, -0.1],
            labels: vec![Category::Praise, Category::HateAbuse],
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ArtifactFormat::from_path("model.json"), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path("model"), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from_path("model.BIN"), ArtifactFormat::Bincode);
    }

    #[test]
    fn test_save_load_json_and_bincode() {
        let dir = TempDir::new().unwrap();
        let artifact = sample();

        for name in ["model.json", "model.bin"] {
            let path = dir.path().join(name);
            artifact.save(&path).unwrap();
            let loaded = ModelArtifact::load(&path).unwrap();
            assert_eq!(loaded, artifact);
        }
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.json");
        sample().save(&path).unwrap();

        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_load_missing_is_not_trained() {
        let dir = TempDir::new().unwrap();
        let err = ModelArtifact::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CommentaryError::ModelNotTrained { .. }));
    }

    #[test]
    fn test_load_corrupt_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"{ not json").unwrap();
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, CommentaryError::ArtifactIo { .. }));
    }

    #[test]
    fn test_load_rejects_future_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        let mut artifact = sample();
        artifact.metadata.format_version = ARTIFACT_FORMAT_VERSION + 1;
        artifact.save(&path).unwrap();
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported format version"));
    }
}
