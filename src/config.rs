//! Application configuration.
//!
//! Every field has a default, so a JSON config file only needs to name what
//! it changes:
//!
//! ```json
//! {
//!   "artifact_path": "models/comments.bin",
//!   "ml": { "classifier": { "c": 4.0 } },
//!   "replies": { "Praise": ["Cheers!"] }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CommentaryError, Result};
use crate::ml::MLConfig;
use crate::policy::{ReplyPolicy, ReplyTemplates};

/// Default location of the trained model.
pub const DEFAULT_ARTIFACT_PATH: &str = "comment_model.json";

/// Default location of the training data.
pub const DEFAULT_DATASET_PATH: &str = "comment_dataset.csv";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentaryConfig {
    pub artifact_path: PathBuf,
    pub dataset_path: PathBuf,
    pub ml: MLConfig,
    /// Per-category reply overrides merged over the built-in templates.
    pub replies: Option<ReplyTemplates>,
    /// Seed for reply selection; random when unset.
    pub reply_seed: Option<u64>,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            ml: MLConfig::default(),
            replies: None,
            reply_seed: None,
        }
    }
}

impl CommentaryConfig {
    /// Read a JSON config file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CommentaryError::invalid_config(format!("cannot open {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.ml
            .validate()
            .map_err(|e| CommentaryError::invalid_config(e.to_string()))?;
        if self.artifact_path.as_os_str().is_empty() {
            return Err(CommentaryError::invalid_config("artifact_path is empty"));
        }
        Ok(())
    }

    /// Built-in templates with any configured overrides applied.
    pub fn reply_templates(&self) -> ReplyTemplates {
        let mut templates = ReplyTemplates::default();
        if let Some(overrides) = &self.replies {
            templates.merge(overrides);
        }
        templates
    }

    /// The reply policy this configuration describes.
    pub fn reply_policy(&self) -> Result<ReplyPolicy> {
        let policy = ReplyPolicy::new(self.reply_templates())?;
        Ok(match self.reply_seed {
            Some(seed) => policy.with_seed(seed),
            None => policy,
        })
    }
}
