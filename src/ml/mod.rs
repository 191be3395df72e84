//! Machine learning core for Commentary.
//!
//! This module holds the pieces that turn labelled comments into a
//! deployable model: the closed [`Category`] set, the TF-IDF vectorizer,
//! the multinomial logistic regression classifier, the fitted
//! [`CommentClassifier`] pair, and the on-disk model artifact.

pub mod artifact;
pub mod category;
pub mod logreg;
pub mod model;
pub mod tfidf;

pub use artifact::*;
pub use category::*;
pub use logreg::*;
pub use model::*;
pub use tfidf::*;

use serde::{Deserialize, Serialize};

/// Configuration for the machine learning components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MLConfig {
    /// Feature extraction settings.
    pub vectorizer: VectorizerConfig,
    /// Classifier hyperparameters.
    pub classifier: ClassifierConfig,
    /// Split and evaluation settings.
    pub training: TrainingConfig,
}

impl MLConfig {
    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), MLError> {
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        self.training.validate()
    }
}

/// Configuration for the TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Smallest and largest word n-gram size.
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
    /// Letter runs shorter than this are not tokens.
    pub min_token_len: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df: 1,
            max_df: 1.0,
            min_token_len: 2,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<(), MLError> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || max_n < min_n {
            return Err(MLError::invalid_parameter(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.min_df == 0 {
            return Err(MLError::invalid_parameter("min_df must be at least 1"));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(MLError::invalid_parameter(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.min_token_len == 0 {
            return Err(MLError::invalid_parameter("min_token_len must be at least 1"));
        }
        Ok(())
    }
}

/// Hyperparameters for the logistic regression classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Gradient descent step size.
    pub learning_rate: f64,
    /// Maximum number of full-batch iterations.
    pub max_iterations: usize,
    /// Stop when the loss changes by less than this between iterations.
    pub tolerance: f64,
    /// Stop when the gradient norm falls below this.
    pub gradient_tolerance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 1.0,
            max_iterations: 1000,
            tolerance: 1e-6,
            gradient_tolerance: 1e-5,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), MLError> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(MLError::invalid_parameter("c must be a positive number"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(MLError::invalid_parameter(
                "learning_rate must be a positive number",
            ));
        }
        if self.max_iterations == 0 {
            return Err(MLError::invalid_parameter("max_iterations must be at least 1"));
        }
        if self.tolerance < 0.0 || self.gradient_tolerance < 0.0 {
            return Err(MLError::invalid_parameter("tolerances must be non-negative"));
        }
        Ok(())
    }
}

/// Settings for the held-out evaluation split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation.
    pub test_size: f64,
    /// Seed for the split shuffle.
    pub seed: u64,
    /// Category assigned to batch rows that cannot be classified.
    pub fallback_category: Category,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            fallback_category: Category::IrrelevantSpam,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), MLError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(MLError::invalid_parameter(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

/// Machine learning error types.
#[derive(Debug, thiserror::Error)]
pub enum MLError {
    #[error("Training data insufficient: need at least {min_samples} samples, got {actual}")]
    InsufficientTrainingData { min_samples: usize, actual: usize },

    #[error("Training data needs at least 2 distinct categories, got {actual}")]
    InsufficientClasses { actual: usize },

    #[error("Invalid feature vector: {message}")]
    InvalidFeatureVector { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
}

impl MLError {
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        MLError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn invalid_features<S: Into<String>>(message: S) -> Self {
        MLError::InvalidFeatureVector {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ml_config_default() {
        let config = MLConfig::default();
        assert_eq!(config.vectorizer.ngram_range, (1, 2));
        assert_eq!(config.classifier.max_iterations, 1000);
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.training.fallback_category, Category::IrrelevantSpam);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = MLConfig::default();
        config.training.test_size = 1.0;
        assert!(config.validate().is_err());

        let mut config = MLConfig::default();
        config.vectorizer.ngram_range = (2, 1);
        assert!(config.validate().is_err());

        let mut config = MLConfig::default();
        config.classifier.c = 0.0;
        assert!(matches!(
            config.validate(),
            Err(MLError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MLConfig =
            serde_json::from_str(r#"{"classifier": {"max_iterations": 50}}"#).unwrap();
        assert_eq!(config.classifier.max_iterations, 50);
        assert_eq!(config.classifier.c, 1.0);
        assert_eq!(config.vectorizer, VectorizerConfig::default());
    }
}
