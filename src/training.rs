//! End-to-end training: dataset in, artifact out.
//!
//! 1. Load the CSV and drop incomplete rows.
//! 2. Fit on a stratified 80/20 split and measure train and held-out
//!    accuracy. These figures are reported, not enforced.
//! 3. Refit on every row and write that model as the artifact.
//!
//! Any failure before the final atomic rename leaves no artifact behind.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::dataset::{self, LabeledDataset};
use crate::error::Result;
use crate::ml::{Category, CommentClassifier, MLConfig, MLError, TrainingStats};

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Accuracy of the split model on its own training rows.
    pub train_accuracy: f64,
    /// Accuracy of the split model on the held-out rows; 0 when none were held out.
    pub heldout_accuracy: f64,
    /// Labels of the shipped model, in canonical order.
    pub labels: Vec<Category>,
    /// Optimizer statistics of the shipped model.
    pub stats: TrainingStats,
    pub artifact_path: PathBuf,
}

/// Fits and persists comment classifiers.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: MLConfig,
}

impl Trainer {
    pub fn new(config: MLConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MLConfig {
        &self.config
    }

    /// Train on the CSV at `dataset_path` and write the artifact to
    /// `artifact_path`.
    pub fn train<D: AsRef<Path>, A: AsRef<Path>>(
        &self,
        dataset_path: D,
        artifact_path: A,
    ) -> Result<TrainingReport> {
        self.config.validate()?;
        let dataset = dataset::load_labeled(dataset_path.as_ref())?;
        info!(
            "loaded {} usable rows from {}",
            dataset.len(),
            dataset_path.as_ref().display()
        );
        self.train_dataset(&dataset, artifact_path)
    }

    /// Train on an already loaded dataset.
    pub fn train_dataset<A: AsRef<Path>>(
        &self,
        dataset: &LabeledDataset,
        artifact_path: A,
    ) -> Result<TrainingReport> {
        let artifact_path = artifact_path.as_ref();
        let (mut classifier, report) = self.fit(dataset)?;

        let metadata = classifier.metadata_mut();
        metadata.train_accuracy = report.train_accuracy;
        metadata.heldout_accuracy = report.heldout_accuracy;
        classifier.to_artifact().save(artifact_path)?;

        Ok(TrainingReport {
            artifact_path: artifact_path.to_path_buf(),
            ..report
        })
    }

    /// Evaluate on a split, then fit the shipped model on all rows.
    /// Nothing is written.
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<(CommentClassifier, TrainingReport)> {
        self.config.validate()?;
        let categories = dataset.categories();
        if dataset.len() < 2 {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 2,
                actual: dataset.len(),
            }
            .into());
        }
        if categories.len() < 2 {
            return Err(MLError::InsufficientClasses {
                actual: categories.len(),
            }
            .into());
        }

        let training = &self.config.training;
        let (train_idx, test_idx) =
            dataset::stratified_split(&dataset.labels, training.test_size, training.seed);
        let (train_texts, train_labels) = dataset.subset(&train_idx);
        let (test_texts, test_labels) = dataset.subset(&test_idx);

        let evaluation = CommentClassifier::fit(
            &train_texts,
            &train_labels,
            &self.config.vectorizer,
            &self.config.classifier,
        )?;
        let train_accuracy = evaluation.accuracy(&train_texts, &train_labels)?;
        let heldout_accuracy = if test_texts.is_empty() {
            warn!("no rows held out for evaluation; held-out accuracy reported as 0");
            0.0
        } else {
            evaluation.accuracy(&test_texts, &test_labels)?
        };
        info!(
            "train accuracy {:.4} on {} rows, held-out accuracy {:.4} on {} rows",
            train_accuracy,
            train_texts.len(),
            heldout_accuracy,
            test_texts.len()
        );

        let classifier = CommentClassifier::fit(
            &dataset.texts,
            &dataset.labels,
            &self.config.vectorizer,
            &self.config.classifier,
        )?;
        let stats = classifier.training_stats().clone();
        info!(
            "final model: {} labels, {} terms, {} iterations (converged: {})",
            classifier.labels().len(),
            classifier.vectorizer().vocabulary_size(),
            stats.iterations,
            stats.converged
        );

        let report = TrainingReport {
            rows_loaded: dataset.rows_loaded,
            rows_dropped: dataset.rows_dropped,
            train_rows: train_texts.len(),
            test_rows: test_texts.len(),
            train_accuracy,
            heldout_accuracy,
            labels: classifier.labels().to_vec(),
            stats,
            artifact_path: PathBuf::new(),
        };
        Ok((classifier, report))
    }
}

/// Train with `config` on `dataset_path`, writing to `artifact_path`.
pub fn train<D: AsRef<Path>, A: AsRef<Path>>(
    dataset_path: D,
    artifact_path: A,
    config: &MLConfig,
) -> Result<TrainingReport> {
    Trainer::new(config.clone()).train(dataset_path, artifact_path)
}
