//! A fitted vectorizer and classifier pair.

use log::warn;

use crate::error::Result;
use crate::ml::{
    ArtifactMetadata, Category, ClassifierConfig, LogisticRegression, MLError, ModelArtifact,
    Prediction, TfIdfVectorizer, TrainingStats, VectorizerConfig,
};

/// Text in, category out: the TF-IDF vectorizer and the logistic regression
/// model trained on its output.
#[derive(Debug)]
pub struct CommentClassifier {
    vectorizer: TfIdfVectorizer,
    model: LogisticRegression,
    metadata: ArtifactMetadata,
}

impl CommentClassifier {
    /// Fit a vectorizer and a classifier on `texts` and `targets`.
    pub fn fit<S: AsRef<str>>(
        texts: &[S],
        targets: &[Category],
        vectorizer_config: &VectorizerConfig,
        classifier_config: &ClassifierConfig,
    ) -> Result<Self> {
        if texts.len() != targets.len() {
            return Err(MLError::DimensionMismatch {
                expected: texts.len(),
                actual: targets.len(),
            }
            .into());
        }

        let mut vectorizer = TfIdfVectorizer::new(vectorizer_config.clone())?;
        let features = vectorizer.fit_transform(texts)?;

        let mut model = LogisticRegression::new(classifier_config.clone());
        let stats = model.fit(&features, targets)?;

        Ok(Self {
            vectorizer,
            model,
            metadata: ArtifactMetadata::new(texts.len(), stats),
        })
    }

    /// Rebuild from a loaded artifact, checking that its parts agree.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let vectorizer = TfIdfVectorizer::from_parts(
            artifact.vectorizer,
            artifact.vocabulary,
            artifact.idf,
            artifact.metadata.documents,
        )?;
        let model = LogisticRegression::from_parts(
            artifact.classifier,
            artifact.labels,
            artifact.weights,
            artifact.biases,
        )?;
        if model.dimension() != vectorizer.vocabulary_size() {
            return Err(MLError::DimensionMismatch {
                expected: vectorizer.vocabulary_size(),
                actual: model.dimension(),
            }
            .into());
        }

        Ok(Self {
            vectorizer,
            model,
            metadata: artifact.metadata,
        })
    }

    /// Snapshot into a persistable artifact.
    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            metadata: self.metadata.clone(),
            vectorizer: self.vectorizer.config().clone(),
            classifier: self.model.config().clone(),
            vocabulary: self.vectorizer.vocabulary().clone(),
            idf: self.vectorizer.idf().to_vec(),
            weights: self.model.weights().to_vec(),
            biases: self.model.biases().to_vec(),
            labels: self.model.labels().to_vec(),
        }
    }

    /// Classify one text.
    ///
    /// Empty or whitespace-only text is not an error: the prediction comes
    /// from the biases alone and `empty_input` is set.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let features = self.vectorizer.transform(text)?;
        let mut prediction = self.model.predict_detailed(&features)?;

        if text.trim().is_empty() {
            warn!("empty comment text; prediction is based on class priors only");
            prediction.empty_input = true;
        }
        Ok(prediction)
    }

    /// Classify one text and return only the category.
    pub fn predict_category(&self, text: &str) -> Result<Category> {
        Ok(self.predict(text)?.category)
    }

    /// Fraction of `texts` predicted as their target.
    pub fn accuracy<S: AsRef<str>>(&self, texts: &[S], targets: &[Category]) -> Result<f64> {
        let features = self.vectorizer.transform_all(texts)?;
        self.model.accuracy(&features, targets)
    }

    pub fn labels(&self) -> &[Category] {
        self.model.labels()
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &LogisticRegression {
        &self.model
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut ArtifactMetadata {
        &mut self.metadata
    }

    pub fn training_stats(&self) -> &TrainingStats {
        &self.metadata.stats
    }
}
