//! TF-IDF vectorizer for comment text.
//!
//! Fitting counts, for every analyzed term, how many training documents
//! contain it and derives a smoothed inverse document frequency
//! `ln((1 + N) / (1 + df)) + 1`. Transforming weights each in-vocabulary
//! term count by its idf and L2-normalizes the result. Terms the vectorizer
//! has never seen are ignored, so any input text maps to a vector of the
//! same dimension.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, CommentAnalyzer};
use crate::error::Result;
use crate::ml::{MLError, VectorizerConfig};

/// A sparse, L2-normalized feature vector.
///
/// Entries are kept sorted by index; indices outside `0..dimension` never
/// occur.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    dimension: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// An all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a vector from `(index, value)` pairs. Pairs must be unique by
    /// index; they are sorted here.
    pub fn from_pairs(dimension: usize, mut pairs: Vec<(usize, f64)>) -> Result<Self> {
        pairs.sort_by_key(|(index, _)| *index);
        if let Some((index, _)) = pairs.iter().find(|(index, _)| *index >= dimension) {
            return Err(MLError::invalid_features(format!(
                "index {index} out of range for dimension {dimension}"
            ))
            .into());
        }
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(MLError::invalid_features("duplicate feature index").into());
        }

        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self {
            dimension,
            indices,
            values,
        })
    }

    /// Number of dimensions (the vocabulary size).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// True if no entry is non-zero.
    pub fn is_zero(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the non-zero `(index, value)` entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    /// Dot product with a dense weight row of the same dimension.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .map(|(index, value)| dense.get(index).copied().unwrap_or(0.0) * value)
            .sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Expand into a dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for (index, value) in self.iter() {
            dense[index] = value;
        }
        dense
    }
}

/// TF-IDF vectorizer for text feature extraction.
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
    /// Term -> column index, assigned in sorted term order.
    vocabulary: BTreeMap<String, usize>,
    /// Inverse document frequency for each column.
    idf: Vec<f64>,
    /// Number of documents seen by the last fit.
    n_documents: usize,
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer using the comment analyzer for `config`.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = Arc::new(CommentAnalyzer::from_config(&config)?);
        Ok(Self::with_analyzer(config, analyzer))
    }

    /// Create an unfitted vectorizer with a custom analyzer.
    pub fn with_analyzer(config: VectorizerConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            config,
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            n_documents: 0,
            analyzer,
        }
    }

    /// Rebuild a fitted vectorizer from persisted state.
    pub fn from_parts(
        config: VectorizerConfig,
        vocabulary: BTreeMap<String, usize>,
        idf: Vec<f64>,
        n_documents: usize,
    ) -> Result<Self> {
        if vocabulary.len() != idf.len() {
            return Err(MLError::DimensionMismatch {
                expected: vocabulary.len(),
                actual: idf.len(),
            }
            .into());
        }
        let mut seen = vec![false; idf.len()];
        for (term, &index) in &vocabulary {
            if index >= seen.len() || seen[index] {
                return Err(MLError::invalid_features(format!(
                    "vocabulary index {index} for '{term}' is out of range or repeated"
                ))
                .into());
            }
            seen[index] = true;
        }

        let mut vectorizer = Self::new(config)?;
        vectorizer.vocabulary = vocabulary;
        vectorizer.idf = idf;
        vectorizer.n_documents = n_documents;
        Ok(vectorizer)
    }

    /// Fit the vectorizer on training documents.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        if documents.is_empty() {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 1,
                actual: 0,
            }
            .into());
        }

        let n_documents = documents.len();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let unique_terms: BTreeSet<String> =
                self.analyzer.terms(doc.as_ref())?.into_iter().collect();
            for term in unique_terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.config.max_df * n_documents as f64;
        let kept: BTreeMap<String, usize> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= self.config.min_df && *df as f64 <= max_doc_count)
            .collect();

        if kept.is_empty() {
            return Err(MLError::invalid_features(
                "empty vocabulary: training documents contain only stop words or no letters",
            )
            .into());
        }

        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(kept.len());
        for (index, (term, df)) in kept.into_iter().enumerate() {
            idf.push(((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        debug!(
            "fitted vocabulary of {} terms over {} documents",
            vocabulary.len(),
            n_documents
        );

        self.vocabulary = vocabulary;
        self.idf = idf;
        self.n_documents = n_documents;

        Ok(())
    }

    /// Transform a document into a TF-IDF feature vector.
    pub fn transform(&self, document: &str) -> Result<FeatureVector> {
        // Ordered by index so the norm is summed in the same order every time.
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.analyzer.terms(document)? {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut pairs: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();

        let norm = pairs.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut pairs {
                *weight /= norm;
            }
        }

        FeatureVector::from_pairs(self.vocabulary.len(), pairs)
    }

    /// Transform many documents.
    pub fn transform_all<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<FeatureVector>> {
        documents
            .iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }

    /// Fit on `documents` and return their vectors.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<FeatureVector>> {
        self.fit(documents)?;
        self.transform_all(documents)
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Whether `fit` has produced a vocabulary.
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(documents: &[&str]) -> TfIdfVectorizer {
        let mut vectorizer = TfIdfVectorizer::new(VectorizerConfig::default()).unwrap();
        vectorizer.fit(documents).unwrap();
        vectorizer
    }

    #[test]
    fn test_tfidf_vectorizer() {
        let vectorizer = fitted(&["great video", "terrible audio", "great audio quality"]);

        // great, video, terrible, audio, quality + 4 bigrams
        assert_eq!(vectorizer.vocabulary_size(), 9);
        assert_eq!(vectorizer.n_documents(), 3);

        let features = vectorizer.transform("great video").unwrap();
        assert_eq!(features.dimension(), vectorizer.vocabulary_size());
        assert!((features.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoothed_idf() {
        let vectorizer = fitted(&["great video", "great audio"]);
        let great = vectorizer.vocabulary()["great"];
        let video = vectorizer.vocabulary()["video"];

        // N = 2, df(great) = 2, df(video) = 1
        assert!((vectorizer.idf()[great] - 1.0).abs() < 1e-12);
        assert!((vectorizer.idf()[video] - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let vectorizer = fitted(&["zebra apple", "mango"]);
        let terms: Vec<_> = vectorizer.vocabulary().iter().collect();
        for (i, (_, index)) in terms.iter().enumerate() {
            assert_eq!(**index, i);
        }
        assert_eq!(vectorizer.vocabulary()["apple"], 0);
    }

    #[test]
    fn test_out_of_vocabulary_and_empty_text() {
        let vectorizer = fitted(&["great video", "terrible audio"]);

        let unseen = vectorizer.transform("completely unknown words").unwrap();
        assert!(unseen.is_zero());
        assert_eq!(unseen.dimension(), vectorizer.vocabulary_size());

        let empty = vectorizer.transform("").unwrap();
        assert!(empty.is_zero());
        assert_eq!(empty.to_dense(), vec![0.0; vectorizer.vocabulary_size()]);

        let mixed = vectorizer.transform("great unknown").unwrap();
        assert_eq!(mixed.nnz(), 1);
        assert!((mixed.get(vectorizer.vocabulary()["great"]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_is_bit_exact() {
        let vectorizer = fitted(&[
            "great video great editing",
            "terrible audio quality",
            "great audio terrible lighting",
            "editing quality lighting video",
        ]);
        let text = "great video terrible audio quality editing lighting great audio";

        // Reference: raw weights normalized with the norm summed in index order.
        let mut raw = vec![0.0; vectorizer.vocabulary_size()];
        let analyzer = CommentAnalyzer::from_config(vectorizer.config()).unwrap();
        for term in analyzer.terms(text).unwrap() {
            if let Some(&index) = vectorizer.vocabulary().get(&term) {
                raw[index] += 1.0;
            }
        }
        for (index, weight) in raw.iter_mut().enumerate() {
            *weight *= vectorizer.idf()[index];
        }
        let norm = raw.iter().map(|w| w * w).sum::<f64>().sqrt();

        let first = vectorizer.transform(text).unwrap();
        for (index, weight) in first.iter() {
            assert_eq!(weight.to_bits(), (raw[index] / norm).to_bits());
        }
        for _ in 0..20 {
            assert_eq!(vectorizer.transform(text).unwrap(), first);
        }
    }

    #[test]
    fn test_min_df_cutoff() {
        let config = VectorizerConfig {
            min_df: 2,
            ..VectorizerConfig::default()
        };
        let mut vectorizer = TfIdfVectorizer::new(config).unwrap();
        vectorizer
            .fit(&["great video", "great audio", "great content"])
            .unwrap();
        assert_eq!(vectorizer.vocabulary_size(), 1);
        assert!(vectorizer.vocabulary().contains_key("great"));
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let mut vectorizer = TfIdfVectorizer::new(VectorizerConfig::default()).unwrap();
        assert!(vectorizer.fit(&["the and of", "!!!"]).is_err());
        assert!(vectorizer.fit::<&str>(&[]).is_err());
    }

    #[test]
    fn test_from_parts_validates() {
        let vocabulary: BTreeMap<String, usize> =
            [("great".to_string(), 0), ("video".to_string(), 1)].into();
        assert!(
            TfIdfVectorizer::from_parts(VectorizerConfig::default(), vocabulary.clone(), vec![1.0], 2)
                .is_err()
        );

        let restored =
            TfIdfVectorizer::from_parts(VectorizerConfig::default(), vocabulary, vec![1.0, 1.5], 2)
                .unwrap();
        assert!(restored.is_fitted());
        assert_eq!(restored.transform("video").unwrap().nnz(), 1);
    }

    #[test]
    fn test_feature_vector_dot() {
        let v = FeatureVector::from_pairs(4, vec![(3, 0.5), (1, 2.0)]).unwrap();
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (3, 0.5)]);
        assert_eq!(v.dot(&[1.0, 1.0, 1.0, 2.0]), 3.0);
        assert!(FeatureVector::from_pairs(2, vec![(2, 1.0)]).is_err());
        assert!(FeatureVector::from_pairs(3, vec![(1, 1.0), (1, 2.0)]).is_err());
    }
}
