//! Multinomial logistic regression over sparse TF-IDF features.
//!
//! One linear score per category, `score_c = w_c · x + b_c`, turned into
//! probabilities with a max-shifted softmax. Fitting runs full-batch
//! gradient descent on
//!
//! ```text
//! L(W, b) = mean_i(-ln p(y_i | x_i)) + (λ / 2) ‖W‖²,   λ = 1 / (C · n)
//! ```
//!
//! which has the same minimizer as `C · Σ loss + ½‖W‖²`. Biases are not
//! regularized. Iteration stops when the loss changes by less than
//! `tolerance`, the gradient norm drops below `gradient_tolerance`, or
//! `max_iterations` is reached.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::{Category, ClassifierConfig, FeatureVector, MLError};

/// Training statistics for one fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Number of gradient steps taken.
    pub iterations: usize,
    /// Objective value after the last step.
    pub final_loss: f64,
    /// Whether a tolerance was met before `max_iterations`.
    pub converged: bool,
    /// Objective value after every step.
    pub loss_history: Vec<f64>,
}

/// A single classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// The argmax category.
    pub category: Category,
    /// Probability of `category`.
    pub confidence: f64,
    /// Probability of every known label, in label order.
    pub scores: Vec<(Category, f64)>,
    /// The input had no text to classify; the result comes from biases alone.
    pub empty_input: bool,
}

/// Softmax of `scores`, shifted by the maximum for numerical stability.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; the first one wins on ties.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Multiclass L2-regularized logistic regression.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    config: ClassifierConfig,
    labels: Vec<Category>,
    /// `[labels.len() × dimension]`, row order matches `labels`.
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    stats: Option<TrainingStats>,
}

impl LogisticRegression {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            labels: Vec::new(),
            weights: Vec::new(),
            biases: Vec::new(),
            stats: None,
        }
    }

    /// Rebuild a trained model from persisted parameters.
    pub fn from_parts(
        config: ClassifierConfig,
        labels: Vec<Category>,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if labels.is_empty() {
            return Err(MLError::InsufficientClasses { actual: 0 }.into());
        }
        if weights.len() != labels.len() {
            return Err(MLError::DimensionMismatch {
                expected: labels.len(),
                actual: weights.len(),
            }
            .into());
        }
        if biases.len() != labels.len() {
            return Err(MLError::DimensionMismatch {
                expected: labels.len(),
                actual: biases.len(),
            }
            .into());
        }
        let dimension = weights[0].len();
        if let Some(row) = weights.iter().find(|row| row.len() != dimension) {
            return Err(MLError::DimensionMismatch {
                expected: dimension,
                actual: row.len(),
            }
            .into());
        }
        if labels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(MLError::invalid_parameter(
                "labels must be distinct and in canonical category order",
            )
            .into());
        }

        Ok(Self {
            config,
            labels,
            weights,
            biases,
            stats: None,
        })
    }

    /// Fit the model. Labels are the distinct categories in `targets`,
    /// in canonical order.
    pub fn fit(&mut self, features: &[FeatureVector], targets: &[Category]) -> Result<TrainingStats> {
        self.config.validate()?;
        if features.len() != targets.len() {
            return Err(MLError::DimensionMismatch {
                expected: features.len(),
                actual: targets.len(),
            }
            .into());
        }
        if features.len() < 2 {
            return Err(MLError::InsufficientTrainingData {
                min_samples: 2,
                actual: features.len(),
            }
            .into());
        }

        let dimension = features[0].dimension();
        if let Some(x) = features.iter().find(|x| x.dimension() != dimension) {
            return Err(MLError::DimensionMismatch {
                expected: dimension,
                actual: x.dimension(),
            }
            .into());
        }

        let mut labels: Vec<Category> = targets.to_vec();
        labels.sort();
        labels.dedup();
        if labels.len() < 2 {
            return Err(MLError::InsufficientClasses {
                actual: labels.len(),
            }
            .into());
        }

        let y: Vec<usize> = targets
            .iter()
            .map(|t| labels.binary_search(t).unwrap_or_default())
            .collect();

        let k = labels.len();
        let n = features.len() as f64;
        let lambda = 1.0 / (self.config.c * n);

        self.labels = labels;
        self.weights = vec![vec![0.0; dimension]; k];
        self.biases = vec![0.0; k];

        let mut step = self.config.learning_rate;
        let mut loss = self.objective(features, &y, lambda);
        let mut history = Vec::new();
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let (grad_w, grad_b) = self.gradient(features, &y, lambda);
            let grad_norm = grad_w
                .iter()
                .flatten()
                .chain(grad_b.iter())
                .map(|g| g * g)
                .sum::<f64>()
                .sqrt();
            if grad_norm < self.config.gradient_tolerance {
                converged = true;
                break;
            }

            let previous_weights = self.weights.clone();
            let previous_biases = self.biases.clone();
            self.apply_step(&grad_w, &grad_b, step);
            let mut new_loss = self.objective(features, &y, lambda);

            // Overshot: back off until the objective no longer rises.
            while new_loss > loss && step > 1e-12 {
                step *= 0.5;
                self.weights = previous_weights.clone();
                self.biases = previous_biases.clone();
                self.apply_step(&grad_w, &grad_b, step);
                new_loss = self.objective(features, &y, lambda);
            }

            iterations += 1;
            history.push(new_loss);
            let change = (loss - new_loss).abs();
            loss = new_loss;

            if iterations % 100 == 0 {
                debug!("iteration {iterations}: loss {loss:.6}, gradient norm {grad_norm:.6}");
            }
            if change < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "logistic regression did not converge in {} iterations (loss {:.6})",
                self.config.max_iterations, loss
            );
        }

        let stats = TrainingStats {
            iterations,
            final_loss: loss,
            converged,
            loss_history: history,
        };
        self.stats = Some(stats.clone());
        Ok(stats)
    }

    /// Raw linear scores, one per label.
    pub fn decision_function(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        self.check_input(x)?;
        Ok(self.scores(x))
    }

    /// Softmax probabilities, one per label.
    pub fn predict_proba(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        Ok(softmax(&self.decision_function(x)?))
    }

    /// The most probable category. Ties go to the earlier label.
    pub fn predict(&self, x: &FeatureVector) -> Result<Category> {
        Ok(self.predict_detailed(x)?.category)
    }

    /// Category, confidence and the full probability table.
    pub fn predict_detailed(&self, x: &FeatureVector) -> Result<Prediction> {
        let probabilities = self.predict_proba(x)?;
        let best = argmax(&probabilities).ok_or(MLError::InsufficientClasses { actual: 0 })?;

        Ok(Prediction {
            category: self.labels[best],
            confidence: probabilities[best],
            scores: self.labels.iter().copied().zip(probabilities).collect(),
            empty_input: false,
        })
    }

    /// Fraction of `features` whose prediction equals the target.
    pub fn accuracy(&self, features: &[FeatureVector], targets: &[Category]) -> Result<f64> {
        if features.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0usize;
        for (x, target) in features.iter().zip(targets) {
            if self.predict(x)? == *target {
                correct += 1;
            }
        }
        Ok(correct as f64 / features.len() as f64)
    }

    pub fn labels(&self) -> &[Category] {
        &self.labels
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Statistics from the last `fit`, if any.
    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.stats.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Number of feature columns the model expects.
    pub fn dimension(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn check_input(&self, x: &FeatureVector) -> Result<()> {
        if !self.is_trained() {
            return Err(MLError::InsufficientClasses { actual: 0 }.into());
        }
        if x.dimension() != self.dimension() {
            return Err(MLError::DimensionMismatch {
                expected: self.dimension(),
                actual: x.dimension(),
            }
            .into());
        }
        Ok(())
    }

    fn scores(&self, x: &FeatureVector) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| x.dot(row) + bias)
            .collect()
    }

    fn objective(&self, features: &[FeatureVector], y: &[usize], lambda: f64) -> f64 {
        let mut data_loss = 0.0;
        for (x, &target) in features.iter().zip(y) {
            let scores = self.scores(x);
            let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln() + max;
            data_loss += log_sum - scores[target];
        }
        let penalty: f64 = self.weights.iter().flatten().map(|w| w * w).sum();
        data_loss / features.len() as f64 + 0.5 * lambda * penalty
    }

    fn gradient(
        &self,
        features: &[FeatureVector],
        y: &[usize],
        lambda: f64,
    ) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = features.len() as f64;
        let mut grad_w: Vec<Vec<f64>> = self
            .weights
            .iter()
            .map(|row| row.iter().map(|w| lambda * w).collect())
            .collect();
        let mut grad_b = vec![0.0; self.biases.len()];

        for (x, &target) in features.iter().zip(y) {
            let probabilities = softmax(&self.scores(x));
            for (c, p) in probabilities.into_iter().enumerate() {
                let residual = (p - if c == target { 1.0 } else { 0.0 }) / n;
                grad_b[c] += residual;
                for (index, value) in x.iter() {
                    grad_w[c][index] += residual * value;
                }
            }
        }

        (grad_w, grad_b)
    }

    fn apply_step(&mut self, grad_w: &[Vec<f64>], grad_b: &[f64], step: f64) {
        for (row, grad_row) in self.weights.iter_mut().zip(grad_w) {
            for (w, g) in row.iter_mut().zip(grad_row) {
                *w -= step * g;
            }
        }
        for (b, g) in self.biases.iter_mut().zip(grad_b) {
            *b -= step * g;
        }
    }
}
