//! Labelled comment datasets.
//!
//! Training data is a CSV file whose header names a `comment_text` column and
//! a `category` column; any other columns are ignored. Rows missing either
//! value are dropped. A present label that is not one of the eight category
//! labels fails the load.
//!
//! ```csv
//! comment_text,category
//! Great video!,Praise
//! You are trash,Hate/Abuse
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use log::{debug, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{CommentaryError, Result};
use crate::ml::Category;

/// Column holding the comment body.
pub const TEXT_COLUMN: &str = "comment_text";

/// Column holding the ground-truth category label.
pub const LABEL_COLUMN: &str = "category";

/// Comments with their categories, after dropping incomplete rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub texts: Vec<String>,
    pub labels: Vec<Category>,
    /// Data rows read from the file, before dropping.
    pub rows_loaded: usize,
    /// Rows discarded for a missing or empty text or label.
    pub rows_dropped: usize,
}

impl LabeledDataset {
    /// Number of usable rows.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Distinct categories present, in canonical order.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories = self.labels.clone();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Rows at the given positions.
    pub fn subset(&self, indices: &[usize]) -> (Vec<String>, Vec<Category>) {
        indices
            .iter()
            .map(|&i| (self.texts[i].clone(), self.labels[i]))
            .unzip()
    }
}

/// Read a labelled dataset from a CSV file.
///
/// Fails with [`CommentaryError::DatasetNotFound`] before reading anything if
/// `path` is not a file, and with [`CommentaryError::MissingRequiredColumn`]
/// if the header lacks either required column. Data row numbers in
/// [`CommentaryError::InvalidLabel`] count from 1 after the header.
pub fn load_labeled<P: AsRef<Path>>(path: P) -> Result<LabeledDataset> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CommentaryError::dataset_not_found(path));
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers = reader.byte_headers()?.clone();
    let source = path.display().to_string();
    let text_index = column_index(&headers, TEXT_COLUMN)
        .ok_or_else(|| CommentaryError::missing_column(TEXT_COLUMN, &source))?;
    let label_index = column_index(&headers, LABEL_COLUMN)
        .ok_or_else(|| CommentaryError::missing_column(LABEL_COLUMN, &source))?;

    let mut dataset = LabeledDataset::default();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        dataset.rows_loaded += 1;
        let row = dataset.rows_loaded;

        let text = cell(&record, text_index);
        let label = cell(&record, label_index);
        let (Some(text), Some(label)) = (text, label) else {
            debug!("dropping row {row}: missing comment text or category");
            dataset.rows_dropped += 1;
            continue;
        };

        let category = label
            .parse::<Category>()
            .map_err(|_| CommentaryError::InvalidLabel {
                row,
                label: label.to_string(),
            })?;
        dataset.texts.push(text.to_string());
        dataset.labels.push(category);
    }

    if dataset.rows_dropped > 0 {
        warn!(
            "dropped {} of {} rows with missing text or category",
            dataset.rows_dropped, dataset.rows_loaded
        );
    }
    Ok(dataset)
}

/// Row counts per category label in a training dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDistribution {
    pub counts: BTreeMap<Category, usize>,
    /// Rows with a recognized label.
    pub total: usize,
    /// Non-empty labels outside the category set, skipped from the counts.
    pub unrecognized: usize,
}

impl CategoryDistribution {
    /// Count of `category`, zero when absent.
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Share of `category` in `[0, 1]`.
    pub fn fraction(&self, category: Category) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(category) as f64 / self.total as f64
        }
    }

    /// Categories ordered by descending count, ties in canonical order.
    pub fn ranked(&self) -> Vec<(Category, usize)> {
        let mut ranked: Vec<(Category, usize)> =
            self.counts.iter().map(|(c, n)| (*c, *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }
}

/// Count rows per category in the dataset at `path`.
///
/// Only the `category` column is read. Blank labels are skipped, and
/// unknown labels are tallied in `unrecognized` instead of failing.
pub fn category_distribution<P: AsRef<Path>>(path: P) -> Result<CategoryDistribution> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CommentaryError::dataset_not_found(path));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.byte_headers()?.clone();
    let label_index = column_index(&headers, LABEL_COLUMN).ok_or_else(|| {
        CommentaryError::missing_column(LABEL_COLUMN, path.display().to_string())
    })?;

    let mut distribution = CategoryDistribution::default();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let Some(label) = cell(&record, label_index) else {
            continue;
        };
        match label.parse::<Category>() {
            Ok(category) => {
                *distribution.counts.entry(category).or_insert(0) += 1;
                distribution.total += 1;
            }
            Err(_) => distribution.unrecognized += 1,
        }
    }

    if distribution.unrecognized > 0 {
        warn!(
            "{} rows carry a label outside the category set",
            distribution.unrecognized
        );
    }
    Ok(distribution)
}

/// Split row indices into train and test sets, preserving class proportions.
///
/// Each class is shuffled with a generator seeded from `seed` and
/// `round(count * test_size)` of its rows go to the test side, but never so
/// many that the class disappears from the train side. Both index lists come
/// back sorted.
pub fn stratified_split(labels: &[Category], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let count = indices.len();
        let n_test = ((count as f64 * test_size).round() as usize).min(count.saturating_sub(1));
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

fn column_index(headers: &ByteRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| String::from_utf8_lossy(h).trim().eq_ignore_ascii_case(name))
}

/// A trimmed, non-empty UTF-8 cell.
fn cell(record: &ByteRecord, index: usize) -> Option<&str> {
    record
        .get(index)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
