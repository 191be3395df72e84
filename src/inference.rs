//! Serving predictions from a trained artifact.
//!
//! [`ModelLoader`] reads the artifact at most once and hands out shared
//! references to the resulting classifier. [`InferenceService`] pairs that
//! classifier with a [`ReplyPolicy`] and answers single texts or whole
//! batches. [`BatchProcessor`] applies the service to a CSV table.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::dataset::TEXT_COLUMN;
use crate::error::{CommentaryError, Result};
use crate::ml::{Category, CommentClassifier, ModelArtifact};
use crate::policy::{Action, Decision, ReplyPolicy};

/// Header of the appended category column.
pub const CATEGORY_COLUMN: &str = "Category";

/// Header of the appended reply column.
pub const REPLY_COLUMN: &str = "Reply";

/// Loads a model artifact on first use and caches it.
///
/// Concurrent first callers are serialized by a lock; exactly one of them
/// reads the file. Later callers share the cached classifier. A failed load
/// is not cached, so a retry after training succeeds.
#[derive(Debug)]
pub struct ModelLoader {
    path: PathBuf,
    model: Mutex<Option<Arc<CommentClassifier>>>,
}

impl ModelLoader {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            model: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded classifier, reading the artifact if this is the first call.
    pub fn get(&self) -> Result<Arc<CommentClassifier>> {
        let mut slot = self.model.lock();
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        let artifact = ModelArtifact::load(&self.path)?;
        let model = Arc::new(
            CommentClassifier::from_artifact(artifact)
                .map_err(|e| CommentaryError::artifact(&self.path, e.to_string()))?,
        );
        info!(
            "model ready: {} labels, {} terms",
            model.labels().len(),
            model.vectorizer().vocabulary_size()
        );
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.lock().is_some()
    }
}

/// Category, action and reply for one comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Triage {
    pub category: Category,
    pub action: Action,
    pub reply: String,
    /// Probability of `category`; zero for fallback rows.
    pub confidence: f64,
    /// The text was empty or whitespace only.
    pub empty_input: bool,
    /// The row could not be classified and got the fallback category.
    pub fallback: bool,
}

impl Triage {
    fn from_decision(decision: Decision, confidence: f64, empty_input: bool, fallback: bool) -> Self {
        Self {
            category: decision.category,
            action: decision.action,
            reply: decision.reply,
            confidence,
            empty_input,
            fallback,
        }
    }
}

/// Counts for a processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    /// Rows that got the fallback category.
    pub fallbacks: usize,
    /// Rows whose text was whitespace only.
    pub empty_inputs: usize,
}

/// A trained classifier together with the reply policy.
#[derive(Debug)]
pub struct InferenceService {
    classifier: Arc<CommentClassifier>,
    policy: ReplyPolicy,
    fallback: Category,
}

impl InferenceService {
    pub fn new(classifier: Arc<CommentClassifier>, policy: ReplyPolicy) -> Self {
        Self {
            classifier,
            policy,
            fallback: Category::IrrelevantSpam,
        }
    }

    /// Build from a loader, reading the artifact if it has not been read yet.
    pub fn from_loader(loader: &ModelLoader, policy: ReplyPolicy) -> Result<Self> {
        Ok(Self::new(loader.get()?, policy))
    }

    /// Category given to batch rows that cannot be classified.
    pub fn with_fallback(mut self, fallback: Category) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn classifier(&self) -> &CommentClassifier {
        &self.classifier
    }

    pub fn policy(&self) -> &ReplyPolicy {
        &self.policy
    }

    pub fn fallback(&self) -> Category {
        self.fallback
    }

    /// Classify one comment.
    pub fn predict_one(&self, text: &str) -> Result<Category> {
        self.classifier.predict_category(text)
    }

    /// Classify one comment and apply the reply policy.
    pub fn triage(&self, text: &str) -> Result<Triage> {
        let prediction = self.classifier.predict(text)?;
        let decision = self.policy.decide(prediction.category);
        Ok(Triage::from_decision(
            decision,
            prediction.confidence,
            prediction.empty_input,
            false,
        ))
    }

    /// Action and reply for an already known category.
    pub fn decide(&self, category: Category) -> Decision {
        self.policy.decide(category)
    }

    /// Classify many comments. `None` marks a row whose text could not be
    /// read; it gets the fallback category. One bad row never fails the
    /// batch.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[Option<S>]) -> (Vec<Triage>, BatchSummary) {
        let mut summary = BatchSummary::default();
        let triages = texts
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let triage = self.triage_row(row + 1, text.as_ref().map(|t| t.as_ref()));
                summary.rows += 1;
                summary.fallbacks += usize::from(triage.fallback);
                summary.empty_inputs += usize::from(triage.empty_input);
                triage
            })
            .collect();

        if summary.fallbacks > 0 {
            warn!(
                "{} of {} rows could not be classified and were marked {}",
                summary.fallbacks, summary.rows, self.fallback
            );
        }
        (triages, summary)
    }

    fn triage_row(&self, row: usize, text: Option<&str>) -> Triage {
        match text.map(|t| self.triage(t)) {
            Some(Ok(triage)) => triage,
            Some(Err(e)) => {
                warn!("row {row}: {e}; using fallback category");
                self.fallback_triage()
            }
            None => {
                warn!("row {row}: no readable comment text; using fallback category");
                self.fallback_triage()
            }
        }
    }

    fn fallback_triage(&self) -> Triage {
        Triage::from_decision(self.policy.decide(self.fallback), 0.0, false, true)
    }
}

/// One row of a processed table.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    /// Original cells, padded or cut to the header width.
    pub fields: ByteRecord,
    pub triage: Triage,
}

/// A processed table: original columns plus a triage per row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTable {
    pub headers: ByteRecord,
    pub rows: Vec<BatchRow>,
    pub summary: BatchSummary,
}

impl BatchTable {
    /// Write the table as CSV with `Category` and `Reply` appended.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().from_writer(writer);

        let mut headers = self.headers.clone();
        headers.push_field(CATEGORY_COLUMN.as_bytes());
        headers.push_field(REPLY_COLUMN.as_bytes());
        writer.write_byte_record(&headers)?;

        for row in &self.rows {
            let mut record = row.fields.clone();
            record.push_field(row.triage.category.label().as_bytes());
            record.push_field(row.triage.reply.as_bytes());
            writer.write_byte_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Applies an [`InferenceService`] to CSV tables with a `comment_text`
/// column.
#[derive(Debug)]
pub struct BatchProcessor<'a> {
    service: &'a InferenceService,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(service: &'a InferenceService) -> Self {
        Self { service }
    }

    /// Read and classify a whole table. Fails if any part of the table is
    /// unreadable or it has no `comment_text` column.
    pub fn process<R: Read>(&self, reader: R, source_name: &str) -> Result<BatchTable> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.byte_headers()?.clone();
        let text_index = headers
            .iter()
            .position(|h| String::from_utf8_lossy(h).trim().eq_ignore_ascii_case(TEXT_COLUMN))
            .ok_or_else(|| CommentaryError::missing_column(TEXT_COLUMN, source_name))?;

        let mut records = Vec::new();
        let mut texts = Vec::new();
        let mut record = ByteRecord::new();
        // A read or parse error rejects the whole table.
        while reader.read_byte_record(&mut record)? {
            texts.push(
                record
                    .get(text_index)
                    .filter(|bytes| !bytes.is_empty())
                    .and_then(|bytes| std::str::from_utf8(bytes).ok())
                    .map(str::to_owned),
            );
            records.push(fit_width(&record, headers.len()));
        }

        let (triages, summary) = self.service.predict_batch(&texts);
        let rows = records
            .into_iter()
            .zip(triages)
            .map(|(fields, triage)| BatchRow { fields, triage })
            .collect();

        info!(
            "processed {} rows from {} ({} fallbacks)",
            summary.rows, source_name, summary.fallbacks
        );
        Ok(BatchTable {
            headers,
            rows,
            summary,
        })
    }

    /// Classify the CSV at `input` and write the result to `output`.
    pub fn process_file<I: AsRef<Path>, O: AsRef<Path>>(
        &self,
        input: I,
        output: O,
    ) -> Result<BatchSummary> {
        let input = input.as_ref();
        let file = File::open(input)?;
        let table = self.process(file, &input.display().to_string())?;
        table.write_csv(File::create(output.as_ref())?)?;
        Ok(table.summary)
    }
}

fn fit_width(record: &ByteRecord, width: usize) -> ByteRecord {
    let mut fields: ByteRecord = record.iter().take(width).collect();
    while fields.len() < width {
        fields.push_field(b"");
    }
    fields
}
