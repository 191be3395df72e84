//! Inference against trained artifacts: single, batch, and load-once behaviour.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use commentary::error::{CommentaryError, Result};
use commentary::inference::{BatchProcessor, InferenceService, ModelLoader};
use commentary::ml::{Category, CommentClassifier, MLConfig, ModelArtifact};
use commentary::policy::{Action, ReplyPolicy};
use commentary::training::train;
use tempfile::TempDir;

/// A small dataset where "great" only means Praise and "trash" only means
/// Hate/Abuse.
const SMALL_DATASET: &str = "comment_text,category
Great video,Praise
Great work,Praise
Great editing,Praise
Great stuff,Praise
Great job,Praise
You are trash,Hate/Abuse
Trash channel,Hate/Abuse
Absolute trash,Hate/Abuse
Trash content,Hate/Abuse
Pure trash,Hate/Abuse
How did you film this?,Question/Suggestion
Can you film a tutorial?,Question/Suggestion
Which camera did you film with?,Question/Suggestion
Please film another one,Question/Suggestion
Will you film outdoors?,Question/Suggestion
";

fn trained_artifact(dir: &TempDir, name: &str) -> PathBuf {
    let dataset_path = dir.path().join("data.csv");
    fs::write(&dataset_path, SMALL_DATASET).unwrap();
    let artifact_path = dir.path().join(name);
    train(&dataset_path, &artifact_path, &MLConfig::default()).unwrap();
    artifact_path
}

fn service(artifact: &Path) -> InferenceService {
    let loader = ModelLoader::new(artifact);
    InferenceService::from_loader(&loader, ReplyPolicy::default().with_seed(42)).unwrap()
}

#[test]
fn test_batch_scenario() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let service = service(&trained_artifact(&dir, "model.json"));

    let input = "comment_text,author\nGreat video!,ann\nYou are trash,bob\n";
    let table = BatchProcessor::new(&service).process(input.as_bytes(), "upload.csv")?;

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.summary.rows, 2);
    assert_eq!(table.summary.fallbacks, 0);
    assert_eq!(table.rows[0].triage.category, Category::Praise);
    assert_eq!(table.rows[1].triage.category, Category::HateAbuse);
    assert_eq!(table.rows[1].triage.action, Action::BlockReport);
    for row in &table.rows {
        assert!(!row.triage.reply.is_empty());
    }

    let mut out = Vec::new();
    table.write_csv(&mut out)?;
    let mut reader = csv::Reader::from_reader(out.as_slice());
    let headers = reader.headers()?.clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["comment_text", "author", "Category", "Reply"]
    );
    let records: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][2], "Praise");
    assert_eq!(&records[1][2], "Hate/Abuse");
    assert!(records.iter().all(|r| !r[3].is_empty()));
    Ok(())
}

#[test]
fn test_batch_file_round_trip() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let service = service(&trained_artifact(&dir, "model.json"));

    let input = dir.path().join("upload.csv");
    let output = dir.path().join("results.csv");
    fs::write(&input, "comment_text\nGreat job\nCan you film more?\n")?;

    let summary = BatchProcessor::new(&service).process_file(&input, &output)?;
    assert_eq!(summary.rows, 2);
    let written = fs::read_to_string(&output)?;
    assert_eq!(written.lines().next(), Some("comment_text,Category,Reply"));
    assert_eq!(written.lines().count(), 3);
    Ok(())
}

/// Serves `data` up to `fail_after` bytes, then fails every read.
struct TruncatedReader {
    data: &'static [u8],
    pos: usize,
    fail_after: usize,
}

impl Read for TruncatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.fail_after {
            return Err(io::Error::other("connection reset"));
        }
        let end = self.fail_after.min(self.data.len()).min(self.pos + buf.len());
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

#[test]
fn test_batch_read_failure_rejects_whole_table() {
    let dir = TempDir::new().unwrap();
    let service = service(&trained_artifact(&dir, "model.json"));

    let reader = TruncatedReader {
        data: b"comment_text\nGreat video!\nYou are trash\nGreat job\nTotal trash\n",
        pos: 0,
        fail_after: 26,
    };
    let err = BatchProcessor::new(&service)
        .process(reader, "upload.csv")
        .unwrap_err();
    assert!(matches!(err, CommentaryError::Csv(_)));
}

#[test]
fn test_empty_text_returns_category_with_warning() {
    let dir = TempDir::new().unwrap();
    let service = service(&trained_artifact(&dir, "model.json"));

    let triage = service.triage("").unwrap();
    assert!(triage.empty_input);
    assert!(service.classifier().labels().contains(&triage.category));

    assert!(service.predict_one("   ").is_ok());
}

#[test]
fn test_predict_one_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let artifact = trained_artifact(&dir, "model.json");
    let a = service(&artifact);
    let b = service(&artifact);

    for text in ["Great video!", "trash", "film a tutorial", "unseen words only", ""] {
        let category = a.predict_one(text).unwrap();
        for _ in 0..3 {
            assert_eq!(a.predict_one(text).unwrap(), category);
        }
        assert_eq!(b.predict_one(text).unwrap(), category);
    }
}

#[test]
fn test_artifact_round_trip_preserves_model() -> Result<()> {
    let dir = TempDir::new().unwrap();
    for name in ["model.json", "model.bin"] {
        let path = trained_artifact(&dir, name);
        let artifact = ModelArtifact::load(&path)?;
        let classifier = CommentClassifier::from_artifact(artifact.clone())?;

        let resaved = dir.path().join(format!("resaved-{name}"));
        classifier.to_artifact().save(&resaved)?;
        let reloaded = ModelArtifact::load(&resaved)?;

        assert_eq!(reloaded.vocabulary, artifact.vocabulary);
        assert_eq!(reloaded.labels, artifact.labels);
        for (x, y) in reloaded.idf.iter().zip(&artifact.idf) {
            assert!((x - y).abs() < 1e-9);
        }
        for (row_x, row_y) in reloaded.weights.iter().zip(&artifact.weights) {
            for (x, y) in row_x.iter().zip(row_y) {
                assert!((x - y).abs() < 1e-9);
            }
        }
        for (x, y) in reloaded.biases.iter().zip(&artifact.biases) {
            assert!((x - y).abs() < 1e-9);
        }
    }
    Ok(())
}

#[test]
fn test_not_trained_refuses_prediction() {
    let dir = TempDir::new().unwrap();
    let loader = ModelLoader::new(dir.path().join("comment_model.json"));

    let err = InferenceService::from_loader(&loader, ReplyPolicy::default()).unwrap_err();
    assert!(matches!(err, CommentaryError::ModelNotTrained { .. }));
    assert!(err.to_string().contains("train"));
}

#[test]
fn test_corrupt_artifact_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("comment_model.bin");
    fs::write(&path, [0u8, 1, 2, 3]).unwrap();

    let err = ModelLoader::new(&path).get().unwrap_err();
    assert!(matches!(err, CommentaryError::ArtifactIo { .. }));
}

#[test]
fn test_concurrent_first_load_shares_one_model() {
    let dir = TempDir::new().unwrap();
    let loader = Arc::new(ModelLoader::new(trained_artifact(&dir, "model.json")));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let loader = Arc::clone(&loader);
            thread::spawn(move || loader.get().unwrap())
        })
        .collect();
    let models: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for model in &models[1..] {
        assert!(Arc::ptr_eq(&models[0], model));
    }
}
