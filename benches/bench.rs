//! Criterion benchmarks for Commentary.
//!
//! Covers the hot paths of serving and training:
//! - Text analysis of single comments
//! - TF-IDF vectorization
//! - Single and batch prediction
//! - Fitting the classifier on the bundled sample dataset

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use commentary::analysis::analyzer::{Analyzer, CommentAnalyzer};
use commentary::dataset::LabeledDataset;
use commentary::inference::{BatchProcessor, InferenceService};
use commentary::ml::{Category, ClassifierConfig, CommentClassifier, VectorizerConfig};
use commentary::policy::ReplyPolicy;

const DATASET: &str = include_str!("../data/comment_dataset.csv");

/// Parse the bundled sample dataset.
fn sample_dataset() -> LabeledDataset {
    let mut reader = csv::Reader::from_reader(DATASET.as_bytes());
    let mut dataset = LabeledDataset::default();
    for record in reader.records() {
        let record = record.unwrap();
        dataset.texts.push(record[0].to_string());
        dataset.labels.push(record[1].parse::<Category>().unwrap());
        dataset.rows_loaded += 1;
    }
    dataset
}

/// Generate synthetic comments by recombining dataset texts.
fn generate_comments(dataset: &LabeledDataset, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = &dataset.texts[i % dataset.len()];
            let b = &dataset.texts[(i * 7 + 3) % dataset.len()];
            format!("{a} {b}")
        })
        .collect()
}

fn trained_classifier(dataset: &LabeledDataset) -> CommentClassifier {
    CommentClassifier::fit(
        &dataset.texts,
        &dataset.labels,
        &VectorizerConfig::default(),
        &ClassifierConfig::default(),
    )
    .unwrap()
}

/// Benchmark text analysis.
fn bench_text_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_analysis");
    let analyzer = CommentAnalyzer::new().unwrap();
    let comments = generate_comments(&sample_dataset(), 100);

    group.bench_function("analyze_single_comment", |b| {
        b.iter(|| black_box(analyzer.terms(black_box(&comments[0])).unwrap()))
    });

    group.throughput(Throughput::Elements(comments.len() as u64));
    group.bench_function("analyze_batch_comments", |b| {
        b.iter(|| {
            for comment in &comments {
                black_box(analyzer.terms(comment).unwrap());
            }
        })
    });

    group.finish();
}

/// Benchmark prediction.
fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");
    let dataset = sample_dataset();
    let classifier = Arc::new(trained_classifier(&dataset));
    let service = InferenceService::new(Arc::clone(&classifier), ReplyPolicy::default().with_seed(1));
    let comments = generate_comments(&dataset, 500);

    group.bench_function("vectorize_single", |b| {
        b.iter(|| black_box(classifier.vectorizer().transform(black_box(&comments[0])).unwrap()))
    });

    group.bench_function("triage_single", |b| {
        b.iter(|| black_box(service.triage(black_box("Great video but the audio is low")).unwrap()))
    });

    let texts: Vec<Option<String>> = comments.iter().cloned().map(Some).collect();
    group.throughput(Throughput::Elements(texts.len() as u64));
    group.bench_function("predict_batch", |b| {
        b.iter(|| black_box(service.predict_batch(black_box(&texts))))
    });

    let mut table = String::from("comment_text\n");
    for comment in &comments {
        table.push_str(&format!("\"{comment}\"\n"));
    }
    group.bench_function("process_csv_batch", |b| {
        b.iter(|| {
            let processed = BatchProcessor::new(&service)
                .process(black_box(table.as_bytes()), "bench.csv")
                .unwrap();
            let mut out = Vec::with_capacity(table.len() * 2);
            processed.write_csv(&mut out).unwrap();
            black_box(out)
        })
    });

    group.finish();
}

/// Benchmark training.
fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Full fits are slow
    let dataset = sample_dataset();

    group.throughput(Throughput::Elements(dataset.len() as u64));
    group.bench_function("fit_sample_dataset", |b| {
        b.iter(|| black_box(trained_classifier(black_box(&dataset))))
    });

    group.finish();
}

criterion_group!(benches, bench_text_analysis, bench_prediction, bench_training);
criterion_main!(benches);
