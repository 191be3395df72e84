//! Output formatting for CLI commands.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::args::{CommentaryArgs, OutputFormat};
use crate::dataset::CategoryDistribution;
use crate::error::Result;
use crate::inference::{BatchSummary, Triage};
use crate::ml::Category;
use crate::training::TrainingReport;

const RESET: &str = "\x1b[0m";
const BAR_WIDTH: usize = 40;

/// One categorized comment as printed by `predict` and `serve`.
#[derive(Debug, Serialize)]
pub struct PredictionOutput<'a> {
    pub text: &'a str,
    #[serde(flatten)]
    pub triage: &'a Triage,
}

/// Category counts as printed by `stats`.
#[derive(Debug, Serialize)]
pub struct DistributionOutput {
    pub total: usize,
    pub unrecognized: usize,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
    pub fraction: f64,
}

impl From<&CategoryDistribution> for DistributionOutput {
    fn from(distribution: &CategoryDistribution) -> Self {
        Self {
            total: distribution.total,
            unrecognized: distribution.unrecognized,
            categories: distribution
                .ranked()
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category,
                    count,
                    fraction: distribution.fraction(category),
                })
                .collect(),
        }
    }
}

/// Output in JSON format.
pub fn output_json<T: Serialize>(result: &T, args: &CommentaryArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Print a training report.
pub fn output_training_report(report: &TrainingReport, args: &CommentaryArgs) -> Result<()> {
    if args.output_format == OutputFormat::Json {
        return output_json(report, args);
    }

    println!("Training complete");
    println!("═════════════════");
    println!(
        "Rows:              {} loaded, {} dropped",
        report.rows_loaded, report.rows_dropped
    );
    println!(
        "Split:             {} train / {} held out",
        report.train_rows, report.test_rows
    );
    println!("Train accuracy:    {:.2}%", report.train_accuracy * 100.0);
    println!("Held-out accuracy: {:.2}%", report.heldout_accuracy * 100.0);
    println!("Categories:        {}", report.labels.len());
    if args.verbosity() > 1 {
        for label in &report.labels {
            println!("  - {label}");
        }
        println!(
            "Optimizer:         {} iterations, loss {:.6}, converged: {}",
            report.stats.iterations, report.stats.final_loss, report.stats.converged
        );
    }
    println!("Artifact:          {}", report.artifact_path.display());
    Ok(())
}

/// Print one categorized comment.
pub fn output_prediction(
    text: &str,
    triage: &Triage,
    args: &CommentaryArgs,
    color: bool,
) -> Result<()> {
    if args.output_format == OutputFormat::Json {
        return output_json(&PredictionOutput { text, triage }, args);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_prediction_human(&mut out, text, triage, args.verbosity() > 1, color)?;
    Ok(())
}

/// Human-readable verdict, coloured by action severity when `color` is set.
pub fn write_prediction_human<W: Write>(
    out: &mut W,
    text: &str,
    triage: &Triage,
    verbose: bool,
    color: bool,
) -> io::Result<()> {
    let (start, end) = if color {
        (triage.action.severity().ansi(), RESET)
    } else {
        ("", "")
    };

    if verbose {
        writeln!(out, "Comment:  {text}")?;
    }
    writeln!(out, "Category: {}", triage.category)?;
    writeln!(out, "{start}Action:   {}{end}", triage.action)?;
    writeln!(out, "Reply:    {}", triage.reply)?;
    if verbose {
        writeln!(out, "Confidence: {:.3}", triage.confidence)?;
    }
    if triage.empty_input {
        writeln!(out, "Warning:  empty comment; category reflects class priors only")?;
    }
    writeln!(out)
}

/// Print a batch summary.
pub fn output_batch_summary(summary: &BatchSummary, args: &CommentaryArgs) -> Result<()> {
    if args.output_format == OutputFormat::Json {
        return output_json(summary, args);
    }
    if args.verbosity() > 0 {
        println!("Rows processed: {}", summary.rows);
        println!("Fallback rows:  {}", summary.fallbacks);
        println!("Empty comments: {}", summary.empty_inputs);
    }
    Ok(())
}

/// Print a category distribution as a bar chart.
pub fn output_distribution(distribution: &CategoryDistribution, args: &CommentaryArgs) -> Result<()> {
    let output = DistributionOutput::from(distribution);
    if args.output_format == OutputFormat::Json {
        return output_json(&output, args);
    }

    println!("Category distribution ({} comments)", output.total);
    println!("════════════════════════════════════");
    let width = Category::ALL
        .iter()
        .map(|c| c.label().len())
        .max()
        .unwrap_or(0);
    for entry in &output.categories {
        let bar = "█".repeat((entry.fraction * BAR_WIDTH as f64).round() as usize);
        println!(
            "{:<width$}  {:>5}  {:>5.1}%  {bar}",
            entry.category.label(),
            entry.count,
            entry.fraction * 100.0,
        );
    }
    if output.unrecognized > 0 {
        println!("({} rows with unrecognized labels skipped)", output.unrecognized);
    }
    Ok(())
}
