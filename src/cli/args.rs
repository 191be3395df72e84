//! Command line argument parsing for the Commentary CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Commentary - categorize comments and suggest replies
#[derive(Parser, Debug, Clone)]
#[command(name = "commentary")]
#[command(about = "Categorize user comments and suggest moderation actions and replies")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CommentaryArgs {
    /// Verbosity level (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "FILE", env = "COMMENTARY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl CommentaryArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n + 1,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from a labelled CSV and write the artifact
    Train(TrainArgs),

    /// Categorize one or more comments
    Predict(PredictArgs),

    /// Categorize every row of a CSV file
    Batch(BatchArgs),

    /// Show the category distribution of a training dataset
    Stats(StatsArgs),

    /// Categorize comments typed on standard input, one per line
    Serve(ServeArgs),
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training CSV with `comment_text` and `category` columns
    #[arg(short, long, value_name = "CSV")]
    pub dataset: Option<PathBuf>,

    /// Where to write the model artifact (`.bin` selects the binary format)
    #[arg(short, long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,

    /// Fraction of each category held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Seed for the evaluation split
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for single predictions
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Comment texts to categorize
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,

    /// Model artifact to load
    #[arg(short, long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,

    /// Seed for reply selection
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for batch processing
#[derive(Parser, Debug, Clone)]
pub struct BatchArgs {
    /// Input CSV with a `comment_text` column
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV (standard output if omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Model artifact to load
    #[arg(short, long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,

    /// Seed for reply selection
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for dataset statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Training CSV with a `category` column
    #[arg(short, long, value_name = "CSV")]
    pub dataset: Option<PathBuf>,
}

/// Arguments for the interactive loop
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Model artifact to load
    #[arg(short, long, value_name = "PATH")]
    pub artifact: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Seed for reply selection
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train() {
        let args = CommentaryArgs::parse_from([
            "commentary",
            "-v",
            "train",
            "--dataset",
            "data.csv",
            "--seed",
            "9",
        ]);
        assert_eq!(args.verbosity(), 2);
        match args.command {
            Command::Train(train) => {
                assert_eq!(train.dataset, Some(PathBuf::from("data.csv")));
                assert_eq!(train.seed, Some(9));
                assert!(train.artifact.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_predict_and_format() {
        let args = CommentaryArgs::parse_from([
            "commentary",
            "--format",
            "json",
            "-q",
            "predict",
            "Great video!",
            "You are trash",
        ]);
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.verbosity(), 0);
        match args.command {
            Command::Predict(predict) => assert_eq!(predict.texts.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_predict_requires_text() {
        assert!(CommentaryArgs::try_parse_from(["commentary", "predict"]).is_err());
    }

    #[test]
    fn test_parse_batch() {
        let args =
            CommentaryArgs::parse_from(["commentary", "batch", "in.csv", "-o", "out.csv"]);
        match args.command {
            Command::Batch(batch) => {
                assert_eq!(batch.input, PathBuf::from("in.csv"));
                assert_eq!(batch.output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
