//! Command implementations for the Commentary CLI.

use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::CommentaryConfig;
use crate::dataset;
use crate::error::{CommentaryError, Result};
use crate::inference::{BatchProcessor, InferenceService, ModelLoader};
use crate::training::Trainer;

/// Execute a CLI command.
pub fn execute_command(args: CommentaryArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Predict(predict_args) => predict(predict_args, config, &args),
        Command::Batch(batch_args) => batch(batch_args, config, &args),
        Command::Stats(stats_args) => stats(stats_args, config, &args),
        Command::Serve(serve_args) => serve(serve_args, config, &args),
    }
}

/// The config file named on the command line, or defaults.
fn load_config(args: &CommentaryArgs) -> Result<CommentaryConfig> {
    match &args.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            CommentaryConfig::from_file(path)
        }
        None => Ok(CommentaryConfig::default()),
    }
}

fn artifact_path(flag: &Option<PathBuf>, config: &CommentaryConfig) -> PathBuf {
    flag.clone().unwrap_or_else(|| config.artifact_path.clone())
}

/// Load the artifact and build the service, with a CLI seed taking
/// precedence over the configured one.
fn open_service(
    artifact: &Option<PathBuf>,
    seed: Option<u64>,
    mut config: CommentaryConfig,
) -> Result<InferenceService> {
    if seed.is_some() {
        config.reply_seed = seed;
    }
    let loader = ModelLoader::new(artifact_path(artifact, &config));
    let policy = config.reply_policy()?;
    Ok(InferenceService::from_loader(&loader, policy)?
        .with_fallback(config.ml.training.fallback_category))
}

/// Train a model end to end.
fn train(args: &TrainArgs, mut config: CommentaryConfig, cli_args: &CommentaryArgs) -> Result<()> {
    if let Some(test_size) = args.test_size {
        config.ml.training.test_size = test_size;
    }
    if let Some(seed) = args.seed {
        config.ml.training.seed = seed;
    }
    config.validate()?;

    let dataset_path = args.dataset.clone().unwrap_or(config.dataset_path.clone());
    let artifact = artifact_path(&args.artifact, &config);
    if cli_args.verbosity() > 1 {
        println!(
            "Training on {} -> {}",
            dataset_path.display(),
            artifact.display()
        );
    }

    let report = Trainer::new(config.ml).train(&dataset_path, &artifact)?;
    output_training_report(&report, cli_args)
}

/// Categorize texts given on the command line.
fn predict(args: &PredictArgs, config: CommentaryConfig, cli_args: &CommentaryArgs) -> Result<()> {
    let service = open_service(&args.artifact, args.seed, config)?;
    let color = io::stdout().is_terminal();
    for text in &args.texts {
        let triage = service.triage(text)?;
        output_prediction(text, &triage, cli_args, color)?;
    }
    Ok(())
}

/// Categorize a CSV file.
fn batch(args: &BatchArgs, config: CommentaryConfig, cli_args: &CommentaryArgs) -> Result<()> {
    let service = open_service(&args.artifact, args.seed, config)?;
    let processor = BatchProcessor::new(&service);

    let input = File::open(&args.input).map_err(|e| {
        CommentaryError::invalid_operation(format!(
            "cannot open batch input {}: {e}",
            args.input.display()
        ))
    })?;
    let table = processor.process(input, &args.input.display().to_string())?;

    match &args.output {
        Some(path) => {
            table.write_csv(File::create(path)?)?;
            if cli_args.verbosity() > 0 && cli_args.output_format == OutputFormat::Human {
                println!("Results written to {}", path.display());
            }
            output_batch_summary(&table.summary, cli_args)
        }
        None => table.write_csv(io::stdout().lock()),
    }
}

/// Show the category distribution of a dataset.
fn stats(args: &StatsArgs, config: CommentaryConfig, cli_args: &CommentaryArgs) -> Result<()> {
    let dataset_path = args.dataset.clone().unwrap_or(config.dataset_path);
    let distribution = dataset::category_distribution(&dataset_path)?;
    output_distribution(&distribution, cli_args)
}

/// Read comments from standard input and print a verdict for each.
///
/// Refuses to start without a trained artifact.
fn serve(args: &ServeArgs, config: CommentaryConfig, cli_args: &CommentaryArgs) -> Result<()> {
    let service = open_service(&args.artifact, args.seed, config)?;
    let interactive = io::stdin().is_terminal();
    let color = !args.no_color && io::stdout().is_terminal();

    if interactive && cli_args.output_format == OutputFormat::Human {
        println!(
            "Model ready ({} categories). Type a comment and press Enter; Ctrl-D to quit.",
            service.classifier().labels().len()
        );
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line?;
        let triage = service.triage(&line)?;
        output_prediction(&line, &triage, cli_args, color)?;
    }
    Ok(())
}
