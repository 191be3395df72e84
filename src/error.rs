//! Error types for the Commentary library.
//!
//! All fallible operations return [`CommentaryError`]. Structural problems
//! (a missing dataset, a missing column, a missing or corrupt artifact) each
//! have their own variant so callers can react to them individually instead
//! of matching on message text.
//!
//! # Examples
//!
//! ```
//! use commentary::error::{CommentaryError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CommentaryError::invalid_config("test_size must be in (0, 1)"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::ml::MLError;

/// The main error type for Commentary operations.
#[derive(Error, Debug)]
pub enum CommentaryError {
    /// The training dataset path does not resolve to a file.
    #[error("Dataset not found: {path}")]
    DatasetNotFound { path: String },

    /// A tabular input lacks a column the operation requires.
    #[error("Missing required column '{column}' in {source_name}")]
    MissingRequiredColumn { column: String, source_name: String },

    /// No model artifact is available for inference.
    #[error("Model not trained: no artifact at {path}. Run `commentary train` first.")]
    ModelNotTrained { path: String },

    /// The artifact file exists but could not be read, decoded, or written.
    #[error("Artifact I/O error ({path}): {message}")]
    ArtifactIo { path: String, message: String },

    /// A training row carries a label outside the closed category set.
    #[error("Invalid category label '{label}' on row {row}")]
    InvalidLabel { row: usize, label: String },

    /// Configuration values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Model fitting and scoring errors.
    #[error(transparent)]
    Ml(#[from] MLError),

    /// I/O errors (file operations, terminal, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// Result type alias for operations that may fail with CommentaryError.
pub type Result<T> = std::result::Result<T, CommentaryError>;

impl CommentaryError {
    /// Create a dataset-not-found error for the given path.
    pub fn dataset_not_found<P: AsRef<Path>>(path: P) -> Self {
        CommentaryError::DatasetNotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a missing-column error.
    pub fn missing_column<C: Into<String>, S: Into<String>>(column: C, source_name: S) -> Self {
        CommentaryError::MissingRequiredColumn {
            column: column.into(),
            source_name: source_name.into(),
        }
    }

    /// Create a not-trained error for the given artifact path.
    pub fn not_trained<P: AsRef<Path>>(path: P) -> Self {
        CommentaryError::ModelNotTrained {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create an artifact I/O error.
    pub fn artifact<P: AsRef<Path>, S: Into<String>>(path: P, message: S) -> Self {
        CommentaryError::ArtifactIo {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        CommentaryError::Analysis(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        CommentaryError::InvalidConfig(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        CommentaryError::InvalidOperation(msg.into())
    }
}
