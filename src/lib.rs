//! # Commentary
//!
//! Categorize short user comments and suggest how to respond.
//!
//! ## Features
//!
//! - Text analysis pipeline (letter-run tokenizer, stop words, word n-grams)
//! - TF-IDF features and multinomial logistic regression
//! - Reproducible training with a stratified held-out evaluation
//! - Atomic, versioned model artifacts (JSON or bincode)
//! - Load-once inference with single and CSV batch prediction
//! - Category to action and reply policy with seedable randomness
//!
//! ## Example
//!
//! ```no_run
//! use commentary::inference::{InferenceService, ModelLoader};
//! use commentary::policy::ReplyPolicy;
//!
//! let loader = ModelLoader::new("comment_model.json");
//! let service = InferenceService::from_loader(&loader, ReplyPolicy::default())?;
//! let triage = service.triage("Great video!")?;
//! println!("{} -> {}: {}", triage.category, triage.action, triage.reply);
//! # Ok::<(), commentary::error::CommentaryError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod ml;
pub mod policy;
pub mod training;

pub mod prelude {
    pub use crate::config::CommentaryConfig;
    pub use crate::error::{CommentaryError, Result};
    pub use crate::inference::{BatchProcessor, InferenceService, ModelLoader, Triage};
    pub use crate::ml::{Category, CommentClassifier, MLConfig, ModelArtifact};
    pub use crate::policy::{Action, ReplyPolicy, ReplyTemplates};
    pub use crate::training::{Trainer, TrainingReport};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
