//! Analyzer implementations that combine tokenizers and filters.

mod analyzer;
mod comment;
mod pipeline;

pub use analyzer::Analyzer;
pub use comment::CommentAnalyzer;
pub use pipeline::PipelineAnalyzer;
