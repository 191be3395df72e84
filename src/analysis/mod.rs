//! Text analysis module for Commentary.
//!
//! Raw comment text is turned into the token stream the TF-IDF vectorizer
//! counts: a tokenizer splits it, then filters lowercase, drop stop words
//! and add word n-grams.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
