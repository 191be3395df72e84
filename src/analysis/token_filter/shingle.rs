//! Shingle (word n-gram) filter.
//!
//! Emits the original tokens followed by every contiguous run of
//! `min_size..=max_size` tokens joined by a single space. Shingles are built
//! over the stream the filter receives, so stop words removed upstream do not
//! break adjacency: "the audio is low" becomes `audio`, `low`, `audio low`.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::{CommentaryError, Result};

/// A filter that produces word n-grams.
#[derive(Clone, Debug)]
pub struct ShingleFilter {
    min_size: usize,
    max_size: usize,
}

impl ShingleFilter {
    /// Create a filter emitting n-grams for every `n` in `min_size..=max_size`.
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        if min_size == 0 || max_size < min_size {
            return Err(CommentaryError::analysis(format!(
                "invalid n-gram range ({min_size}, {max_size})"
            )));
        }
        Ok(ShingleFilter { min_size, max_size })
    }

    /// Unigrams plus bigrams.
    pub fn bigrams() -> Self {
        ShingleFilter {
            min_size: 1,
            max_size: 2,
        }
    }
}

impl Filter for ShingleFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let words: Vec<Token> = tokens.collect();
        let mut output = Vec::with_capacity(words.len() * (self.max_size - self.min_size + 1));
        let mut position = 0;

        for n in self.min_size..=self.max_size {
            if n > words.len() {
                break;
            }
            for window in words.windows(n) {
                let text = window
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                output.push(Token::with_offsets(
                    text,
                    position,
                    window[0].start_offset,
                    window[n - 1].end_offset,
                ));
                position += 1;
            }
        }

        Ok(Box::new(output.into_iter()))
    }

    fn name(&self) -> &'static str {
        "shingle"
    }
}
