//! Regex-based tokenizer implementation.

use std::sync::Arc;

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream};
use crate::error::{CommentaryError, Result};

/// A regex-based tokenizer that extracts every match of a pattern as a token.
///
/// The default pattern keeps runs of two or more letters, so digits,
/// punctuation, emoji and whitespace all act as token boundaries.
#[derive(Clone, Debug)]
pub struct RegexTokenizer {
    /// The regex pattern used to extract tokens
    pattern: Arc<Regex>,
}

impl RegexTokenizer {
    /// Create a new regex tokenizer with the default letter-run pattern.
    pub fn new() -> Result<Self> {
        Self::letters(2)
    }

    /// Create a tokenizer that keeps letter runs of at least `min_len` characters.
    pub fn letters(min_len: usize) -> Result<Self> {
        if min_len == 0 {
            return Err(CommentaryError::analysis(
                "minimum token length must be at least 1",
            ));
        }
        Self::with_pattern(&format!(r"\p{{L}}{{{min_len},}}"))
    }

    /// Create a new regex tokenizer with a custom pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| CommentaryError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(RegexTokenizer {
            pattern: Arc::new(regex),
        })
    }

    /// Get the regex pattern used by this tokenizer.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .pattern
            .find_iter(text)
            .enumerate()
            .map(|(position, mat)| {
                Token::with_offsets(mat.as_str(), position, mat.start(), mat.end())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_tokenizer() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens: Vec<Token> = tokenizer.tokenize("hello world").unwrap().collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "hello");
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[0].start_offset, 0);
        assert_eq!(tokens[0].end_offset, 5);

        assert_eq!(tokens[1].text, "world");
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[1].start_offset, 6);
        assert_eq!(tokens[1].end_offset, 11);
    }

    #[test]
    fn test_non_letters_split_tokens() {
        let tokenizer = RegexTokenizer::new().unwrap();
        let tokens: Vec<String> = tokenizer
            .tokenize("Great video!!! 10/10 would-watch again 😊 a")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["Great", "video", "would", "watch", "again"]);
    }

    #[test]
    fn test_unicode_letters() {
        let tokenizer = RegexTokenizer::letters(1).unwrap();
        let tokens: Vec<String> = tokenizer
            .tokenize("café déjà-vu")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["café", "déjà", "vu"]);
    }

    #[test]
    fn test_zero_min_len_rejected() {
        assert!(RegexTokenizer::letters(0).is_err());
    }

    #[test]
    fn test_tokenizer_name() {
        assert_eq!(RegexTokenizer::new().unwrap().name(), "regex");
    }
}
