use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::shingle::ShingleFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::error::Result;
use crate::ml::VectorizerConfig;

/// The analyzer used for comment text: letter-run tokens, lowercased,
/// English stop words removed, then word n-grams.
pub struct CommentAnalyzer {
    inner: PipelineAnalyzer,
}

impl CommentAnalyzer {
    pub fn new() -> Result<Self> {
        Self::from_config(&VectorizerConfig::default())
    }

    pub fn from_config(config: &VectorizerConfig) -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::letters(config.min_token_len)?);
        let (min_n, max_n) = config.ngram_range;
        let analyzer = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StopFilter::default()))
            .add_filter(Arc::new(ShingleFilter::new(min_n, max_n)?))
            .with_name("comment");

        Ok(Self { inner: analyzer })
    }
}

impl Analyzer for CommentAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "comment"
    }
}

impl Debug for CommentAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentAnalyzer")
            .field("inner", &self.inner)
            .finish()
    }
}
