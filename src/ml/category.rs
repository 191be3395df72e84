//! The closed set of comment categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommentaryError;

/// A moderation/engagement category a comment is classified into.
///
/// The declaration order is the canonical label order: a trained model
/// stores its labels in this order and ties between equal scores resolve
/// to the earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Praise")]
    Praise,
    #[serde(rename = "Support")]
    Support,
    #[serde(rename = "Constructive Criticism")]
    ConstructiveCriticism,
    #[serde(rename = "Hate/Abuse")]
    HateAbuse,
    #[serde(rename = "Threat")]
    Threat,
    #[serde(rename = "Emotional")]
    Emotional,
    #[serde(rename = "Irrelevant/Spam")]
    IrrelevantSpam,
    #[serde(rename = "Question/Suggestion")]
    QuestionSuggestion,
}

impl Category {
    /// Every category in canonical order.
    pub const ALL: [Category; 8] = [
        Category::Praise,
        Category::Support,
        Category::ConstructiveCriticism,
        Category::HateAbuse,
        Category::Threat,
        Category::Emotional,
        Category::IrrelevantSpam,
        Category::QuestionSuggestion,
    ];

    /// The label used in datasets, artifacts and output tables.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Praise => "Praise",
            Category::Support => "Support",
            Category::ConstructiveCriticism => "Constructive Criticism",
            Category::HateAbuse => "Hate/Abuse",
            Category::Threat => "Threat",
            Category::Emotional => "Emotional",
            Category::IrrelevantSpam => "Irrelevant/Spam",
            Category::QuestionSuggestion => "Question/Suggestion",
        }
    }

    /// Position of this category in [`Category::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = CommentaryError;

    /// Parse a label. Surrounding whitespace is ignored; case is not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label() == trimmed)
            .ok_or_else(|| {
                CommentaryError::invalid_operation(format!("unknown category label '{trimmed}'"))
            })
    }
}
