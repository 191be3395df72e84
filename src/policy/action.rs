//! Moderation actions and their severity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ml::Category;

/// How a categorized comment should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "Block/Report")]
    BlockReport,
    #[serde(rename = "Take Feedback")]
    TakeFeedback,
    #[serde(rename = "Engage")]
    Engage,
}

/// Display colour for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Red,
    Yellow,
    Green,
}

impl Action {
    /// The action for a category. Total over every category.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::HateAbuse | Category::Threat => Action::BlockReport,
            Category::ConstructiveCriticism => Action::TakeFeedback,
            Category::Praise
            | Category::Support
            | Category::Emotional
            | Category::IrrelevantSpam
            | Category::QuestionSuggestion => Action::Engage,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::BlockReport => "Block/Report",
            Action::TakeFeedback => "Take Feedback",
            Action::Engage => "Engage",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Action::BlockReport => Severity::Red,
            Action::TakeFeedback => Severity::Yellow,
            Action::Engage => Severity::Green,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Severity {
    /// ANSI foreground colour escape.
    pub fn ansi(&self) -> &'static str {
        match self {
            Severity::Red => "\x1b[31m",
            Severity::Yellow => "\x1b[33m",
            Severity::Green => "\x1b[32m",
        }
    }
}
