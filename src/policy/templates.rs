//! Reply templates per category.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ml::Category;

/// Candidate replies for each category.
///
/// Serialized as a JSON object keyed by category label, which is also the
/// shape accepted in the `replies` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyTemplates {
    replies: BTreeMap<Category, Vec<String>>,
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        let table: [(Category, [&str; 3]); 8] = [
            (
                Category::Praise,
                [
                    "Thank you so much! 😊",
                    "We really appreciate the love! ❤️",
                    "Thanks! Glad you liked it.",
                ],
            ),
            (
                Category::Support,
                [
                    "Thanks for sticking with us! 🙏",
                    "Your support means the world.",
                    "We'll keep doing our best!",
                ],
            ),
            (
                Category::ConstructiveCriticism,
                [
                    "Thanks for the feedback, we'll look into it. 📝",
                    "Good point! We'll try to improve.",
                    "Appreciate the honesty.",
                ],
            ),
            (
                Category::HateAbuse,
                [
                    "(Blocked User) 🚫",
                    "Please stay respectful.",
                    "Comment flagged.",
                ],
            ),
            (
                Category::Threat,
                [
                    "(Reported to Safety Team) ⚠️",
                    "We take safety seriously.",
                    "This behavior is not tolerated.",
                ],
            ),
            (
                Category::Emotional,
                [
                    "Sending virtual hugs! 🤗",
                    "Thank you for sharing your story. ❤️",
                    "We're touched by this.",
                ],
            ),
            (
                Category::IrrelevantSpam,
                ["(Deleted Spam)", "Please no spam.", "Let's stay on topic."],
            ),
            (
                Category::QuestionSuggestion,
                [
                    "Great question! We'll answer soon.",
                    "Thanks for the suggestion! Added to our list.",
                    "Good idea!",
                ],
            ),
        ];

        Self {
            replies: table
                .into_iter()
                .map(|(category, replies)| {
                    (category, replies.iter().map(|r| r.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl ReplyTemplates {
    /// A table with no replies at all.
    pub fn empty() -> Self {
        Self {
            replies: BTreeMap::new(),
        }
    }

    /// Replies for `category`; `None` if none are configured.
    pub fn get(&self, category: Category) -> Option<&[String]> {
        self.replies
            .get(&category)
            .map(Vec::as_slice)
            .filter(|replies| !replies.is_empty())
    }

    /// Replace the replies for `category`. Blank strings are discarded.
    pub fn set<I, S>(&mut self, category: Category, replies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies: Vec<String> = replies
            .into_iter()
            .map(Into::into)
            .filter(|r| !r.trim().is_empty())
            .collect();
        self.replies.insert(category, replies);
    }

    /// Builder form of [`ReplyTemplates::set`].
    pub fn with<I, S>(mut self, category: Category, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(category, replies);
        self
    }

    /// Overlay `overrides`: each category it names replaces ours.
    pub fn merge(&mut self, overrides: &ReplyTemplates) {
        for (category, replies) in &overrides.replies {
            self.set(*category, replies.iter().cloned());
        }
    }

    /// Categories without at least one reply, in canonical order.
    pub fn missing(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}
