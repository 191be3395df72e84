//! Category to action and reply.

use log::warn;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{CommentaryError, Result};
use crate::ml::Category;
use crate::policy::{Action, ReplyTemplates};

/// Reply used when a category has no templates.
pub const DEFAULT_REPLY: &str = "Thanks!";

/// The outcome of applying the policy to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub category: Category,
    pub action: Action,
    pub reply: String,
}

/// Maps categories to actions and picks a reply template uniformly at random.
#[derive(Debug)]
pub struct ReplyPolicy {
    templates: ReplyTemplates,
    rng: Mutex<StdRng>,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            templates: ReplyTemplates::default(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }
}

impl ReplyPolicy {
    /// Build a policy, rejecting a table that leaves any category without
    /// a reply.
    pub fn new(templates: ReplyTemplates) -> Result<Self> {
        let missing = templates.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(Category::label).collect();
            return Err(CommentaryError::invalid_config(format!(
                "reply templates missing for: {}",
                names.join(", ")
            )));
        }
        Ok(Self::lenient(templates))
    }

    /// Build a policy that answers [`DEFAULT_REPLY`] for categories without
    /// templates.
    pub fn lenient(templates: ReplyTemplates) -> Self {
        let missing = templates.missing();
        if !missing.is_empty() {
            warn!(
                "{} categories have no reply templates and will use \"{}\"",
                missing.len(),
                DEFAULT_REPLY
            );
        }
        Self {
            templates,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Use a fixed seed so reply choices are reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            templates: self.templates,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn templates(&self) -> &ReplyTemplates {
        &self.templates
    }

    /// Action and reply for `category`, drawing from the policy's own
    /// generator.
    pub fn decide(&self, category: Category) -> Decision {
        let mut rng = self.rng.lock();
        self.decide_with(category, &mut *rng)
    }

    /// Action and reply for `category`, drawing from `rng`.
    pub fn decide_with<R: Rng + ?Sized>(&self, category: Category, rng: &mut R) -> Decision {
        let reply = match self.templates.get(category) {
            Some(replies) => replies
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_REPLY.to_string()),
            None => {
                warn!("no reply template for {category}; using default reply");
                DEFAULT_REPLY.to_string()
            }
        };

        Decision {
            category,
            action: Action::for_category(category),
            reply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_covers_every_category() {
        let policy = ReplyPolicy::default().with_seed(7);
        for category in Category::ALL {
            let decision = policy.decide(category);
            assert_eq!(decision.category, category);
            assert_eq!(decision.action, Action::for_category(category));
        }
        assert_eq!(
            policy.decide(Category::Threat).action,
            Action::BlockReport
        );
        assert_eq!(
            policy.decide(Category::ConstructiveCriticism).action,
            Action::TakeFeedback
        );
        assert_eq!(policy.decide(Category::Emotional).action, Action::Engage);
    }

    #[test]
    fn test_replies_come_from_templates() {
        let policy = ReplyPolicy::default().with_seed(1);
        for category in Category::ALL {
            let replies = policy.templates().get(category).unwrap().to_vec();
            for _ in 0..50 {
                assert!(replies.contains(&policy.decide(category).reply));
            }
        }
    }

    #[test]
    fn test_seeded_policies_agree() {
        let a = ReplyPolicy::default().with_seed(99);
        let b = ReplyPolicy::default().with_seed(99);
        for category in Category::ALL.iter().cycle().take(24) {
            assert_eq!(a.decide(*category), b.decide(*category));
        }

        let mut rng_a = StdRng::seed_from_u64(5);
        let mut rng_b = StdRng::seed_from_u64(5);
        assert_eq!(
            a.decide_with(Category::Praise, &mut rng_a),
            b.decide_with(Category::Praise, &mut rng_b)
        );
    }

    #[test]
    fn test_all_templates_eventually_chosen() {
        let policy = ReplyPolicy::default().with_seed(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(policy.decide(Category::Support).reply);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_incomplete_table() {
        let templates = ReplyTemplates::empty().with(Category::Praise, ["Ta!"]);
        let err = ReplyPolicy::new(templates.clone()).unwrap_err();
        assert!(err.to_string().contains("Hate/Abuse"));
        assert!(!err.to_string().contains("Praise"));

        let policy = ReplyPolicy::lenient(templates).with_seed(0);
        assert_eq!(policy.decide(Category::Praise).reply, "Ta!");
        let fallback = policy.decide(Category::HateAbuse);
        assert_eq!(fallback.reply, DEFAULT_REPLY);
        assert_eq!(fallback.action, Action::BlockReport);
    }
}
