//! Reply policy: what to do with a comment once it is categorized.
//!
//! The action for a category is fixed; the reply is drawn from a per-category
//! template list. Blocking and reporting are labels only. Nothing here acts
//! on a user.

pub mod action;
pub mod engine;
pub mod templates;

pub use action::*;
pub use engine::*;
pub use templates::*;
