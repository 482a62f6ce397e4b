//! Mock-data cleanup for the editors collection.

mod engine;
mod rules;

pub use engine::{CleanupCandidate, CleanupEngine, CleanupReport};
pub use rules::{CleanupRules, MatchReason, Predicate, Rule, RULES};
