//! Editor knowledge records.
//!
//! Every editor has exactly one knowledge record at
//! `editorKnowledge/{editorId}`. Reads never observe a missing record: the
//! first read creates a fully-defaulted one.

mod error;
mod service;
mod types;

pub use error::KnowledgeError;
pub use service::{KnowledgeService, REGENERATE_UNAVAILABLE};
pub use types::*;
