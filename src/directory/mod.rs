//! Editor directory: profiles, credits, awards, and bulk import.

mod error;
mod import;
mod repository;
mod types;

pub use error::DirectoryError;
pub use import::{ImportStats, Importer};
pub use repository::{
    awards_collection, credits_collection, editor_path, mirror_id, DirectoryRepository,
};
pub use types::*;
