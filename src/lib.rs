//! Editor Directory - searchable directory of television editors.

pub mod cleanup;
pub mod config;
pub mod directory;
pub mod display;
pub mod knowledge;
pub mod research;
pub mod store;
pub mod sync;
pub mod web;
