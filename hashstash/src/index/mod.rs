//! Per-collection full-text search indexes.
mod registry;
mod search_index;
mod tokenizer;

pub use registry::*;
pub use search_index::*;
pub use tokenizer::*;
