//! # HashStash - Records, Key Namespacing and Full-Text Search over Hashes
//!
//! HashStash stores nested records as flat hashes in a key-value store and
//! keeps a full-text index per collection so records can be found by any
//! word of any field value.
//!
//! ## Key Features
//!
//! - **Flattening**: Nested records become `a.b.0.c` field paths and come back intact
//! - **Type Restoration**: Numeric strings are turned back into numbers on read
//! - **Key Namespacing**: Every key is built from a configurable prefix and separator
//! - **Search**: Per-collection token index with `or` and `and` matching
//! - **Atomic Batches**: Saves and multi-key reads run in one round trip
//! - **Pluggable Stores**: In-memory store included, any [store::KeyValueStoreProvider] can be plugged in
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hashstash::{record, HashStash, SaveOptions, SearchQuery};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stash = HashStash::builder().prefix("shop").open()?;
//!
//! let saved = stash.save_with_options(
//!     record! { username: "alice", age: "30", address: { city: "Moshi" } },
//!     &SaveOptions::default().collection("users"),
//! )?;
//!
//! // "30" comes back as a number
//! let fetched = stash.get(&saved.id().unwrap())?.unwrap();
//! assert_eq!(fetched.get("age")?, hashstash::Value::I64(30));
//!
//! let found = stash.search(SearchQuery::new("Moshi").collection("users"))?;
//! assert_eq!(found.len(), 1);
//!
//! stash.clear(None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`builder`] - Context builder
//! - [`common`] - Values, constants and shared utilities
//! - [`config`] - Key and connection configuration
//! - [`errors`] - Error types and result definitions
//! - [`hash_stash`] - Save, get, search, clear and reset
//! - [`index`] - Tokenizers and search indexes
//! - [`key_namespace`] - Key construction
//! - [`options`] - Save and search options
//! - [`record`] - Records and the flat hash codec
//! - [`store`] - Key-value store abstraction and the in-memory store

pub mod builder;
pub mod common;
pub mod config;
pub mod errors;
pub mod hash_stash;
pub mod index;
pub mod key_namespace;
pub mod options;
pub mod record;
pub mod store;

pub use builder::HashStashBuilder;
pub use common::Value;
pub use config::{ConfigOverrides, ConnectionOptions, Endpoint, HashStashConfig};
pub use errors::{ErrorKind, HashStashError, HashStashResult};
pub use hash_stash::HashStash;
pub use index::SearchMode;
pub use options::{SaveOptions, SearchQuery};
pub use record::Record;
pub use store::ServerInfo;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
