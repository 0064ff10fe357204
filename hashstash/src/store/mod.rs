//! The key-value store collaborator and its in-memory provider.
mod batch;
mod command;
pub(crate) mod glob;
mod info;
mod key_value_store;
pub mod memory;

pub use batch::*;
pub use command::*;
pub use info::*;
pub use key_value_store::*;
