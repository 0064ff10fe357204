//! Shared types, constants and helpers.

mod constants;
pub mod util;
mod value;

pub use constants::*;
pub use util::*;
pub use value::*;
