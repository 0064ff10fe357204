//! Records and their flat storage form.
mod codec;
#[allow(clippy::module_inception)]
mod record;

pub use codec::*;
pub use record::*;
