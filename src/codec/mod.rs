//! Tree ↔ flat codecs
//!
//! The flat condition list is the exact shape persisted and handed to the
//! report executor.

mod explicit;
mod flat;
mod record;


pub use explicit::*;
pub use flat::*;
pub use record::*;
