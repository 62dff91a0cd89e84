//! Operator catalog module
//!
//! Derives, for a field type, the ordered list of comparison operators the
//! user may pick from.

pub mod cache;
mod catalog;


pub use cache::*;
pub use catalog::*;
