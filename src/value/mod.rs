//! Condition values
//!
//! Value shapes per operator and field type, value sources, and the
//! registry of dynamic values.

mod dynamic;
mod shape;
mod source;


pub use dynamic::*;
pub use shape::*;
pub use source::*;
