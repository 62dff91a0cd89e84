//! Filter tree data model
//!
//! Conditions (leaves) and groups (AND/OR containers) under one implicit
//! root. Each condition keeps a denormalized copy of its parent's combinator
//! and ordinal; `FilterTree::recompute_derived` is the only place that
//! writes them.

mod filter;
mod node;
mod validate;

pub use filter::*;
pub use node::*;
pub use validate::*;
