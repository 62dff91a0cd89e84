//! Editing session over a filter tree
//!
//! Every structural and value edit goes through [`FilterEditor`], which keeps
//! the tree's derived fields in sync, queues store commands, and records a
//! change event per mutation.

mod engine;
mod event;
mod persist;


pub use engine::*;
pub use event::*;
