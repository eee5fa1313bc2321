//! Structural diff for Arbor structs.
//!
//! Compares two versions of a struct field by field, merging their sorted
//! field streams so every field name is visited once, in ascending order.
//! Identical structs produce no changes and are detected from their bytes
//! alone.
//!
//! # Delivery
//!
//! - [`StructDiff`] -- pull iterator; stop by dropping it
//! - [`diff_structs`] -- push into a sink that returns `ControlFlow::Break`
//!   to stop
//! - [`spawn_diff`] -- a blocking producer feeding a bounded channel; stops
//!   once the receiver is dropped or closed

pub mod change;
pub mod config;
pub mod stream;
pub mod struct_diff;

pub use change::{DiffChangeType, ValueChanged};
pub use config::DiffConfig;
pub use stream::{spawn_diff, DiffReceiver};
pub use struct_diff::{diff_struct_changes, diff_structs, StructDiff};
