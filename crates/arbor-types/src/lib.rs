//! Foundation types for Arbor.
//!
//! This crate provides the identifiers and tags shared by every other Arbor
//! crate: the content hash that names every chunk and value, the
//! domain-separated hasher that computes it, and the kind tag that opens every
//! canonical encoding.
//!
//! # Key Types
//!
//! - [`Hash`]: Content-addressed identifier (BLAKE3 digest of canonical bytes)
//! - [`ValueHasher`]: Domain-separated hasher producing [`Hash`]es
//! - [`Kind`]: Tag byte identifying a value's or type's top-level variant

pub mod error;
pub mod hash;
pub mod kind;

pub use error::TypesError;
pub use hash::{Hash, ValueHasher, HASH_LEN};
pub use kind::Kind;
