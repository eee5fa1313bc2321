//! Content-addressed chunk storage for Arbor.
//!
//! Every persisted value lives in an immutable chunk identified by the hash of
//! its canonical encoding. This crate defines the two collaborator traits the
//! value layer depends on, plus an in-memory backend.
//!
//! - [`ValueResolver`] -- given a hash, fetch the chunk bytes (read side)
//! - [`ChunkStore`] -- a resolver that can also persist chunks
//! - [`MemoryChunkStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Chunks are immutable once written (content-addressing guarantees this).
//! 2. Concurrent reads are always safe.
//! 3. The store never interprets chunk contents.
//! 4. All backend errors are propagated, never silently ignored.

pub mod chunk;
pub mod error;
pub mod memory;
pub mod traits;

pub use chunk::Chunk;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryChunkStore;
pub use traits::{ChunkStore, ValueResolver};
