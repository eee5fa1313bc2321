use std::collections::HashMap;
use std::sync::RwLock;

use arbor_types::Hash;
use bytes::Bytes;
use tracing::trace;

use crate::chunk::Chunk;
use crate::error::StoreResult;
use crate::traits::{ChunkStore, ValueResolver};

/// In-memory, HashMap-based chunk store.
///
/// Intended for tests and embedding. Chunks are held behind a `RwLock`;
/// reads hand out cheap `Bytes` clones of the stored buffers.
pub struct MemoryChunkStore {
    chunks: RwLock<HashMap<Hash, Bytes>>,
}

impl MemoryChunkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of chunks currently stored.
    pub fn len(&self) -> usize {
        self.chunks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored chunks.
    pub fn total_bytes(&self) -> u64 {
        self.chunks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Return a sorted list of all chunk hashes in the store.
    pub fn all_hashes(&self) -> Vec<Hash> {
        let map = self.chunks.read().expect("lock poisoned");
        let mut hashes: Vec<Hash> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueResolver for MemoryChunkStore {
    fn read_chunk(&self, hash: &Hash) -> StoreResult<Option<Bytes>> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.get(hash).cloned())
    }
}

impl ChunkStore for MemoryChunkStore {
    fn put(&self, chunk: Chunk) -> StoreResult<Hash> {
        let hash = chunk.hash();
        let mut map = self.chunks.write().expect("lock poisoned");
        map.entry(hash).or_insert_with(|| {
            trace!(hash = %hash.short_hex(), len = chunk.len(), "chunk stored");
            chunk.into_data()
        });
        Ok(hash)
    }

    fn has(&self, hash: &Hash) -> StoreResult<bool> {
        let map = self.chunks.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }
}

impl std::fmt::Debug for MemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChunkStore")
            .field("chunk_count", &self.len())
            .finish()
    }
}
