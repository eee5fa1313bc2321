use arbor_types::Hash;
use bytes::Bytes;

use crate::chunk::Chunk;
use crate::error::StoreResult;

/// Read side of content-addressed storage.
///
/// Values decoded from a chunk keep a non-owning link to the resolver they
/// came from, so nested refs and meta-sequence children can be paged in on
/// demand.
pub trait ValueResolver: Send + Sync {
    /// Fetch the bytes of the chunk stored under `hash`.
    ///
    /// Returns `Ok(None)` if the chunk does not exist.
    fn read_chunk(&self, hash: &Hash) -> StoreResult<Option<Bytes>>;
}

/// Content-addressed chunk store.
///
/// Implementations must satisfy these invariants:
/// - Chunks are immutable once written; the same bytes always produce the
///   same hash.
/// - Concurrent reads are always safe.
/// - The store never interprets chunk contents.
pub trait ChunkStore: ValueResolver {
    /// Persist a chunk and return its hash.
    ///
    /// If the chunk already exists, this is a no-op (idempotent).
    fn put(&self, chunk: Chunk) -> StoreResult<Hash>;

    /// Check whether a chunk exists.
    fn has(&self, hash: &Hash) -> StoreResult<bool>;

    /// Fetch a chunk with its hash attached.
    fn get(&self, hash: &Hash) -> StoreResult<Option<Chunk>> {
        Ok(self.read_chunk(hash)?.map(Chunk::new))
    }

    /// Persist several chunks and return their hashes.
    ///
    /// Default implementation calls `put()` for each chunk.
    fn put_many(&self, chunks: Vec<Chunk>) -> StoreResult<Vec<Hash>> {
        chunks.into_iter().map(|c| self.put(c)).collect()
    }
}
