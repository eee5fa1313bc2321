use arbor_types::Hash;
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// An immutable span of bytes together with its content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    hash: Hash,
    data: Bytes,
}

impl Chunk {
    /// Wrap bytes as a chunk, computing the hash.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            hash: Hash::of(&data),
            data,
        }
    }

    /// Wrap bytes read from an untrusted source, checking them against the
    /// hash they were requested under.
    pub fn verified(expected: Hash, data: impl Into<Bytes>) -> StoreResult<Self> {
        let chunk = Self::new(data);
        if chunk.hash != expected {
            return Err(StoreError::HashMismatch {
                expected,
                computed: chunk.hash,
            });
        }
        Ok(chunk)
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_content() {
        let chunk = Chunk::new(b"abc".to_vec());
        assert_eq!(chunk.hash(), Hash::of(b"abc"));
        assert_eq!(chunk.len(), 3);
    }

    #[test]
    fn verified_accepts_matching_hash() {
        let h = Hash::of(b"payload");
        let chunk = Chunk::verified(h, b"payload".to_vec()).unwrap();
        assert_eq!(chunk.data().as_ref(), b"payload");
    }

    #[test]
    fn verified_rejects_tampered_bytes() {
        let h = Hash::of(b"payload");
        let err = Chunk::verified(h, b"tampered".to_vec()).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }
}
