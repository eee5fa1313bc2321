use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Width in bytes of a [`Hash`].
pub const HASH_LEN: usize = 32;

/// Content-addressed identifier for a value or chunk.
///
/// A `Hash` is the BLAKE3 digest of a value's canonical encoding. Two values
/// are equal exactly when their encodings are byte-identical, so equal values
/// always share a `Hash`.
#[derive(Clone, Copy, PartialEq, Eq, std::hash::Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// Hash canonical value bytes with the default value domain.
    pub fn of(data: &[u8]) -> Self {
        ValueHasher::VALUE.hash(data)
    }

    /// Create a `Hash` from a pre-computed digest.
    pub const fn from_digest(digest: [u8; HASH_LEN]) -> Self {
        Self(digest)
    }

    /// The empty hash (all zeros). Never produced by [`Hash::of`].
    pub const fn empty() -> Self {
        Self([0u8; HASH_LEN])
    }

    /// Returns `true` if this is the empty hash.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Copy a digest out of a byte slice of exactly [`HASH_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: HASH_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for [u8; HASH_LEN] {
    fn from(h: Hash) -> Self {
        h.0
    }
}

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to every digest so bytes hashed under one
/// domain can never collide with the same bytes hashed under another.
pub struct ValueHasher {
    domain: &'static str,
}

impl ValueHasher {
    /// Hasher for canonical value encodings (and the chunks that hold them).
    pub const VALUE: Self = Self {
        domain: "arbor-value-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Hash::from_digest(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &Hash) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_is_deterministic() {
        assert_eq!(Hash::of(b"hello world"), Hash::of(b"hello world"));
    }

    #[test]
    fn different_data_produces_different_hashes() {
        assert_ne!(Hash::of(b"hello"), Hash::of(b"world"));
    }

    #[test]
    fn empty_is_all_zeros() {
        let empty = Hash::empty();
        assert!(empty.is_empty());
        assert!(!Hash::of(b"").is_empty());
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash::of(b"test");
        assert_eq!(Hash::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Hash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypesError::InvalidLength {
                expected: HASH_LEN,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Hash::from_hex("zz"),
            Err(TypesError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(Hash::of(b"test").short_hex().len(), 8);
    }

    #[test]
    fn serde_roundtrip() {
        let h = Hash::of(b"serde test");
        let json = serde_json::to_string(&h).unwrap();
        let parsed: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn ordering_follows_bytes() {
        assert!(Hash::from_digest([0; HASH_LEN]) < Hash::from_digest([1; HASH_LEN]));
    }

    #[test]
    fn domains_are_separated() {
        let custom = ValueHasher::new("other-domain-v1");
        assert_ne!(custom.hash(b"data"), ValueHasher::VALUE.hash(b"data"));
        assert!(ValueHasher::VALUE.verify(b"data", &Hash::of(b"data")));
        assert!(!ValueHasher::VALUE.verify(b"tampered", &Hash::of(b"data")));
    }
}
