use arbor_types::Hash;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The chunk's content does not hash to the id it was stored under.
    #[error("hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: Hash, computed: Hash },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
