//! Error types for the value crate.

use arbor_store::StoreError;
use arbor_types::{Hash, Kind};

/// Errors that can occur while encoding, decoding, or manipulating values.
///
/// The first group of variants are all flavours of malformed encoding. They
/// are never retried: the bytes come from trusted local storage or were
/// already verified against their hash, so a failure here is a data or
/// programming error.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("unknown kind tag {tag} at offset {offset}")]
    UnknownKind { tag: u8, offset: usize },

    /// Union, Cycle, or Value tag where a concrete value is required.
    #[error("a value instance can never have kind {kind} (offset {offset})")]
    UnexpectedKind { kind: Kind, offset: usize },

    #[error("cycle reference to undeclared struct {name:?}")]
    UnresolvedCycle { name: String },

    #[error("cycle reference to an anonymous struct at offset {offset}")]
    AnonymousCycle { offset: usize },

    #[error("truncated encoding: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    #[error("nesting deeper than {limit} levels at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    #[error("invalid bool byte {byte:#04x} at offset {offset}")]
    InvalidBool { offset: usize, byte: u8 },

    #[error("struct fields out of order: {previous:?} then {next:?}")]
    UnsortedFields { previous: String, next: String },

    #[error("invalid type: {0}")]
    InvalidType(String),

    /// A struct or field name does not match `[A-Za-z][A-Za-z0-9_]*`.
    #[error("invalid struct{context} name: {name:?}")]
    InvalidIdentifier { name: String, context: &'static str },

    #[error("duplicate struct field: {0:?}")]
    DuplicateField(String),

    #[error("struct template expects {expected} values, got {actual}")]
    TemplateArity { expected: usize, actual: usize },

    #[error("struct has no field {0:?}")]
    MissingField(String),

    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: u64, len: u64 },

    #[error("expected a {expected} value, found {actual}")]
    UnexpectedValueKind { expected: Kind, actual: Kind },

    #[error("value has no resolver attached")]
    MissingResolver,

    #[error("chunk not found: {0}")]
    ChunkNotFound(Hash),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),
}

impl ValueError {
    /// Returns `true` for every variant that signals corrupt or non-canonical
    /// input bytes.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind { .. }
                | Self::UnexpectedKind { .. }
                | Self::UnresolvedCycle { .. }
                | Self::AnonymousCycle { .. }
                | Self::Truncated { .. }
                | Self::InvalidUtf8 { .. }
                | Self::VarintOverflow { .. }
                | Self::NestingTooDeep { .. }
                | Self::InvalidBool { .. }
                | Self::UnsortedFields { .. }
                | Self::InvalidType(_)
        )
    }
}

/// Convenience alias for value results.
pub type ValueResult<T> = Result<T, ValueError>;
