//! Immutable value model for Arbor.
//!
//! Every value has exactly one canonical byte encoding; equality and hashing
//! are defined over it. This crate implements that encoding, the structural
//! type system, and the value kinds built on top of it.
//!
//! # Layers
//!
//! - [`ValueReader`] / [`ValueWriter`] -- primitive codec: tags, varint
//!   counts, bools, numbers, strings, byte spans, hashes
//! - [`ValueDecoder`] -- reads or skips any encoded value or type descriptor
//! - [`Value`] -- the sum of Bool, Number, String, Blob, List, Map, Set, Ref,
//!   Struct and Type
//! - [`Struct`] -- field access and copy-on-write mutation over the encoded
//!   bytes, plus [`StructTemplate`] for repeated construction
//! - [`ListLeafSequence`] -- list leaves decoded element by element on demand
//! - [`MetaSequence`] -- interior nodes of chunked collections
//! - [`ValueStore`] -- writes values as chunks and reads them back attached to
//!   the store
//!
//! # Wire Format
//!
//! Every value starts with a [`Kind`](arbor_types::Kind) tag byte. Counts are
//! LEB128 varints, strings are length-prefixed UTF-8, numbers are big-endian
//! `f64`. Struct fields are always written in ascending name order, so any
//! two structs with the same fields encode identically.

pub mod collections;
pub mod config;
pub mod decoder;
pub mod error;
pub mod field_name;
pub mod list_leaf;
pub mod meta;
pub mod reader;
pub mod reference;
pub mod resolver;
pub mod structs;
pub mod type_decoder;
pub mod types;
pub mod value;
pub mod value_store;
pub mod writer;

pub use collections::{Blob, List, Map, Set};
pub use config::{CodecConfig, DEFAULT_MAX_DEPTH};
pub use decoder::ValueDecoder;
pub use error::{ValueError, ValueResult};
pub use field_name::{camel_case_field_name, escape_struct_field, is_valid_struct_field_name};
pub use list_leaf::ListLeafSequence;
pub use meta::{MetaSequence, MetaTuple, OrderedKey};
pub use reader::ValueReader;
pub use reference::Ref;
pub use resolver::ResolverLink;
pub use structs::{FieldIter, Struct, StructTemplate};
pub use types::{StructField, StructType, Type};
pub use value::Value;
pub use value_store::ValueStore;
pub use writer::ValueWriter;
