//! The [`Value`] sum type.
//!
//! Values are immutable. Equality and hashing are defined over the canonical
//! encoding, so two values are equal exactly when they encode to the same
//! bytes.

use std::cmp::Ordering;

use arbor_types::{Hash, Kind};
use bytes::Bytes;

use crate::collections::{Blob, List, Map, Set};
use crate::decoder::ValueDecoder;
use crate::error::ValueResult;
use crate::reference::Ref;
use crate::resolver::ResolverLink;
use crate::structs::Struct;
use crate::types::Type;
use crate::writer::ValueWriter;

/// An immutable, content-addressable datum.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    Blob(Blob),
    List(List),
    Map(Map),
    Set(Set),
    Ref(Ref),
    Struct(Struct),
    Type(Type),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::String(_) => Kind::String,
            Self::Blob(_) => Kind::Blob,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Set(_) => Kind::Set,
            Self::Ref(_) => Kind::Ref,
            Self::Struct(_) => Kind::Struct,
            Self::Type(_) => Kind::Type,
        }
    }

    /// Append the canonical encoding of this value to `w`.
    pub fn write_to(&self, w: &mut ValueWriter) {
        match self {
            Self::Bool(b) => {
                w.write_kind(Kind::Bool);
                w.write_bool(*b);
            }
            Self::Number(n) => {
                w.write_kind(Kind::Number);
                w.write_number(*n);
            }
            Self::String(s) => {
                w.write_kind(Kind::String);
                w.write_string(s);
            }
            Self::Blob(b) => b.write_to(w),
            Self::List(l) => l.write_to(w),
            Self::Map(m) => m.write_to(w),
            Self::Set(s) => s.write_to(w),
            Self::Ref(r) => r.write_to(w),
            Self::Struct(s) => w.write_raw(s.encoded()),
            Self::Type(t) => {
                w.write_kind(Kind::Type);
                t.write_to(w);
            }
        }
    }

    /// The canonical encoding.
    pub fn encode(&self) -> Bytes {
        if let Self::Struct(s) = self {
            return s.encoded().clone();
        }
        let mut w = ValueWriter::new();
        self.write_to(&mut w);
        w.into_bytes()
    }

    /// Digest of the canonical encoding. Recomputed on every call.
    pub fn hash(&self) -> Hash {
        match self {
            Self::Struct(s) => s.hash(),
            other => Hash::of(&other.encode()),
        }
    }

    /// Exact byte-equality of canonical encodings.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Struct(a), Self::Struct(b)) => a.equals(b),
            _ => self.kind() == other.kind() && self.encode() == other.encode(),
        }
    }

    /// Total order used for set elements and map keys.
    ///
    /// Bool, Number and String values sort before everything else, by kind
    /// tag and then by value. All other values sort by hash.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self.is_value_ordered(), other.is_value_ordered()) {
            (true, true) => match (self, other) {
                (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
                (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
                (Self::String(a), Self::String(b)) => a.cmp(b),
                _ => self.kind().tag().cmp(&other.kind().tag()),
            },
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.hash().cmp(&other.hash()),
        }
    }

    /// Returns `true` for values that order by value rather than by hash.
    pub fn is_value_ordered(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::String(_))
    }

    /// Derive the structural type of this value.
    ///
    /// Collection element types are the simplified union of the element
    /// types, which for leaf lists means decoding every element.
    pub fn type_of(&self) -> ValueResult<Type> {
        match self {
            Self::Bool(_) => Ok(Type::bool()),
            Self::Number(_) => Ok(Type::number()),
            Self::String(_) => Ok(Type::string()),
            Self::Blob(_) => Ok(Type::blob()),
            Self::Type(_) => Ok(Type::type_type()),
            Self::List(l) => l.type_of(),
            Self::Map(m) => m.type_of(),
            Self::Set(s) => s.type_of(),
            Self::Ref(r) => Ok(Type::ref_of(r.target_type().clone())),
            Self::Struct(s) => s.type_of(),
        }
    }

    /// Visit the immediate child values: struct fields, list and set
    /// elements, map keys and values. Chunked collections load their
    /// children through the resolver.
    pub fn walk_values(&self, cb: &mut dyn FnMut(&Value)) -> ValueResult<()> {
        match self {
            Self::Struct(s) => s.walk_values(cb),
            Self::List(l) => {
                for v in l.values()? {
                    cb(&v);
                }
                Ok(())
            }
            Self::Set(s) => {
                for v in s.values()? {
                    cb(&v);
                }
                Ok(())
            }
            Self::Map(m) => {
                for (k, v) in m.entries()? {
                    cb(&k);
                    cb(&v);
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Visit every ref embedded in this value's encoding, at any depth.
    /// Refs are reported, not followed.
    pub fn walk_refs(&self, cb: &mut dyn FnMut(&Ref)) -> ValueResult<()> {
        ValueDecoder::new(self.encode(), ResolverLink::detached()).walk_refs(cb)
    }

    /// The live resolver link this value loads nested chunks through, if
    /// any. Flat sets and maps report the first link among their elements.
    pub fn link(&self) -> Option<&ResolverLink> {
        let link = match self {
            Self::Blob(b) => b.link(),
            Self::List(l) => l.link(),
            Self::Map(m) => m.link(),
            Self::Set(s) => s.link(),
            Self::Struct(s) => Some(s.resolver()),
            _ => None,
        };
        link.filter(|l| l.is_attached())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

// Byte equality is reflexive even for NaN numbers.
impl Eq for Value {}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Self::Struct(s)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Self::Type(t)
    }
}
