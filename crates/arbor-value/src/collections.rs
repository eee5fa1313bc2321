//! Blob, List, Map and Set values.
//!
//! Each collection is either a leaf holding its elements directly or a
//! chunked tree rooted at a [`MetaSequence`]. Chunked collections load child
//! chunks through their resolver link on demand.

use arbor_types::Kind;
use bytes::{Bytes, BytesMut};

use crate::error::{ValueError, ValueResult};
use crate::list_leaf::ListLeafSequence;
use crate::meta::{MetaSequence, OrderedKey};
use crate::resolver::ResolverLink;
use crate::types::Type;
use crate::value::Value;
use crate::writer::ValueWriter;

#[derive(Clone, Debug)]
enum Sequence<L> {
    Leaf(L),
    Meta(MetaSequence),
}

impl<L> Sequence<L> {
    fn meta(&self) -> Option<&MetaSequence> {
        match self {
            Self::Leaf(_) => None,
            Self::Meta(m) => Some(m),
        }
    }

    /// Tag, height, then the body `leaf` writes for a flat sequence.
    fn write_to(&self, kind: Kind, w: &mut ValueWriter, leaf: impl FnOnce(&L, &mut ValueWriter)) {
        w.write_kind(kind);
        match self {
            Self::Leaf(l) => {
                w.write_count(0);
                leaf(l, w);
            }
            Self::Meta(m) => {
                w.write_count(m.level());
                m.write_body(w);
            }
        }
    }
}

fn first_or_empty(types: Vec<Type>) -> Type {
    types.into_iter().next().unwrap_or_else(|| Type::Union(vec![]))
}

fn wrong_child(expected: Kind, actual: &Value) -> ValueError {
    ValueError::UnexpectedValueKind {
        expected,
        actual: actual.kind(),
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// An opaque byte string.
#[derive(Clone, Debug)]
pub struct Blob {
    seq: Sequence<Bytes>,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::from_leaf(data.into())
    }

    pub fn from_leaf(data: Bytes) -> Self {
        Self {
            seq: Sequence::Leaf(data),
        }
    }

    pub fn from_meta(meta: MetaSequence) -> Self {
        Self {
            seq: Sequence::Meta(meta),
        }
    }

    pub fn meta(&self) -> Option<&MetaSequence> {
        self.seq.meta()
    }

    pub(crate) fn link(&self) -> Option<&ResolverLink> {
        self.seq.meta().map(MetaSequence::link)
    }

    /// Length in bytes. For a chunked blob, read from the leaf counts.
    pub fn len(&self) -> u64 {
        match &self.seq {
            Sequence::Leaf(b) => b.len() as u64,
            Sequence::Meta(m) => m.num_leaves(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The full contents, loading every chunk of a chunked blob.
    pub fn bytes(&self) -> ValueResult<Bytes> {
        match &self.seq {
            Sequence::Leaf(b) => Ok(b.clone()),
            Sequence::Meta(m) => {
                let mut out = BytesMut::new();
                for i in 0..m.tuples().len() {
                    match m.child_value(i)? {
                        Value::Blob(child) => out.extend_from_slice(&child.bytes()?),
                        other => return Err(wrong_child(Kind::Blob, &other)),
                    }
                }
                Ok(out.freeze())
            }
        }
    }

    pub fn write_to(&self, w: &mut ValueWriter) {
        self.seq.write_to(Kind::Blob, w, |b, w| w.write_bytes(b));
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// An ordered sequence of values.
#[derive(Clone, Debug)]
pub struct List {
    seq: Sequence<ListLeafSequence>,
}

impl List {
    pub fn new(values: Vec<Value>) -> Self {
        Self::from_leaf(ListLeafSequence::from_values(&values))
    }

    pub fn from_leaf(leaf: ListLeafSequence) -> Self {
        Self {
            seq: Sequence::Leaf(leaf),
        }
    }

    pub fn from_meta(meta: MetaSequence) -> Self {
        Self {
            seq: Sequence::Meta(meta),
        }
    }

    pub fn meta(&self) -> Option<&MetaSequence> {
        self.seq.meta()
    }

    pub(crate) fn link(&self) -> Option<&ResolverLink> {
        match &self.seq {
            Sequence::Leaf(l) => Some(l.link()),
            Sequence::Meta(m) => Some(m.link()),
        }
    }

    pub fn len(&self) -> u64 {
        match &self.seq {
            Sequence::Leaf(l) => l.len(),
            Sequence::Meta(m) => m.num_leaves(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `idx`. A chunked list loads one chunk per level.
    pub fn get(&self, idx: u64) -> ValueResult<Value> {
        match &self.seq {
            Sequence::Leaf(l) => l.get(idx),
            Sequence::Meta(m) => {
                let (i, inner) = m.find_by_index(idx).ok_or(ValueError::IndexOutOfBounds {
                    index: idx,
                    len: m.num_leaves(),
                })?;
                match m.child_value(i)? {
                    Value::List(child) => child.get(inner),
                    other => Err(wrong_child(Kind::List, &other)),
                }
            }
        }
    }

    /// Every element in order.
    pub fn values(&self) -> ValueResult<Vec<Value>> {
        match &self.seq {
            Sequence::Leaf(l) => l.values(),
            Sequence::Meta(m) => {
                let mut out = Vec::new();
                for i in 0..m.tuples().len() {
                    match m.child_value(i)? {
                        Value::List(child) => out.extend(child.values()?),
                        other => return Err(wrong_child(Kind::List, &other)),
                    }
                }
                Ok(out)
            }
        }
    }

    pub fn type_of(&self) -> ValueResult<Type> {
        let elem = match &self.seq {
            Sequence::Leaf(l) => l.element_type()?,
            Sequence::Meta(m) => first_or_empty(m.child_element_types()?),
        };
        Ok(Type::list_of(elem))
    }

    pub fn write_to(&self, w: &mut ValueWriter) {
        self.seq.write_to(Kind::List, w, |l, w| l.write_body(w));
    }
}

// ---------------------------------------------------------------------------
// Set
// ---------------------------------------------------------------------------

/// A set of values ordered by [`Value::compare`].
#[derive(Clone, Debug)]
pub struct Set {
    seq: Sequence<Vec<Value>>,
}

impl Set {
    /// Sort and deduplicate `values`.
    pub fn new(mut values: Vec<Value>) -> Self {
        values.sort_by(|a, b| a.compare(b));
        values.dedup_by(|a, b| a.equals(b));
        Self::from_leaf(values)
    }

    /// Wrap elements already in canonical order.
    pub fn from_leaf(values: Vec<Value>) -> Self {
        Self {
            seq: Sequence::Leaf(values),
        }
    }

    pub fn from_meta(meta: MetaSequence) -> Self {
        Self {
            seq: Sequence::Meta(meta),
        }
    }

    pub fn meta(&self) -> Option<&MetaSequence> {
        self.seq.meta()
    }

    pub(crate) fn link(&self) -> Option<&ResolverLink> {
        match &self.seq {
            Sequence::Leaf(values) => values.iter().find_map(Value::link),
            Sequence::Meta(m) => Some(m.link()),
        }
    }

    pub fn len(&self) -> u64 {
        match &self.seq {
            Sequence::Leaf(v) => v.len() as u64,
            Sequence::Meta(m) => m.num_leaves(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test. A chunked set descends by boundary key.
    pub fn has(&self, v: &Value) -> ValueResult<bool> {
        match &self.seq {
            Sequence::Leaf(values) => Ok(values.binary_search_by(|e| e.compare(v)).is_ok()),
            Sequence::Meta(m) => {
                let Some(i) = m.find_by_key(&OrderedKey::new(v)) else {
                    return Ok(false);
                };
                match m.child_value(i)? {
                    Value::Set(child) => child.has(v),
                    other => Err(wrong_child(Kind::Set, &other)),
                }
            }
        }
    }

    pub fn values(&self) -> ValueResult<Vec<Value>> {
        match &self.seq {
            Sequence::Leaf(values) => Ok(values.clone()),
            Sequence::Meta(m) => {
                let mut out = Vec::new();
                for i in 0..m.tuples().len() {
                    match m.child_value(i)? {
                        Value::Set(child) => out.extend(child.values()?),
                        other => return Err(wrong_child(Kind::Set, &other)),
                    }
                }
                Ok(out)
            }
        }
    }

    pub fn type_of(&self) -> ValueResult<Type> {
        let elem = match &self.seq {
            Sequence::Leaf(values) => Type::union_of(
                values
                    .iter()
                    .map(Value::type_of)
                    .collect::<ValueResult<Vec<_>>>()?,
            ),
            Sequence::Meta(m) => first_or_empty(m.child_element_types()?),
        };
        Ok(Type::set_of(elem))
    }

    pub fn write_to(&self, w: &mut ValueWriter) {
        self.seq.write_to(Kind::Set, w, |values, w| {
            w.write_count(values.len() as u64);
            for v in values {
                v.write_to(w);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// A map with keys ordered by [`Value::compare`].
#[derive(Clone, Debug)]
pub struct Map {
    seq: Sequence<Vec<(Value, Value)>>,
}

impl Map {
    /// Sort `entries` by key. For repeated keys the last entry wins.
    pub fn new(entries: Vec<(Value, Value)>) -> Self {
        let mut sorted: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        let mut entries = entries;
        entries.sort_by(|a, b| a.0.compare(&b.0));
        for (k, v) in entries {
            match sorted.last_mut() {
                Some(last) if last.0.equals(&k) => last.1 = v,
                _ => sorted.push((k, v)),
            }
        }
        Self::from_leaf(sorted)
    }

    /// Wrap entries already in canonical key order.
    pub fn from_leaf(entries: Vec<(Value, Value)>) -> Self {
        Self {
            seq: Sequence::Leaf(entries),
        }
    }

    pub fn from_meta(meta: MetaSequence) -> Self {
        Self {
            seq: Sequence::Meta(meta),
        }
    }

    pub fn meta(&self) -> Option<&MetaSequence> {
        self.seq.meta()
    }

    pub(crate) fn link(&self) -> Option<&ResolverLink> {
        match &self.seq {
            Sequence::Leaf(entries) => entries
                .iter()
                .find_map(|(k, v)| k.link().or_else(|| v.link())),
            Sequence::Meta(m) => Some(m.link()),
        }
    }

    pub fn len(&self) -> u64 {
        match &self.seq {
            Sequence::Leaf(e) => e.len() as u64,
            Sequence::Meta(m) => m.num_leaves(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Value) -> ValueResult<Option<Value>> {
        match &self.seq {
            Sequence::Leaf(entries) => Ok(entries
                .binary_search_by(|(k, _)| k.compare(key))
                .ok()
                .map(|i| entries[i].1.clone())),
            Sequence::Meta(m) => {
                let Some(i) = m.find_by_key(&OrderedKey::new(key)) else {
                    return Ok(None);
                };
                match m.child_value(i)? {
                    Value::Map(child) => child.get(key),
                    other => Err(wrong_child(Kind::Map, &other)),
                }
            }
        }
    }

    pub fn has(&self, key: &Value) -> ValueResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub fn entries(&self) -> ValueResult<Vec<(Value, Value)>> {
        match &self.seq {
            Sequence::Leaf(entries) => Ok(entries.clone()),
            Sequence::Meta(m) => {
                let mut out = Vec::new();
                for i in 0..m.tuples().len() {
                    match m.child_value(i)? {
                        Value::Map(child) => out.extend(child.entries()?),
                        other => return Err(wrong_child(Kind::Map, &other)),
                    }
                }
                Ok(out)
            }
        }
    }

    pub fn type_of(&self) -> ValueResult<Type> {
        match &self.seq {
            Sequence::Leaf(entries) => {
                let mut keys = Vec::with_capacity(entries.len());
                let mut values = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    keys.push(k.type_of()?);
                    values.push(v.type_of()?);
                }
                Ok(Type::map_of(Type::union_of(keys), Type::union_of(values)))
            }
            Sequence::Meta(m) => {
                let mut types = m.child_element_types()?;
                let values = types.pop().unwrap_or_else(|| Type::Union(vec![]));
                let keys = types.pop().unwrap_or_else(|| Type::Union(vec![]));
                Ok(Type::map_of(keys, values))
            }
        }
    }

    pub fn write_to(&self, w: &mut ValueWriter) {
        self.seq.write_to(Kind::Map, w, |entries, w| {
            w.write_count(entries.len() as u64);
            for (k, v) in entries {
                k.write_to(w);
                v.write_to(w);
            }
        });
    }
}
