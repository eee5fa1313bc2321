//! Interior nodes of chunked collections.
//!
//! A [`MetaSequence`] holds one [`MetaTuple`] per child chunk: a ref to the
//! child, the boundary key of the child's last element, and the number of
//! leaf elements under the child. Tuples are ordered consistently with the
//! flattened leaf sequence, so lookups descend one chunk per level.

use std::cmp::Ordering;

use arbor_types::{Hash, Kind};
use tracing::debug;

use crate::error::{ValueError, ValueResult};
use crate::reference::Ref;
use crate::resolver::ResolverLink;
use crate::types::Type;
use crate::value::Value;
use crate::writer::ValueWriter;

/// Search key derived from a boundary value.
///
/// Value-ordered keys (Bool, Number, String) sort before hash-ordered keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderedKey {
    Value(Value),
    Hash(Hash),
}

impl OrderedKey {
    /// The ordering key of an element.
    pub fn new(v: &Value) -> Self {
        if v.is_value_ordered() {
            return Self::Value(v.clone());
        }
        Self::Hash(v.hash())
    }

    /// The ordering key of a boundary value. A ref boundary orders by its
    /// target hash without loading the target.
    pub fn from_boundary(v: &Value) -> Self {
        match v {
            Value::Ref(r) => Self::Hash(r.target_hash()),
            other => Self::new(other),
        }
    }
}

impl Ord for OrderedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a.compare(b),
            (Self::Value(_), Self::Hash(_)) => Ordering::Less,
            (Self::Hash(_), Self::Value(_)) => Ordering::Greater,
            (Self::Hash(a), Self::Hash(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for OrderedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One child entry of a meta sequence.
#[derive(Clone, Debug)]
pub struct MetaTuple {
    child: Ref,
    boundary: Value,
    key: OrderedKey,
    num_leaves: u64,
}

impl MetaTuple {
    pub fn new(child: Ref, boundary: Value, num_leaves: u64) -> Self {
        let key = OrderedKey::from_boundary(&boundary);
        Self {
            child,
            boundary,
            key,
            num_leaves,
        }
    }

    pub fn child(&self) -> &Ref {
        &self.child
    }

    pub fn boundary(&self) -> &Value {
        &self.boundary
    }

    pub fn key(&self) -> &OrderedKey {
        &self.key
    }

    pub fn num_leaves(&self) -> u64 {
        self.num_leaves
    }
}

/// An interior node of a chunked Blob, List, Map or Set.
#[derive(Clone, Debug)]
pub struct MetaSequence {
    kind: Kind,
    level: u64,
    tuples: Vec<MetaTuple>,
    link: ResolverLink,
}

impl MetaSequence {
    pub fn new(kind: Kind, level: u64, tuples: Vec<MetaTuple>, link: ResolverLink) -> Self {
        Self {
            kind,
            level,
            tuples,
            link,
        }
    }

    /// The collection kind this node belongs to.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Height above the leaves; always at least 1.
    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn tuples(&self) -> &[MetaTuple] {
        &self.tuples
    }

    pub fn link(&self) -> &ResolverLink {
        &self.link
    }

    /// Total leaf elements under this node, saturating at `u64::MAX` for
    /// corrupt leaf counts.
    pub fn num_leaves(&self) -> u64 {
        self.tuples
            .iter()
            .fold(0u64, |total, t| total.saturating_add(t.num_leaves))
    }

    /// Locate leaf `idx`: the tuple holding it and its index within that
    /// child. `None` if out of range.
    pub fn find_by_index(&self, idx: u64) -> Option<(usize, u64)> {
        let mut start = 0u64;
        for (i, t) in self.tuples.iter().enumerate() {
            let end = start.saturating_add(t.num_leaves);
            if idx < end {
                return Some((i, idx - start));
            }
            start = end;
        }
        None
    }

    /// The first tuple whose boundary key is `>= key`, or `None` if `key`
    /// sorts after every boundary.
    pub fn find_by_key(&self, key: &OrderedKey) -> Option<usize> {
        let i = self.tuples.partition_point(|t| t.key < *key);
        (i < self.tuples.len()).then_some(i)
    }

    /// Load the child chunk of tuple `i` through the resolver link. The
    /// child must be a collection of the same kind.
    pub fn child_value(&self, i: usize) -> ValueResult<Value> {
        let tuple = self.tuples.get(i).ok_or(ValueError::IndexOutOfBounds {
            index: i as u64,
            len: self.tuples.len() as u64,
        })?;
        let target = tuple.child.target_hash();
        debug!(kind = %self.kind, level = self.level, child = %target.short_hex(), "loading child chunk");
        let value = self.link.read_value(&target)?;
        if value.kind() != self.kind {
            return Err(ValueError::UnexpectedValueKind {
                expected: self.kind,
                actual: value.kind(),
            });
        }
        Ok(value)
    }

    /// Union of the element types recorded in the child refs' target types,
    /// without loading any child. For maps, the pair of key and value
    /// unions.
    pub fn child_element_types(&self) -> ValueResult<Vec<Type>> {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for t in &self.tuples {
            match t.child.target_type() {
                Type::List(elem) | Type::Set(elem) => keys.push((**elem).clone()),
                Type::Map(k, v) => {
                    keys.push((**k).clone());
                    values.push((**v).clone());
                }
                Type::Primitive(Kind::Blob) => {}
                other => {
                    return Err(ValueError::InvalidType(format!(
                        "meta tuple child of {} has type {other}",
                        self.kind
                    )))
                }
            }
        }
        let mut out = vec![Type::union_of(keys)];
        if self.kind == Kind::Map {
            out.push(Type::union_of(values));
        }
        Ok(out)
    }

    /// Tuple count followed by each tuple.
    pub fn write_body(&self, w: &mut ValueWriter) {
        w.write_count(self.tuples.len() as u64);
        for t in &self.tuples {
            t.child.write_to(w);
            t.boundary.write_to(w);
            w.write_count(t.num_leaves);
        }
    }
}
