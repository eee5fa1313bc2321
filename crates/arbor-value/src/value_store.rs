//! Persisting values as chunks.
//!
//! [`ValueStore`] writes each value's canonical encoding as one chunk and
//! reads values back with the store attached as their resolver link. The
//! `chunk_*` builders split large collections into leaf chunks and stack
//! meta sequence levels on top, writing every child before its parent.

use std::sync::Arc;

use arbor_store::{Chunk, ChunkStore};
use arbor_types::{Hash, Kind};
use tracing::debug;

use crate::collections::{Blob, List, Map, Set};
use crate::error::ValueResult;
use crate::meta::{MetaSequence, MetaTuple};
use crate::reference::Ref;
use crate::resolver::ResolverLink;
use crate::value::Value;

/// Reads and writes values through a [`ChunkStore`].
#[derive(Debug)]
pub struct ValueStore<S: ChunkStore + 'static> {
    store: Arc<S>,
}

impl<S: ChunkStore + 'static> ValueStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// A non-owning link to the underlying store.
    pub fn link(&self) -> ResolverLink {
        ResolverLink::new(&self.store)
    }

    /// Persist `value` and return a ref to it.
    pub fn write_value(&self, value: &Value) -> ValueResult<Ref> {
        let r = Ref::from_value(value)?;
        let encoded = value.encode();
        let len = encoded.len();
        let hash = self.store.put(Chunk::new(encoded))?;
        debug!(hash = %hash.short_hex(), kind = %value.kind(), len, "value written");
        Ok(r)
    }

    /// Load the value stored under `hash`.
    pub fn read_value(&self, hash: &Hash) -> ValueResult<Value> {
        self.link().read_value(hash)
    }

    /// Build a chunked list with at most `chunk_len` elements per leaf and
    /// `chunk_len` tuples per interior node. `chunk_len` below 2 is raised
    /// to 2. Lists that fit in one leaf stay flat.
    pub fn chunk_list(&self, values: Vec<Value>, chunk_len: usize) -> ValueResult<List> {
        let chunk_len = chunk_len.max(2);
        if values.len() <= chunk_len {
            return Ok(List::new(values));
        }
        let mut tuples = Vec::new();
        for chunk in values.chunks(chunk_len) {
            let r = self.write_value(&Value::List(List::new(chunk.to_vec())))?;
            tuples.push(MetaTuple::new(
                r,
                Value::Number(chunk.len() as f64),
                chunk.len() as u64,
            ));
        }
        Ok(List::from_meta(self.build_tree(Kind::List, tuples, chunk_len)?))
    }

    /// Build a chunked set. Elements are sorted and deduplicated first; each
    /// tuple's boundary is the last element of its chunk.
    pub fn chunk_set(&self, values: Vec<Value>, chunk_len: usize) -> ValueResult<Set> {
        let chunk_len = chunk_len.max(2);
        let sorted = Set::new(values).values()?;
        if sorted.len() <= chunk_len {
            return Ok(Set::from_leaf(sorted));
        }
        let mut tuples = Vec::new();
        for chunk in sorted.chunks(chunk_len) {
            let r = self.write_value(&Value::Set(Set::from_leaf(chunk.to_vec())))?;
            let boundary = chunk[chunk.len() - 1].clone();
            tuples.push(MetaTuple::new(r, boundary, chunk.len() as u64));
        }
        Ok(Set::from_meta(self.build_tree(Kind::Set, tuples, chunk_len)?))
    }

    /// Build a chunked map; boundaries are the last key of each chunk.
    pub fn chunk_map(&self, entries: Vec<(Value, Value)>, chunk_len: usize) -> ValueResult<Map> {
        let chunk_len = chunk_len.max(2);
        let sorted = Map::new(entries).entries()?;
        if sorted.len() <= chunk_len {
            return Ok(Map::from_leaf(sorted));
        }
        let mut tuples = Vec::new();
        for chunk in sorted.chunks(chunk_len) {
            let r = self.write_value(&Value::Map(Map::from_leaf(chunk.to_vec())))?;
            let boundary = chunk[chunk.len() - 1].0.clone();
            tuples.push(MetaTuple::new(r, boundary, chunk.len() as u64));
        }
        Ok(Map::from_meta(self.build_tree(Kind::Map, tuples, chunk_len)?))
    }

    /// Build a chunked blob of `chunk_len`-byte leaves.
    pub fn chunk_blob(&self, data: &[u8], chunk_len: usize) -> ValueResult<Blob> {
        let chunk_len = chunk_len.max(2);
        if data.len() <= chunk_len {
            return Ok(Blob::new(data.to_vec()));
        }
        let mut tuples = Vec::new();
        for chunk in data.chunks(chunk_len) {
            let r = self.write_value(&Value::Blob(Blob::new(chunk.to_vec())))?;
            tuples.push(MetaTuple::new(
                r,
                Value::Number(chunk.len() as f64),
                chunk.len() as u64,
            ));
        }
        Ok(Blob::from_meta(self.build_tree(Kind::Blob, tuples, chunk_len)?))
    }

    /// Group `tuples` into interior nodes until one node's worth remains,
    /// persisting each node below the root.
    fn build_tree(
        &self,
        kind: Kind,
        mut tuples: Vec<MetaTuple>,
        chunk_len: usize,
    ) -> ValueResult<MetaSequence> {
        let mut level = 1;
        while tuples.len() > chunk_len {
            let mut parents = Vec::new();
            for group in tuples.chunks(chunk_len) {
                let node = MetaSequence::new(kind, level, group.to_vec(), self.link());
                let leaves = node.num_leaves();
                let boundary = match kind {
                    Kind::List | Kind::Blob => Value::Number(leaves as f64),
                    _ => group[group.len() - 1].boundary().clone(),
                };
                let r = self.write_value(&wrap_meta(kind, node))?;
                parents.push(MetaTuple::new(r, boundary, leaves));
            }
            tuples = parents;
            level += 1;
        }
        Ok(MetaSequence::new(kind, level, tuples, self.link()))
    }
}

fn wrap_meta(kind: Kind, meta: MetaSequence) -> Value {
    match kind {
        Kind::Blob => Value::Blob(Blob::from_meta(meta)),
        Kind::Set => Value::Set(Set::from_meta(meta)),
        Kind::Map => Value::Map(Map::from_meta(meta)),
        _ => Value::List(List::from_meta(meta)),
    }
}

#[cfg(test)]
mod tests {
    use arbor_store::MemoryChunkStore;

    use super::*;
    use crate::error::ValueError;
    use crate::structs::Struct;
    use crate::types::Type;

    fn store() -> ValueStore<MemoryChunkStore> {
        ValueStore::new(Arc::new(MemoryChunkStore::new()))
    }

    fn numbers(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::Number(i as f64)).collect()
    }

    #[test]
    fn write_then_read_attaches_link() {
        let vs = store();
        let s = Struct::new("Doc", [("title", Value::from("t"))]).unwrap();
        let r = vs.write_value(&Value::Struct(s.clone())).unwrap();
        assert_eq!(r.target_hash(), s.hash());
        let back = vs.read_value(&r.target_hash()).unwrap();
        let back = back.as_struct().unwrap();
        assert_eq!(back, &s);
        assert!(back.resolver().is_attached());
        assert!(!s.resolver().is_attached());
    }

    #[test]
    fn small_list_stays_flat() {
        let l = store().chunk_list(numbers(3), 4).unwrap();
        assert!(l.meta().is_none());
        assert_eq!(l.len(), 3);
    }

    #[test]
    fn chunked_list_random_access() {
        let vs = store();
        let l = vs.chunk_list(numbers(20), 3).unwrap();
        let meta = l.meta().unwrap();
        assert!(meta.level() >= 2);
        assert_eq!(l.len(), 20);
        for i in 0..20u64 {
            assert_eq!(l.get(i).unwrap(), Value::Number(i as f64));
        }
        assert!(matches!(l.get(20), Err(ValueError::IndexOutOfBounds { .. })));
        assert_eq!(l.values().unwrap(), numbers(20));
        assert_eq!(l.type_of().unwrap(), Type::list_of(Type::number()));
    }

    #[test]
    fn chunked_list_survives_a_round_trip_through_the_store() {
        let vs = store();
        let l = vs.chunk_list(numbers(10), 2).unwrap();
        let r = vs.write_value(&Value::List(l)).unwrap();
        assert!(r.height() > 1);
        let Value::List(back) = vs.read_value(&r.target_hash()).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(back.len(), 10);
        assert_eq!(back.get(7).unwrap(), Value::Number(7.0));
    }

    #[test]
    fn chunked_set_membership() {
        let vs = store();
        let words: Vec<Value> = ["pear", "fig", "apple", "kiwi", "lime", "date", "plum"]
            .into_iter()
            .map(Value::from)
            .collect();
        let s = vs.chunk_set(words.clone(), 2).unwrap();
        assert!(s.meta().is_some());
        assert_eq!(s.len(), 7);
        for w in &words {
            assert!(s.has(w).unwrap(), "{w:?}");
        }
        assert!(!s.has(&Value::from("zucchini")).unwrap());
        assert!(!s.has(&Value::from("banana")).unwrap());
        assert_eq!(s.values().unwrap(), Set::new(words).values().unwrap());
    }

    #[test]
    fn chunked_map_lookup() {
        let vs = store();
        let entries: Vec<(Value, Value)> = (0..9)
            .map(|i| (Value::from(format!("k{i}")), Value::Number(f64::from(i))))
            .collect();
        let m = vs.chunk_map(entries, 3).unwrap();
        assert!(m.meta().is_some());
        assert_eq!(m.get(&Value::from("k4")).unwrap(), Some(Value::Number(4.0)));
        assert_eq!(m.get(&Value::from("k9")).unwrap(), None);
        assert_eq!(
            m.type_of().unwrap(),
            Type::map_of(Type::string(), Type::number())
        );
    }

    #[test]
    fn chunked_blob_reassembles() {
        let vs = store();
        let data: Vec<u8> = (0..50u8).collect();
        let b = vs.chunk_blob(&data, 8).unwrap();
        assert!(b.meta().is_some());
        assert_eq!(b.len(), 50);
        assert_eq!(b.bytes().unwrap().as_ref(), data.as_slice());
    }

    #[test]
    fn nested_chunked_list_keeps_paging() {
        let vs = store();
        let l = vs.chunk_list(numbers(6), 2).unwrap();
        assert_eq!(l.get(0).unwrap(), Value::Number(0.0));

        let s = Struct::new("S", [("l", Value::List(l.clone()))]).unwrap();
        assert!(s.resolver().is_attached());
        let Value::List(inner) = s.get("l").unwrap() else {
            panic!("expected list");
        };
        assert_eq!(inner.get(4).unwrap(), Value::Number(4.0));

        let outer = List::new(vec![Value::List(l.clone())]);
        let Value::List(inner) = outer.get(0).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(inner.get(5).unwrap(), Value::Number(5.0));

        let r = vs.write_value(&Value::List(l)).unwrap();
        let stored = vs.read_value(&r.target_hash()).unwrap();
        let t = Struct::empty().set("l", stored).unwrap();
        let Value::List(inner) = t.get("l").unwrap() else {
            panic!("expected list");
        };
        assert_eq!(inner.get(1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn dropped_store_cannot_page_children() {
        let vs = store();
        let l = vs.chunk_list(numbers(6), 2).unwrap();
        drop(vs);
        assert!(matches!(l.get(0), Err(ValueError::MissingResolver)));
    }
}
