//! Refs: typed, height-annotated pointers to stored values.

use arbor_types::{Hash, Kind};

use crate::error::ValueResult;
use crate::resolver::ResolverLink;
use crate::types::Type;
use crate::value::Value;
use crate::writer::ValueWriter;

/// An immutable pointer to another value by content hash.
///
/// Besides the target hash a ref records the target's type and its height:
/// one more than the tallest ref reachable inside the target, so a ref to a
/// value with no refs has height 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ref {
    target: Hash,
    target_type: Type,
    height: u64,
}

impl Ref {
    pub fn new(target: Hash, target_type: Type, height: u64) -> Self {
        Self {
            target,
            target_type,
            height,
        }
    }

    /// Build a ref to `value`, deriving its hash, type and height.
    pub fn from_value(value: &Value) -> ValueResult<Self> {
        let mut max_height = 0;
        value.walk_refs(&mut |r| max_height = max_height.max(r.height))?;
        Ok(Self {
            target: value.hash(),
            target_type: value.type_of()?,
            height: max_height + 1,
        })
    }

    pub fn target_hash(&self) -> Hash {
        self.target
    }

    pub fn target_type(&self) -> &Type {
        &self.target_type
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Load the target through `link`.
    pub fn target_value(&self, link: &ResolverLink) -> ValueResult<Value> {
        link.read_value(&self.target)
    }

    /// Tag, target hash, target type descriptor, height.
    pub fn write_to(&self, w: &mut ValueWriter) {
        w.write_kind(Kind::Ref);
        w.write_hash(&self.target);
        self.target_type.write_to(w);
        w.write_count(self.height);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arbor_store::{Chunk, ChunkStore, MemoryChunkStore};

    use super::*;
    use crate::structs::Struct;

    #[test]
    fn from_value_derives_hash_type_height() {
        let v = Value::from("leaf");
        let r = Ref::from_value(&v).unwrap();
        assert_eq!(r.target_hash(), v.hash());
        assert_eq!(r.target_type(), &Type::string());
        assert_eq!(r.height(), 1);
    }

    #[test]
    fn height_grows_with_nesting() {
        let r1 = Ref::from_value(&Value::Number(1.0)).unwrap();
        let s = Struct::new("Box", [("inner", Value::Ref(r1))]).unwrap();
        let r2 = Ref::from_value(&Value::Struct(s)).unwrap();
        assert_eq!(r2.height(), 2);
        assert_eq!(
            Value::Ref(r2.clone()).type_of().unwrap(),
            Type::ref_of(r2.target_type().clone())
        );
    }

    #[test]
    fn encoding_layout() {
        let r = Ref::new(Hash::of(b"t"), Type::number(), 3);
        let mut w = ValueWriter::new();
        r.write_to(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes[0], Kind::Ref.tag());
        assert_eq!(&bytes[1..33], Hash::of(b"t").as_bytes());
        assert_eq!(bytes[33], Kind::Number.tag());
        assert_eq!(bytes[34], 3);
        assert_eq!(bytes.len(), 35);
    }

    #[test]
    fn target_value_resolves_through_link() {
        let store = Arc::new(MemoryChunkStore::new());
        let v = Value::from("payload");
        store.put(Chunk::new(v.encode())).unwrap();
        let r = Ref::from_value(&v).unwrap();
        assert_eq!(r.target_value(&ResolverLink::new(&store)).unwrap(), v);
    }
}
