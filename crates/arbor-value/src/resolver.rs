//! Non-owning links from decoded values back to their resolver.

use std::sync::{Arc, Weak};

use arbor_store::ValueResolver;
use arbor_types::Hash;
use tracing::debug;

use crate::decoder::ValueDecoder;
use crate::error::{ValueError, ValueResult};
use crate::value::Value;

/// Non-owning association between a decoded value and the resolver it was
/// read from.
///
/// Values never keep their store alive. Resolving through a link whose store
/// has been dropped, or through a detached link, fails with
/// [`ValueError::MissingResolver`].
#[derive(Clone, Default)]
pub struct ResolverLink(Option<Weak<dyn ValueResolver>>);

impl ResolverLink {
    /// A link to nothing. Values built in memory start out detached.
    pub fn detached() -> Self {
        Self(None)
    }

    pub fn new<R: ValueResolver + 'static>(resolver: &Arc<R>) -> Self {
        let weak: Weak<R> = Arc::downgrade(resolver);
        Self(Some(weak))
    }

    /// The first live link carried by any of `values`, or a detached link.
    pub fn first_attached<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .find_map(Value::link)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns `true` if the link points at a resolver that is still alive.
    pub fn is_attached(&self) -> bool {
        self.0.as_ref().is_some_and(|w| w.strong_count() > 0)
    }

    pub fn upgrade(&self) -> ValueResult<Arc<dyn ValueResolver>> {
        self.0
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(ValueError::MissingResolver)
    }

    /// Fetch and decode the value stored under `hash`. The decoded value
    /// carries this link onward.
    pub fn read_value(&self, hash: &Hash) -> ValueResult<Value> {
        let resolver = self.upgrade()?;
        debug!(hash = %hash.short_hex(), "resolving chunk");
        let data = resolver
            .read_chunk(hash)?
            .ok_or(ValueError::ChunkNotFound(*hash))?;
        ValueDecoder::new(data, self.clone()).read_value()
    }
}

impl std::fmt::Debug for ResolverLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResolverLink")
            .field(&if self.is_attached() { "attached" } else { "detached" })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_store::{Chunk, ChunkStore, MemoryChunkStore};

    #[test]
    fn detached_link_cannot_resolve() {
        let link = ResolverLink::detached();
        assert!(!link.is_attached());
        assert!(matches!(
            link.read_value(&Hash::of(b"x")),
            Err(ValueError::MissingResolver)
        ));
    }

    #[test]
    fn link_does_not_keep_store_alive() {
        let store = Arc::new(MemoryChunkStore::new());
        let link = ResolverLink::new(&store);
        assert!(link.is_attached());
        drop(store);
        assert!(!link.is_attached());
        assert!(matches!(link.upgrade(), Err(ValueError::MissingResolver)));
    }

    #[test]
    fn read_value_decodes_chunk() {
        let store = Arc::new(MemoryChunkStore::new());
        let encoded = Value::String("hi".into()).encode();
        let hash = store.put(Chunk::new(encoded)).unwrap();
        let link = ResolverLink::new(&store);
        let value = link.read_value(&hash).unwrap();
        assert_eq!(value, Value::String("hi".into()));
    }

    #[test]
    fn missing_chunk_is_reported() {
        let store = Arc::new(MemoryChunkStore::new());
        let link = ResolverLink::new(&store);
        let h = Hash::of(b"absent");
        assert!(matches!(link.read_value(&h), Err(ValueError::ChunkNotFound(x)) if x == h));
    }
}
