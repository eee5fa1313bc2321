//! Value decoder: dispatch on the kind tag to the matching reader.
//!
//! Every `read_*` has a mirrored `skip_*` that advances the cursor without
//! building values, which is what struct field scans and lazy list offset
//! recording rely on.
//!
//! A decoder owns one cursor over one immutable buffer and is not meant to be
//! shared between threads; hold any external lock for the decoder's whole
//! usage window. Buffers themselves are shared cheaply, so independent
//! readers should each open their own decoder instead.

use arbor_types::Kind;
use bytes::Bytes;
use tracing::debug;

use crate::collections::{Blob, List, Map, Set};
use crate::config::{CodecConfig, DEFAULT_MAX_DEPTH};
use crate::error::{ValueError, ValueResult};
use crate::list_leaf::ListLeafSequence;
use crate::meta::{MetaSequence, MetaTuple};
use crate::reader::ValueReader;
use crate::reference::Ref;
use crate::resolver::ResolverLink;
use crate::structs::Struct;
use crate::value::Value;
use crate::writer::ValueWriter;

/// Decoder over canonical value bytes.
#[derive(Debug)]
pub struct ValueDecoder {
    pub(crate) reader: ValueReader,
    pub(crate) link: ResolverLink,
    pub(crate) validating: bool,
    depth: usize,
    max_depth: usize,
}

impl ValueDecoder {
    pub fn new(buff: Bytes, link: ResolverLink) -> Self {
        Self {
            reader: ValueReader::new(buff),
            link,
            validating: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A decoder that checks every type descriptor and struct field order it
    /// encounters, including on skip paths.
    pub fn with_validation(buff: Bytes, link: ResolverLink) -> Self {
        debug!(len = buff.len(), "validating decoder created");
        Self {
            validating: true,
            ..Self::new(buff, link)
        }
    }

    pub fn with_config(buff: Bytes, link: ResolverLink, config: &CodecConfig) -> Self {
        let dec = if config.validate_types {
            Self::with_validation(buff, link)
        } else {
            Self::new(buff, link)
        };
        Self {
            max_depth: config.max_depth,
            ..dec
        }
    }

    pub fn is_validating(&self) -> bool {
        self.validating
    }

    pub fn link(&self) -> &ResolverLink {
        &self.link
    }

    pub fn reader(&self) -> &ValueReader {
        &self.reader
    }

    pub fn reader_mut(&mut self) -> &mut ValueReader {
        &mut self.reader
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.reader.set_pos(pos);
    }

    /// Run `f` one nesting level deeper, failing once the limit is reached.
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ValueResult<T>,
    ) -> ValueResult<T> {
        if self.depth >= self.max_depth {
            return Err(ValueError::NestingTooDeep {
                offset: self.reader.pos(),
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // -----------------------------------------------------------------------
    // Values
    // -----------------------------------------------------------------------

    /// Decode the next value.
    pub fn read_value(&mut self) -> ValueResult<Value> {
        self.nested(Self::read_value_inner)
    }

    fn read_value_inner(&mut self) -> ValueResult<Value> {
        let offset = self.reader.pos();
        let kind = self.reader.read_kind()?;
        match kind {
            Kind::Bool => Ok(Value::Bool(self.reader.read_bool()?)),
            Kind::Number => Ok(Value::Number(self.reader.read_number()?)),
            Kind::String => Ok(Value::String(self.reader.read_string()?)),
            Kind::Blob => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    return Ok(Value::Blob(Blob::from_meta(
                        self.read_meta_sequence(kind, level)?,
                    )));
                }
                Ok(Value::Blob(Blob::from_leaf(self.reader.read_bytes()?)))
            }
            Kind::List => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    return Ok(Value::List(List::from_meta(
                        self.read_meta_sequence(kind, level)?,
                    )));
                }
                Ok(Value::List(List::from_leaf(ListLeafSequence::read(self)?)))
            }
            Kind::Map => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    return Ok(Value::Map(Map::from_meta(
                        self.read_meta_sequence(kind, level)?,
                    )));
                }
                Ok(Value::Map(Map::from_leaf(self.read_map_leaf()?)))
            }
            Kind::Set => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    return Ok(Value::Set(Set::from_meta(
                        self.read_meta_sequence(kind, level)?,
                    )));
                }
                Ok(Value::Set(Set::from_leaf(self.read_value_sequence()?)))
            }
            Kind::Ref => Ok(Value::Ref(self.read_ref_body()?)),
            Kind::Struct => {
                self.skip_struct_body()?;
                let buff = self.reader.slice(offset, self.reader.pos());
                Ok(Value::Struct(Struct::from_encoded(buff, self.link.clone())?))
            }
            Kind::Type => Ok(Value::Type(self.read_type()?)),
            Kind::Cycle | Kind::Union | Kind::Value => {
                Err(ValueError::UnexpectedKind { kind, offset })
            }
        }
    }

    /// Advance past the next value without building it.
    pub fn skip_value(&mut self) -> ValueResult<()> {
        self.nested(Self::skip_value_inner)
    }

    fn skip_value_inner(&mut self) -> ValueResult<()> {
        let offset = self.reader.pos();
        let kind = self.reader.read_kind()?;
        match kind {
            Kind::Bool => self.reader.read_bool().map(|_| ()),
            Kind::Number => self.reader.skip_number(),
            Kind::String => self.reader.skip_string(),
            Kind::Blob | Kind::List | Kind::Map | Kind::Set => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    return self.skip_meta_sequence();
                }
                match kind {
                    Kind::Blob => self.reader.skip_bytes(),
                    Kind::Map => self.skip_map_leaf(),
                    _ => self.skip_value_sequence(),
                }
            }
            Kind::Ref => self.skip_ref_body(),
            Kind::Struct => self.skip_struct_body(),
            Kind::Type => self.skip_type(),
            Kind::Cycle | Kind::Union | Kind::Value => {
                Err(ValueError::UnexpectedKind { kind, offset })
            }
        }
    }

    /// Copy the next value's bytes verbatim into `w` without re-encoding.
    pub fn copy_value(&mut self, w: &mut ValueWriter) -> ValueResult<()> {
        let start = self.reader.pos();
        self.skip_value()?;
        w.write_raw(&self.reader.buffer()[start..self.reader.pos()]);
        Ok(())
    }

    /// Walk the next value, reporting every embedded ref to `cb` and leaving
    /// the cursor after the value. Meta sequence child refs are reported
    /// like any other ref.
    pub fn walk_refs(&mut self, cb: &mut dyn FnMut(&Ref)) -> ValueResult<()> {
        self.nested(|dec| dec.walk_refs_inner(cb))
    }

    fn walk_refs_inner(&mut self, cb: &mut dyn FnMut(&Ref)) -> ValueResult<()> {
        let offset = self.reader.pos();
        let kind = self.reader.read_kind()?;
        match kind {
            Kind::Ref => {
                let r = self.read_ref_body()?;
                cb(&r);
                Ok(())
            }
            Kind::Struct => {
                self.reader.skip_string()?;
                let count = self.reader.read_count()?;
                for _ in 0..count {
                    self.reader.skip_string()?;
                    self.walk_refs(cb)?;
                }
                Ok(())
            }
            Kind::Blob | Kind::List | Kind::Map | Kind::Set => {
                let level = self.reader.read_count()?;
                if level > 0 {
                    let count = self.reader.read_count()?;
                    for _ in 0..count {
                        self.walk_refs(cb)?;
                        self.walk_refs(cb)?;
                        self.reader.read_count()?;
                    }
                    return Ok(());
                }
                if kind == Kind::Blob {
                    return self.reader.skip_bytes();
                }
                let count = self.reader.read_count()?;
                let per_entry = if kind == Kind::Map { 2 } else { 1 };
                for _ in 0..count.saturating_mul(per_entry) {
                    self.walk_refs(cb)?;
                }
                Ok(())
            }
            Kind::Bool | Kind::Number | Kind::String | Kind::Type => {
                self.reader.set_pos(offset);
                self.skip_value_inner()
            }
            Kind::Cycle | Kind::Union | Kind::Value => {
                Err(ValueError::UnexpectedKind { kind, offset })
            }
        }
    }

    /// Decode the next value, which must be a struct.
    pub fn read_struct(&mut self) -> ValueResult<Struct> {
        let offset = self.reader.pos();
        match self.read_value()? {
            Value::Struct(s) => Ok(s),
            other => {
                self.reader.set_pos(offset);
                Err(ValueError::UnexpectedValueKind {
                    expected: Kind::Struct,
                    actual: other.kind(),
                })
            }
        }
    }

    /// Struct payload after the tag: name, field count, then name-sorted
    /// `(field name, value)` pairs. Field order is trusted unless validating.
    fn skip_struct_body(&mut self) -> ValueResult<()> {
        self.reader.skip_string()?;
        let count = self.reader.read_count()?;
        let mut previous: Option<String> = None;
        for _ in 0..count {
            if self.validating {
                let name = self.reader.read_string()?;
                if let Some(prev) = previous.take() {
                    if prev >= name {
                        return Err(ValueError::UnsortedFields {
                            previous: prev,
                            next: name,
                        });
                    }
                }
                previous = Some(name);
            } else {
                self.reader.skip_string()?;
            }
            self.skip_value()?;
        }
        Ok(())
    }

    /// Ref payload after the tag: target hash, target type, height.
    fn read_ref_body(&mut self) -> ValueResult<Ref> {
        let target = self.reader.read_hash()?;
        let target_type = self.read_type()?;
        let height = self.reader.read_count()?;
        Ok(Ref::new(target, target_type, height))
    }

    fn skip_ref_body(&mut self) -> ValueResult<()> {
        self.reader.skip_hash()?;
        self.skip_type()?;
        self.reader.read_count().map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Leaf sequences
    // -----------------------------------------------------------------------

    fn read_value_sequence(&mut self) -> ValueResult<Vec<Value>> {
        let count = self.reader.read_count()?;
        let mut data = Vec::new();
        for _ in 0..count {
            data.push(self.read_value()?);
        }
        Ok(data)
    }

    fn skip_value_sequence(&mut self) -> ValueResult<()> {
        let count = self.reader.read_count()?;
        for _ in 0..count {
            self.skip_value()?;
        }
        Ok(())
    }

    fn read_map_leaf(&mut self) -> ValueResult<Vec<(Value, Value)>> {
        let count = self.reader.read_count()?;
        let mut entries = Vec::new();
        for _ in 0..count {
            let k = self.read_value()?;
            let v = self.read_value()?;
            entries.push((k, v));
        }
        Ok(entries)
    }

    fn skip_map_leaf(&mut self) -> ValueResult<()> {
        let count = self.reader.read_count()?;
        for _ in 0..count {
            self.skip_value()?;
            self.skip_value()?;
        }
        Ok(())
    }

    /// Record the offset of each of the next `count` values by skipping
    /// them. Returns the offsets and the end offset.
    pub(crate) fn read_lazy_offsets(&mut self, count: u64) -> ValueResult<(Vec<usize>, usize)> {
        let mut offsets = Vec::new();
        for _ in 0..count {
            offsets.push(self.reader.pos());
            self.skip_value()?;
        }
        Ok((offsets, self.reader.pos()))
    }

    // -----------------------------------------------------------------------
    // Meta sequences
    // -----------------------------------------------------------------------

    /// Interior node payload: tuple count, then per tuple a ref to the child
    /// chunk, the boundary key value, and the leaf count under the child.
    fn read_meta_sequence(&mut self, kind: Kind, level: u64) -> ValueResult<MetaSequence> {
        let count = self.reader.read_count()?;
        let mut tuples = Vec::new();
        for _ in 0..count {
            let child = match self.read_value()? {
                Value::Ref(r) => r,
                other => {
                    return Err(ValueError::UnexpectedValueKind {
                        expected: Kind::Ref,
                        actual: other.kind(),
                    })
                }
            };
            let boundary = self.read_value()?;
            let num_leaves = self.reader.read_count()?;
            tuples.push(MetaTuple::new(child, boundary, num_leaves));
        }
        Ok(MetaSequence::new(kind, level, tuples, self.link.clone()))
    }

    fn skip_meta_sequence(&mut self) -> ValueResult<()> {
        let count = self.reader.read_count()?;
        for _ in 0..count {
            self.skip_value()?; // child ref
            self.skip_value()?; // boundary key
            self.reader.read_count()?; // leaf count
        }
        Ok(())
    }
}
