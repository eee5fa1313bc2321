//! Flat list leaves decoded on demand.
//!
//! The first scan skips every element once and records its offset. Each
//! random access then opens its own cursor at the recorded offset, so a leaf
//! can be read from any number of threads without locking.

use bytes::Bytes;

use crate::decoder::ValueDecoder;
use crate::error::{ValueError, ValueResult};
use crate::resolver::ResolverLink;
use crate::types::Type;
use crate::value::Value;
use crate::writer::ValueWriter;

/// A leaf of list elements kept in encoded form.
#[derive(Clone, Debug)]
pub struct ListLeafSequence {
    /// Encoded elements, back to back.
    data: Bytes,
    /// Start of each element within `data`.
    offsets: Vec<usize>,
    link: ResolverLink,
}

impl ListLeafSequence {
    /// Scan a leaf body (element count, then elements) at the decoder's
    /// cursor, leaving the cursor after the last element.
    pub(crate) fn read(dec: &mut ValueDecoder) -> ValueResult<Self> {
        let count = dec.reader_mut().read_count()?;
        let start = dec.pos();
        let (offsets, end) = dec.read_lazy_offsets(count)?;
        Ok(Self {
            data: dec.reader().slice(start, end),
            offsets: offsets.into_iter().map(|o| o - start).collect(),
            link: dec.link().clone(),
        })
    }

    /// Encode `values` into a leaf. The leaf resolves through the first live
    /// link among them.
    pub fn from_values(values: &[Value]) -> Self {
        let mut w = ValueWriter::new();
        let mut offsets = Vec::with_capacity(values.len());
        for v in values {
            offsets.push(w.len());
            v.write_to(&mut w);
        }
        Self {
            data: w.into_bytes(),
            offsets,
            link: ResolverLink::first_attached(values),
        }
    }

    pub fn link(&self) -> &ResolverLink {
        &self.link
    }

    pub fn len(&self) -> u64 {
        self.offsets.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Decode the element at `idx`.
    pub fn get(&self, idx: u64) -> ValueResult<Value> {
        let offset = usize::try_from(idx)
            .ok()
            .and_then(|i| self.offsets.get(i))
            .ok_or(ValueError::IndexOutOfBounds {
                index: idx,
                len: self.len(),
            })?;
        let mut dec = ValueDecoder::new(self.data.clone(), self.link.clone());
        dec.set_pos(*offset);
        dec.read_value()
    }

    /// Decode every element in order.
    pub fn values(&self) -> ValueResult<Vec<Value>> {
        let mut dec = ValueDecoder::new(self.data.clone(), self.link.clone());
        self.offsets.iter().map(|_| dec.read_value()).collect()
    }

    /// Union of the element types. Decodes every element.
    pub fn element_type(&self) -> ValueResult<Type> {
        let types = self
            .values()?
            .iter()
            .map(Value::type_of)
            .collect::<ValueResult<Vec<_>>>()?;
        Ok(Type::union_of(types))
    }

    /// Count followed by the encoded elements.
    pub fn write_body(&self, w: &mut ValueWriter) {
        w.write_count(self.len());
        w.write_raw(&self.data);
    }
}
