//! Primitive cursor over an immutable byte span.
//!
//! Every read is bounds-checked and returns a [`ValueError`] instead of
//! panicking. `skip_*` variants advance the cursor without allocating.

use arbor_types::{Hash, Kind, HASH_LEN};
use bytes::Bytes;

use crate::error::{ValueError, ValueResult};
use crate::writer::ValueWriter;

/// A cursor over shared, immutable encoded bytes.
///
/// Cloning the underlying [`Bytes`] is cheap, so callers that need random
/// access open a fresh reader per access instead of sharing one cursor.
#[derive(Clone, Debug)]
pub struct ValueReader {
    buff: Bytes,
    pos: usize,
}

impl ValueReader {
    pub fn new(buff: Bytes) -> Self {
        Self { buff, pos: 0 }
    }

    /// Current cursor offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.buff.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn buffer(&self) -> &Bytes {
        &self.buff
    }

    /// Zero-copy view of `start..end` of the underlying buffer.
    pub fn slice(&self, start: usize, end: usize) -> Bytes {
        self.buff.slice(start..end)
    }

    fn take(&mut self, n: usize) -> ValueResult<&[u8]> {
        let available = self.remaining();
        if n > available {
            return Err(ValueError::Truncated {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buff[start..start + n])
    }

    fn advance(&mut self, n: usize) -> ValueResult<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> ValueResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a kind tag. Unknown tags are malformed input.
    pub fn read_kind(&mut self) -> ValueResult<Kind> {
        let offset = self.pos;
        let tag = self.read_u8()?;
        Kind::from_tag(tag).map_err(|_| ValueError::UnknownKind { tag, offset })
    }

    pub fn skip_kind(&mut self) -> ValueResult<()> {
        self.advance(1)
    }

    /// Read an unsigned LEB128 varint. The tenth byte may only carry the
    /// top bit of a `u64`.
    pub fn read_count(&mut self) -> ValueResult<u64> {
        let offset = self.pos;
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(ValueError::VarintOverflow { offset });
            }
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(ValueError::VarintOverflow { offset });
            }
        }
    }

    pub fn read_bool(&mut self) -> ValueResult<bool> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(ValueError::InvalidBool { offset, byte }),
        }
    }

    pub fn read_number(&mut self) -> ValueResult<f64> {
        let mut bits = [0u8; 8];
        bits.copy_from_slice(self.take(8)?);
        Ok(f64::from_bits(u64::from_be_bytes(bits)))
    }

    pub fn skip_number(&mut self) -> ValueResult<()> {
        self.advance(8)
    }

    fn read_len(&mut self) -> ValueResult<usize> {
        let offset = self.pos;
        let len = self.read_count()?;
        usize::try_from(len).map_err(|_| ValueError::Truncated {
            offset,
            needed: usize::MAX,
            available: self.remaining(),
        })
    }

    pub fn read_string(&mut self) -> ValueResult<String> {
        let len = self.read_len()?;
        let offset = self.pos;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| ValueError::InvalidUtf8 { offset })
    }

    pub fn skip_string(&mut self) -> ValueResult<()> {
        let len = self.read_len()?;
        self.advance(len)
    }

    /// Copy a length-prefixed string verbatim into `w`.
    pub fn copy_string(&mut self, w: &mut ValueWriter) -> ValueResult<()> {
        let start = self.pos;
        self.skip_string()?;
        w.write_raw(&self.buff[start..self.pos]);
        Ok(())
    }

    /// Read a length-prefixed byte span without copying.
    pub fn read_bytes(&mut self) -> ValueResult<Bytes> {
        let len = self.read_len()?;
        let start = self.pos;
        self.advance(len)?;
        Ok(self.buff.slice(start..start + len))
    }

    pub fn skip_bytes(&mut self) -> ValueResult<()> {
        let len = self.read_len()?;
        self.advance(len)
    }

    pub fn read_hash(&mut self) -> ValueResult<Hash> {
        let mut digest = [0u8; HASH_LEN];
        digest.copy_from_slice(self.take(HASH_LEN)?);
        Ok(Hash::from_digest(digest))
    }

    pub fn skip_hash(&mut self) -> ValueResult<()> {
        self.advance(HASH_LEN)
    }
}
