//! Append-only encoder for the primitive wire forms.

use arbor_types::{Hash, Kind};
use bytes::Bytes;

/// Append-only writer producing canonical encodings.
#[derive(Debug, Default)]
pub struct ValueWriter {
    buf: Vec<u8>,
}

impl ValueWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_kind(&mut self, kind: Kind) {
        self.buf.push(kind.tag());
    }

    /// Write an unsigned LEB128 varint.
    pub fn write_count(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value > 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    pub fn write_bool(&mut self, b: bool) {
        self.buf.push(b as u8);
    }

    /// IEEE-754 bits, big-endian.
    pub fn write_number(&mut self, n: f64) {
        self.buf.extend_from_slice(&n.to_bits().to_be_bytes());
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Length-prefixed byte span.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.write_count(data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    pub fn write_hash(&mut self, hash: &Hash) {
        self.buf.extend_from_slice(hash.as_bytes());
    }

    /// Append already-encoded bytes verbatim.
    pub fn write_raw(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_encoding_is_leb128() {
        let mut w = ValueWriter::new();
        w.write_count(300);
        assert_eq!(w.into_bytes().as_ref(), &[0xAC, 0x02]);
    }

    #[test]
    fn zero_count_is_one_byte() {
        let mut w = ValueWriter::new();
        w.write_count(0);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut w = ValueWriter::new();
        w.write_string("ab");
        assert_eq!(w.into_bytes().as_ref(), &[2, b'a', b'b']);
    }

    #[test]
    fn number_is_big_endian_bits() {
        let mut w = ValueWriter::new();
        w.write_number(1.0);
        assert_eq!(w.into_bytes().as_ref(), &1.0f64.to_bits().to_be_bytes());
    }
}
