//! X11 reply parser
//!
//! [`WireReader`] is a forward-only cursor over a received buffer. Every decode
//! level (setup payload, reply headers, string lists, Xauthority records) reads
//! through it, so bounds checking lives in one place: a read that would run past
//! the end of the buffer fails with [`DecodeError::Truncated`] and leaves the
//! cursor where it was.

use super::errors::DecodeError;
use super::types::ByteOrder;
use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};

/// Bounded forward cursor over an immutable byte slice
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    byte_order: ByteOrder,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8], byte_order: ByteOrder) -> Self {
        WireReader {
            buf,
            pos: 0,
            byte_order,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take the next `n` bytes, advancing the cursor
    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.u8()? != 0)
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(match self.byte_order {
            ByteOrder::LSBFirst => LittleEndian::read_u16(bytes),
            ByteOrder::MSBFirst => BigEndian::read_u16(bytes),
        })
    }

    pub fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(match self.byte_order {
            ByteOrder::LSBFirst => LittleEndian::read_u32(bytes),
            ByteOrder::MSBFirst => BigEndian::read_u32(bytes),
        })
    }

    /// Borrow the next `n` raw bytes
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.take(n)
    }

    /// Skip `n` bytes of padding or unused fields
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    /// Read a string prefixed by a one-byte length (STR in the protocol)
    pub fn pascal_string(&mut self) -> Result<String, DecodeError> {
        let len = self.u8()? as usize;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a byte string prefixed by a u16 length
    pub fn counted_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.u16()? as usize;
        self.take(len)
    }

    /// Decode `count` consecutive items with `item`
    ///
    /// The count always comes from an enclosing structure; it is never
    /// derived from the space left in the buffer.
    pub fn list<T, F>(&mut self, count: usize, mut item: F) -> Result<Vec<T>, DecodeError>
    where
        F: FnMut(&mut Self) -> Result<T, DecodeError>,
    {
        // Every item is at least one byte wide
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(item(self)?);
        }
        Ok(items)
    }
}
