//! Bounds-checked cursor over the bytes of a single record.
//!
//! Every position is an absolute offset from the start of the record, so a
//! decoder that needs a sub-structure always seeks to `record start + offset`
//! instead of advancing relative to wherever the previous step left off.

use byteorder::{BigEndian, ByteOrder};

use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::Magic;

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current absolute position.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to an absolute offset. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, offset: usize, context: &'static str) -> Result<()> {
        if offset > self.data.len() {
            return Err(MobiError::TruncatedInput {
                context,
                offset,
                needed: offset,
                available: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Return the next `n` bytes without advancing.
    pub fn peek(&self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(MobiError::TruncatedInput {
                context,
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    pub fn read_exact(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        let bytes = self.peek(n, context)?;
        self.pos += n;
        Ok(bytes)
    }

    /// Advance by up to `n` bytes, stopping at the end of the data.
    pub fn skip_padding(&mut self, n: usize) {
        self.pos += n.min(self.remaining());
    }

    pub fn read_u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.read_exact(1, context)?[0])
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16> {
        Ok(BigEndian::read_u16(self.read_exact(2, context)?))
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read_exact(4, context)?))
    }

    /// True if the next four bytes equal `magic`. Never advances.
    pub fn at_magic(&self, magic: Magic) -> bool {
        matches!(self.peek(4, "magic"), Ok(bytes) if bytes == magic.as_bytes())
    }

    /// Consume `magic` or fail with [`MobiError::MagicMismatch`] without advancing.
    pub fn expect_magic(&mut self, magic: Magic, context: &'static str) -> Result<()> {
        let found = &self.data[self.pos..(self.pos + 4).min(self.data.len())];
        if found != magic.as_bytes() {
            return Err(MobiError::MagicMismatch {
                context,
                expected: magic,
                found: found.to_vec(),
                offset: self.pos,
            });
        }
        self.pos += 4;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0xFF];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u16("a").unwrap(), 1);
        assert_eq!(c.read_u32("b").unwrap(), 256);
        assert_eq!(c.read_u8("c").unwrap(), 0xFF);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn peek_does_not_advance() {
        let data = *b"TAGX....";
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.peek(4, "peek").unwrap(), b"TAGX");
        assert!(c.at_magic(Magic::TAGX));
        assert_eq!(c.position(), 0);
        c.expect_magic(Magic::TAGX, "tagx").unwrap();
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn magic_mismatch_reports_offset() {
        let data = *b"xxIDXU";
        let mut c = ByteCursor::new(&data);
        c.seek(2, "seek").unwrap();
        match c.expect_magic(Magic::IDXT, "offset table") {
            Err(MobiError::MagicMismatch { offset, found, .. }) => {
                assert_eq!(offset, 2);
                assert_eq!(found, b"IDXU".to_vec());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.position(), 2);
    }

    #[test]
    fn truncation_and_seek_bounds() {
        let data = [1u8, 2, 3];
        let mut c = ByteCursor::new(&data);
        assert!(matches!(
            c.read_u32("field"),
            Err(MobiError::TruncatedInput { needed: 4, available: 3, .. })
        ));
        assert!(c.seek(3, "end").is_ok());
        assert!(c.seek(4, "past end").is_err());
        c.seek(2, "back").unwrap();
        c.skip_padding(2);
        assert_eq!(c.position(), 3);
    }
}
