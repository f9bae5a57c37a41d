//! Trailing entries appended to compressed text records.
//!
//! The MOBI header's extra record data flags announce entries stored after the
//! compressed text. Flags 1 to 15 each add an entry whose total size (size
//! field included) is a backward variable-width integer at the entry's end;
//! they are stripped from the highest flag down. Flag 0 adds multibyte
//! overlap bytes whose count lives in the low two bits of the final byte.
//!
//! Only the framing is handled here; the text itself stays compressed.

use log::trace;

use crate::mobi::codec::varint::{self, Direction};
use crate::mobi::types::error::{MobiError, Result};

/// Total size of the trailing entries at the end of `record`.
pub fn trailing_entries_size(record: &[u8], extra_flags: u32) -> Result<usize> {
    let mut end = record.len();

    for bit in (1..16).rev() {
        if extra_flags & (1 << bit) == 0 {
            continue;
        }
        let (size, _) = varint::decode(&record[..end], Direction::Backward)?;
        let size = size as usize;
        if size > end {
            return Err(MobiError::TruncatedInput {
                context: "trailing entry",
                offset: end,
                needed: size,
                available: end,
            });
        }
        trace!("trailing entry for flag {}: {} bytes", bit, size);
        end -= size;
    }

    if extra_flags & 1 != 0 {
        let last = *record[..end].last().ok_or(MobiError::TruncatedInput {
            context: "multibyte trailing entry",
            offset: 0,
            needed: 1,
            available: 0,
        })?;
        let size = (last & 0x3) as usize + 1;
        if size > end {
            return Err(MobiError::TruncatedInput {
                context: "multibyte trailing entry",
                offset: end,
                needed: size,
                available: end,
            });
        }
        end -= size;
    }

    Ok(record.len() - end)
}

/// The record with its trailing entries removed.
pub fn strip_trailing_entries(record: &[u8], extra_flags: u32) -> Result<&[u8]> {
    let trailing = trailing_entries_size(record, extra_flags)?;
    Ok(&record[..record.len() - trailing])
}
