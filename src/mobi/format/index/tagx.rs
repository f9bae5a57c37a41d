//! TAGX: the self-describing tag table of an index.
//!
//! ```text
//! [4 bytes] "TAGX"
//! [4 bytes] header length (includes these 12 bytes)
//! [4 bytes] control byte count
//! [4 bytes] * N  tag, values per entry, bitmask, end-of-control-byte flag
//! ```

use log::{debug, trace};

use crate::mobi::cursor::ByteCursor;
use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::{Magic, TagDescriptor, TagTable};

const FIXED_LENGTH: u32 = 12;

/// Decode a TAGX table starting at the cursor position.
pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<TagTable> {
    cursor.expect_magic(Magic::TAGX, "TAGX")?;

    let header_length = cursor.read_u32("TAGX header length")?;
    if header_length < FIXED_LENGTH {
        return Err(MobiError::HeaderTooShort { length: header_length });
    }
    let control_byte_count = cursor.read_u32("TAGX control byte count")?;

    let tag_count = ((header_length - FIXED_LENGTH) / 4) as usize;
    let mut descriptors = Vec::with_capacity(tag_count);
    for _ in 0..tag_count {
        let row = cursor.read_exact(4, "TAGX descriptor")?;
        let descriptor = TagDescriptor {
            tag: row[0],
            values_per_entry: row[1],
            bitmask: row[2],
            end_of_control_byte: row[3] == 0x01,
        };
        trace!("TAGX row: {:?}", descriptor);
        descriptors.push(descriptor);
    }

    debug!(
        "TAGX parsed: {} descriptors, {} control bytes",
        descriptors.len(),
        control_byte_count
    );

    Ok(TagTable {
        control_byte_count,
        descriptors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagx_bytes(control_byte_count: u32, rows: &[[u8; 4]]) -> Vec<u8> {
        let mut out = b"TAGX".to_vec();
        out.extend_from_slice(&(12 + 4 * rows.len() as u32).to_be_bytes());
        out.extend_from_slice(&control_byte_count.to_be_bytes());
        for row in rows {
            out.extend_from_slice(row);
        }
        out
    }

    #[test]
    fn parses_rows_in_order() {
        let bytes = tagx_bytes(1, &[[1, 1, 0x01, 0], [2, 1, 0x02, 0], [0, 0, 0, 1]]);
        let mut cursor = ByteCursor::new(&bytes);
        let table = parse(&mut cursor).unwrap();
        assert_eq!(table.control_byte_count, 1);
        assert_eq!(table.descriptors.len(), 3);
        assert_eq!(table.descriptors[1].bitmask, 0x02);
        assert!(table.descriptors[2].end_of_control_byte);
        assert!(!table.descriptors[0].end_of_control_byte);
        assert_eq!(cursor.position(), bytes.len());
    }

    #[test]
    fn empty_table_is_valid() {
        let bytes = tagx_bytes(0, &[]);
        let table = parse(&mut ByteCursor::new(&bytes)).unwrap();
        assert!(table.descriptors.is_empty());
    }

    #[test]
    fn short_header_rejected() {
        let mut bytes = b"TAGX".to_vec();
        bytes.extend_from_slice(&8u32.to_be_bytes());
        bytes.extend_from_slice(&1u32.to_be_bytes());
        assert!(matches!(
            parse(&mut ByteCursor::new(&bytes)),
            Err(MobiError::HeaderTooShort { length: 8 })
        ));
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut bytes = tagx_bytes(1, &[[1, 1, 1, 0]]);
        bytes[0] = b'X';
        assert!(matches!(
            parse(&mut ByteCursor::new(&bytes)),
            Err(MobiError::MagicMismatch { expected: Magic::TAGX, .. })
        ));
    }

    #[test]
    fn truncated_rows_rejected() {
        let mut bytes = tagx_bytes(1, &[[1, 1, 1, 0], [2, 1, 2, 0]]);
        bytes.truncate(bytes.len() - 2);
        assert!(matches!(
            parse(&mut ByteCursor::new(&bytes)),
            Err(MobiError::TruncatedInput { .. })
        ));
    }
}
