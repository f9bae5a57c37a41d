//! Control-byte tag resolution for a single index entry.
//!
//! An entry (after its label) is laid out as:
//!
//! ```text
//! [control byte count bytes] control bytes
//! [varint ...]               length prefixes, in TAGX order, for variable-width tags
//! [varint ...]               tag values, in TAGX order
//! ```
//!
//! Each TAGX row selects some bits of the current control byte with its bitmask.
//! No bits set means the tag is absent. All bits set in a multi-bit mask means
//! the value count is unknown and a length prefix gives the number of payload
//! bytes holding the tag's values instead. Anything else is a direct value
//! count, shifted down to the mask's lowest bit.

use log::trace;

use crate::mobi::codec::varint::{self, Direction};
use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::{
    FieldSize, IndexEntry, ResolvedField, TagDescriptor, TagTable,
};

/// Decode one entry's bytes (label already stripped) into `(tag, value)` pairs.
pub fn parse(entry: &[u8], table: &TagTable) -> Result<Vec<IndexEntry>> {
    let control_byte_count = table.control_byte_count as usize;
    if entry.len() < control_byte_count {
        return Err(MobiError::TruncatedInput {
            context: "entry control bytes",
            offset: 0,
            needed: control_byte_count,
            available: entry.len(),
        });
    }
    let (control_bytes, mut payload) = entry.split_at(control_byte_count);

    let fields = resolve_fields(control_bytes, &mut payload, &table.descriptors)?;
    decode_values(&fields, payload)
}

/// Walk the TAGX rows against the control bytes, reading any length prefixes from `payload`.
pub fn resolve_fields(
    control_bytes: &[u8],
    payload: &mut &[u8],
    descriptors: &[TagDescriptor],
) -> Result<Vec<ResolvedField>> {
    let mut control = control_bytes;
    let mut fields = Vec::new();

    for descriptor in descriptors {
        let Some((&control_byte, rest)) = control.split_first() else {
            return Err(MobiError::TruncatedInput {
                context: "entry control bytes",
                offset: control_bytes.len(),
                needed: 1,
                available: 0,
            });
        };

        if descriptor.end_of_control_byte {
            control = rest;
            continue;
        }

        let masked = control_byte & descriptor.bitmask;
        if masked == 0 {
            continue;
        }

        let size = if masked == descriptor.bitmask && descriptor.bitmask.count_ones() > 1 {
            let (byte_length, consumed) = varint::decode(payload, Direction::Forward)?;
            *payload = &payload[consumed..];
            FieldSize::ByteLength(byte_length)
        } else {
            FieldSize::Count((masked >> descriptor.bitmask.trailing_zeros()) as u32)
        };

        trace!("tag {} present: {:?}", descriptor.tag, size);
        fields.push(ResolvedField {
            tag: descriptor.tag,
            values_per_entry: descriptor.values_per_entry,
            size,
        });
    }

    Ok(fields)
}

/// Read the values of every resolved field from the payload, in field order.
pub fn decode_values(fields: &[ResolvedField], payload: &[u8]) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::new();
    let mut payload = payload;

    for field in fields {
        match field.size {
            FieldSize::Count(count) => {
                let total = count as usize * field.values_per_entry as usize;
                for _ in 0..total {
                    let (value, consumed) = varint::decode(payload, Direction::Forward)?;
                    payload = &payload[consumed..];
                    entries.push(IndexEntry { tag: field.tag, value });
                }
            }
            FieldSize::ByteLength(byte_length) => {
                let consumed = decode_length_prefixed(field.tag, byte_length, payload, &mut entries)?;
                payload = &payload[consumed..];
            }
        }
    }

    if !payload.is_empty() {
        trace!("{} trailing payload bytes ignored", payload.len());
    }
    Ok(entries)
}

/// Decode integers until exactly `byte_length` bytes are consumed.
fn decode_length_prefixed(
    tag: u8,
    byte_length: u32,
    payload: &[u8],
    entries: &mut Vec<IndexEntry>,
) -> Result<usize> {
    let expected = byte_length as usize;
    let mismatch = |consumed: usize| MobiError::LengthMismatch {
        tag,
        expected: byte_length,
        consumed: consumed as u32,
    };

    if payload.len() < expected {
        return Err(mismatch(payload.len()));
    }

    let mut consumed = 0;
    while consumed < expected {
        let (value, used) = match varint::decode(&payload[consumed..], Direction::Forward) {
            Ok(decoded) => decoded,
            Err(MobiError::TruncatedInput { .. }) => return Err(mismatch(payload.len())),
            Err(e) => return Err(e),
        };
        consumed += used;
        entries.push(IndexEntry { tag, value });
    }

    if consumed != expected {
        return Err(mismatch(consumed));
    }
    Ok(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tag: u8, values_per_entry: u8, bitmask: u8) -> TagDescriptor {
        TagDescriptor {
            tag,
            values_per_entry,
            bitmask,
            end_of_control_byte: false,
        }
    }

    fn end_row() -> TagDescriptor {
        TagDescriptor {
            tag: 0,
            values_per_entry: 0,
            bitmask: 0,
            end_of_control_byte: true,
        }
    }

    fn table(control_byte_count: u32, descriptors: Vec<TagDescriptor>) -> TagTable {
        TagTable {
            control_byte_count,
            descriptors,
        }
    }

    fn pairs(entries: &[IndexEntry]) -> Vec<(u8, u32)> {
        entries.iter().map(|e| (e.tag, e.value)).collect()
    }

    #[test]
    fn partial_multi_bit_mask_is_direct_count() {
        let mut payload: &[u8] = &[0x85];
        let fields = resolve_fields(&[0b0001], &mut payload, &[row(7, 1, 0b0011)]).unwrap();
        assert_eq!(fields[0].size, FieldSize::Count(1));
        // no length prefix consumed
        assert_eq!(payload, &[0x85]);
    }

    #[test]
    fn count_is_aligned_to_lowest_mask_bit() {
        let mut payload: &[u8] = &[];
        let fields = resolve_fields(&[0b1000], &mut payload, &[row(7, 1, 0b1100)]).unwrap();
        assert_eq!(fields[0].size, FieldSize::Count(2));
    }

    #[test]
    fn single_bit_mask_never_length_prefixed() {
        let mut payload: &[u8] = &[0x83];
        let fields = resolve_fields(&[0b0100], &mut payload, &[row(1, 1, 0b0100)]).unwrap();
        assert_eq!(fields[0].size, FieldSize::Count(1));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn full_multi_bit_mask_reads_length_prefix() {
        // length prefix 3, then 1 and 130 packed in exactly three bytes
        let entry = [0x0F, 0x83, 0x81, 0x01, 0x82];
        let entries = parse(&entry, &table(1, vec![row(9, 1, 0x0F)])).unwrap();
        assert_eq!(pairs(&entries), vec![(9, 1), (9, 130)]);
    }

    #[test]
    fn length_prefixed_overshoot_is_mismatch() {
        // declared 2 bytes but the only value runs to 3
        let entry = [0x03, 0x82, 0x01, 0x01, 0x81];
        let err = parse(&entry, &table(1, vec![row(9, 1, 0x03)])).unwrap_err();
        assert!(matches!(
            err,
            MobiError::LengthMismatch { tag: 9, expected: 2, consumed: 3 }
        ));
    }

    #[test]
    fn length_prefixed_undershoot_is_mismatch() {
        let entry = [0x03, 0x85, 0x81, 0x82];
        let err = parse(&entry, &table(1, vec![row(9, 1, 0x03)])).unwrap_err();
        assert!(matches!(
            err,
            MobiError::LengthMismatch { tag: 9, expected: 5, consumed: 2 }
        ));
    }

    #[test]
    fn end_row_consumes_control_byte_without_values() {
        let t = table(2, vec![row(1, 1, 0x01), end_row(), row(2, 1, 0x01), end_row()]);
        // second control byte clears tag 2
        let entries = parse(&[0x01, 0x00, 0x8A], &t).unwrap();
        assert_eq!(pairs(&entries), vec![(1, 10)]);

        let entries = parse(&[0x01, 0x01, 0x8A, 0x8B], &t).unwrap();
        assert_eq!(pairs(&entries), vec![(1, 10), (2, 11)]);
    }

    #[test]
    fn end_row_ignores_its_bitmask() {
        let sentinel = TagDescriptor {
            bitmask: 0xFF,
            ..end_row()
        };
        let entries = parse(&[0xFF], &table(1, vec![sentinel])).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn values_per_entry_multiplies_count() {
        let t = table(1, vec![row(6, 2, 0x01)]);
        let entries = parse(&[0x01, 0x81, 0x82], &t).unwrap();
        assert_eq!(pairs(&entries), vec![(6, 1), (6, 2)]);
    }

    #[test]
    fn ncx_style_entry() {
        // position, length, label offset, depth; kindlegen's usual layout
        let t = table(
            1,
            vec![row(1, 1, 0x01), row(2, 1, 0x02), row(3, 1, 0x04), row(4, 1, 0x08), end_row()],
        );
        let mut entry = vec![0x0F];
        for v in [1000u32, 250, 12, 0] {
            varint::encode_into(v, Direction::Forward, &mut entry);
        }
        let entries = parse(&entry, &t).unwrap();
        assert_eq!(pairs(&entries), vec![(1, 1000), (2, 250), (3, 12), (4, 0)]);
    }

    #[test]
    fn length_prefixes_precede_all_values() {
        // tag 1 direct (one value), tag 2 length prefixed (2 bytes)
        let t = table(1, vec![row(1, 1, 0x01), row(2, 1, 0x06)]);
        let entry = [0x07, 0x82, 0x85, 0x86, 0x87];
        let entries = parse(&entry, &t).unwrap();
        assert_eq!(pairs(&entries), vec![(1, 5), (2, 6), (2, 7)]);
    }

    #[test]
    fn oversized_value_overflows() {
        let t = table(1, vec![row(1, 1, 0x01)]);
        let entry = [0x01, 0x7F, 0x7F, 0x7F, 0x7F, 0xFF];
        assert!(matches!(
            parse(&entry, &t),
            Err(MobiError::IntegerOverflow { consumed: 5 })
        ));
    }

    #[test]
    fn end_row_past_last_control_byte() {
        let t = table(1, vec![row(1, 1, 0x01), end_row(), end_row()]);
        assert!(matches!(
            parse(&[0x01, 0x81], &t),
            Err(MobiError::TruncatedInput { context: "entry control bytes", needed: 1, available: 0, .. })
        ));
    }

    #[test]
    fn short_entry_is_truncated() {
        let t = table(2, vec![row(1, 1, 0x01)]);
        assert!(matches!(parse(&[0x01], &t), Err(MobiError::TruncatedInput { .. })));
        let t = table(1, vec![row(1, 1, 0x01)]);
        assert!(matches!(parse(&[0x01], &t), Err(MobiError::TruncatedInput { .. })));
    }
}
