//! # INDX Record Parsing
//!
//! An INDX record packs a dictionary or navigation index into one Palm record:
//!
//! ```text
//! ┌──────────────────────┐ 0
//! │ INDX header          │ ← parse_header()
//! ├──────────────────────┤ header length
//! │ TAGX (optional)      │ ← tagx::parse()
//! │ CNCX trailer (opt.)  │ ← cncx::parse()
//! ├──────────────────────┤ first IDXT offset
//! │ entries              │ ← ptagx::parse() per entry
//! ├──────────────────────┤ IDXT offset
//! │ IDXT                 │ ← idxt::parse()
//! └──────────────────────┘
//! ```
//!
//! Every offset is relative to the start of the record, and every step seeks
//! to its absolute record offset before reading. Inflection indices continue
//! into the following record; [`parse_index_chain`] follows them and
//! concatenates the entries in record order.

use log::{debug, info, trace};

use crate::mobi::cursor::ByteCursor;
use crate::mobi::format::pdb::RecordSource;
use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::{
    FieldKind, IndexEntry, IndexHeader, IndexRecord, IndexType, Magic, TagTable, TextEncoding,
};

pub mod cncx;
pub mod idxt;
pub mod ptagx;
pub mod tagx;

/// Bytes between the end of the CNCX count and the ORDT fields.
const RESERVED_LENGTH: usize = 108;

/// Marker, header length and control byte count.
const TAGX_MIN_LENGTH: u32 = 12;

/// Decode the fixed INDX header. The cursor must be positioned right after the magic.
///
/// # Header Structure
/// ```text
/// [4]   header length        [44]  LIGT offset
/// [8]   index type           [48]  LIGT count
/// [12]  unknown (2 x u32)    [52]  CNCX record count
/// [20]  IDXT offset          [56]  reserved (108 bytes)
/// [24]  IDXT count           [164] ORDT type, ORDT entry count
/// [28]  encoding             [172] ORDT1 offset, ORDT2 offset
/// [32]  language             [180] index name offset, length
/// [36]  total entry count    [188] unknown
/// [40]  ORDT offset
/// ```
pub fn parse_header(cursor: &mut ByteCursor<'_>) -> Result<IndexHeader> {
    let header_length = cursor.read_u32("INDX header length")?;
    let index_type = IndexType::from(cursor.read_u32("INDX index type")?);
    cursor.read_exact(8, "INDX header")?;
    let idxt_offset = cursor.read_u32("INDX IDXT offset")?;
    let idxt_count = cursor.read_u32("INDX IDXT count")?;
    let encoding = cursor.read_u32("INDX encoding")?;
    let language = cursor.read_u32("INDX language")?;
    let total_entries = cursor.read_u32("INDX total entries")?;
    let ordt_offset = cursor.read_u32("INDX ORDT offset")?;
    let ligt_offset = cursor.read_u32("INDX LIGT offset")?;
    let ligt_count = cursor.read_u32("INDX LIGT count")?;
    let cncx_count = cursor.read_u32("INDX CNCX count")?;
    cursor.read_exact(RESERVED_LENGTH, "INDX header")?;
    let ordt_type = cursor.read_u32("INDX ORDT type")?;
    let ordt_entries_count = cursor.read_u32("INDX ORDT entries")?;
    let ordt1_offset = cursor.read_u32("INDX ORDT1 offset")?;
    let ordt2_offset = cursor.read_u32("INDX ORDT2 offset")?;
    let index_name_offset = cursor.read_u32("INDX name offset")?;
    let index_name_length = cursor.read_u32("INDX name length")?;
    cursor.read_u32("INDX header")?;

    // The TAGX table, when present, fills the gap between the header and the
    // first entry. A gap too small for the fixed TAGX fields means no table.
    let entries_start = first_entry_offset(cursor, idxt_offset, idxt_count);
    let tagx_offset = if entries_start.saturating_sub(header_length) >= TAGX_MIN_LENGTH {
        header_length
    } else {
        0
    };

    let header = IndexHeader {
        header_length,
        index_type,
        idxt_offset,
        idxt_count,
        encoding,
        language,
        total_entries,
        ordt_offset,
        ligt_offset,
        ligt_count,
        cncx_count,
        ordt_type,
        ordt_entries_count,
        ordt1_offset,
        ordt2_offset,
        index_name_offset,
        index_name_length,
        tagx_offset,
    };
    trace!("INDX header: {:?}", header);
    Ok(header)
}

/// Where the entry region starts: the first IDXT offset, or the IDXT table
/// itself when the record has no entries or the offset cannot be read.
fn first_entry_offset(cursor: &ByteCursor<'_>, idxt_offset: u32, idxt_count: u32) -> u32 {
    if idxt_count == 0 {
        return idxt_offset;
    }
    let mut probe = cursor.clone();
    let first = probe
        .seek(idxt_offset as usize + 4, "IDXT offset")
        .and_then(|()| probe.read_u16("IDXT offset"));
    match first {
        Ok(offset) => (offset as u32).min(idxt_offset),
        Err(_) => idxt_offset,
    }
}

/// Decode one INDX record.
///
/// `inherited` is the tag table of an earlier record in the same chain; it is
/// used when this record does not declare its own. A record that has entries
/// to decode and neither its own table nor an inherited one fails with
/// [`MobiError::MissingTagTable`].
///
/// Failures inside an entry are reported as [`MobiError::Entry`], carrying the
/// record number, entry index and the entry's offset in the record.
pub fn parse_index_record(
    bytes: &[u8],
    record: u32,
    inherited: Option<&TagTable>,
) -> Result<IndexRecord> {
    let mut cursor = ByteCursor::new(bytes);
    cursor.expect_magic(Magic::INDX, "INDX")?;
    let header = parse_header(&mut cursor)?;

    let decodes_entries = header.index_type == IndexType::Normal && header.idxt_count > 0;

    let mut tag_table = None;
    let mut aux = None;
    if header.tagx_offset != 0 {
        cursor.seek(header.tagx_offset as usize, "TAGX offset")?;
        tag_table = Some(tagx::parse(&mut cursor)?);

        if header.cncx_count > 0 {
            aux = Some(cncx::parse(&mut cursor)?);
        }
    }

    if header.encoding == TextEncoding::UTF16_MARKER || header.ordt_entries_count > 0 {
        return Err(MobiError::UnsupportedFieldKind(FieldKind::Ordt));
    }
    if header.ligt_count > 0 {
        return Err(MobiError::UnsupportedFieldKind(FieldKind::Ligt));
    }

    let mut offsets = Vec::new();
    if header.idxt_count > 0 {
        cursor.seek(header.idxt_offset as usize, "IDXT offset")?;
        offsets = idxt::parse(&mut cursor, header.idxt_count)?;
    }

    let mut entries = Vec::new();
    if decodes_entries {
        let table = match (tag_table.as_ref(), inherited) {
            (Some(table), _) | (None, Some(table)) => table,
            (None, None) => return Err(MobiError::MissingTagTable { record }),
        };
        let region_end = (header.idxt_offset as usize).min(bytes.len());

        for (i, &start) in offsets.iter().enumerate() {
            let start = start as usize;
            let end = offsets.get(i + 1).map_or(region_end, |&next| next as usize);
            if start >= end || end > region_end {
                return Err(MobiError::EntryOutOfBounds {
                    entry: i,
                    start,
                    end,
                    limit: region_end,
                });
            }

            let decoded = parse_entry(&bytes[start..end], table).map_err(|source| MobiError::Entry {
                record,
                entry: i,
                offset: start,
                source: Box::new(source),
            })?;
            trace!("entry {}: {} values", i, decoded.len());
            entries.extend(decoded);
        }
    }

    debug!(
        "INDX record {} parsed: type {:?}, {} offsets, {} values",
        record,
        header.index_type,
        offsets.len(),
        entries.len()
    );

    Ok(IndexRecord {
        header,
        tag_table,
        aux,
        offsets,
        entries,
    })
}

/// Skip the entry's label and resolve its tags.
fn parse_entry(entry_bytes: &[u8], table: &TagTable) -> Result<Vec<IndexEntry>> {
    let mut entry = ByteCursor::new(entry_bytes);
    let label_length = entry.read_u8("entry label length")? as usize;
    let label = entry.read_exact(label_length, "entry label")?;
    trace!("entry label: {:02x?}", label);

    ptagx::parse(&entry_bytes[entry.position()..], table)
}

/// Decode the index starting at record `start`, following inflection chains.
///
/// The chain may span at most `max_chain` records (and never more than the
/// store holds); a longer chain fails with
/// [`MobiError::RecursionLimitExceeded`]. Any failure aborts the whole chain.
pub fn parse_index_chain<S: RecordSource + ?Sized>(
    store: &mut S,
    start: u32,
    max_chain: usize,
) -> Result<Vec<IndexEntry>> {
    let limit = max_chain.min(store.record_count() as usize);
    info!("Parsing index chain from record {} (limit {} records)", start, limit);

    let mut entries = Vec::new();
    let mut inherited: Option<TagTable> = None;
    let mut record = start;
    let mut depth = 0;

    loop {
        if depth >= limit {
            return Err(MobiError::RecursionLimitExceeded { start, limit });
        }

        let bytes = store.read_record(record)?;
        let IndexRecord {
            header,
            tag_table,
            entries: decoded,
            ..
        } = parse_index_record(&bytes, record, inherited.as_ref())?;
        entries.extend(decoded);

        if header.index_type != IndexType::Inflection {
            break;
        }
        if tag_table.is_some() {
            inherited = tag_table;
        }

        let next = record.checked_add(1).ok_or(MobiError::OutOfRange {
            index: record,
            count: store.record_count(),
        })?;
        debug!("Record {} is an inflection index, continuing at {}", record, next);
        record = next;
        depth += 1;
    }

    info!("Index chain decoded: {} values", entries.len());
    Ok(entries)
}
