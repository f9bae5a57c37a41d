//! Palm database header and record table.
//!
//! # File Structure
//! ```text
//! [78 bytes]     database header
//! [8 bytes] * N  record entries: offset (u32), attributes (u8), unique id (u24)
//! [2 bytes]      padding
//! [...]          records, back to back
//! ```
//!
//! Records carry no length field: a record ends where the next one starts, and
//! the last record runs to the end of the file.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, info, trace, warn};

use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::{PdbHeader, RecordEntry, RecordSpan};

const NAME_LENGTH: usize = 32;
const KNOWN_TYPES: [&str; 2] = ["BOOKMOBI", "TEXtREAd"];

/// Random access to the records of a database.
pub trait RecordSource {
    /// Number of records in the store.
    fn record_count(&self) -> u32;

    /// Location of record `index`, or [`MobiError::OutOfRange`].
    fn span(&self, index: u32) -> Result<RecordSpan>;

    /// The bytes of record `index`.
    fn read_record(&mut self, index: u32) -> Result<Vec<u8>>;
}

/// Validated record offsets plus the file length that bounds the last record.
#[derive(Debug, Clone)]
pub struct RecordTable {
    entries: Vec<RecordEntry>,
    file_length: u64,
}

impl RecordTable {
    /// Build a table, checking that offsets are strictly increasing and inside the file.
    pub fn new(entries: Vec<RecordEntry>, file_length: u64) -> Result<Self> {
        if entries.is_empty() {
            return Err(MobiError::InvalidFormat(
                "Number of records in this file is less than 1".to_string(),
            ));
        }
        for (i, pair) in entries.windows(2).enumerate() {
            if pair[1].offset <= pair[0].offset {
                return Err(MobiError::UnorderedRecordOffsets {
                    index: i as u32 + 1,
                    offset: pair[1].offset,
                    previous: pair[0].offset,
                });
            }
        }
        if let Some(last) = entries.last()
            && last.offset as u64 > file_length
        {
            return Err(MobiError::InvalidFormat(format!(
                "Record {} starts at {}, beyond end of file ({} bytes)",
                entries.len() - 1,
                last.offset,
                file_length
            )));
        }
        Ok(Self {
            entries,
            file_length,
        })
    }

    pub fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn span(&self, index: u32) -> Result<RecordSpan> {
        let entry = self.entries.get(index as usize).ok_or(MobiError::OutOfRange {
            index,
            count: self.len(),
        })?;
        let end = self
            .entries
            .get(index as usize + 1)
            .map_or(self.file_length, |next| next.offset as u64);
        Ok(RecordSpan {
            start: entry.offset as u64,
            length: end - entry.offset as u64,
        })
    }
}

/// Reads the 78-byte database header.
pub fn parse_header<R: Read>(reader: &mut R) -> Result<PdbHeader> {
    let mut name = [0u8; NAME_LENGTH];
    reader.read_exact(&mut name)?;
    let name_end = name.iter().position(|&b| b == 0).unwrap_or(NAME_LENGTH);

    let attributes = reader.read_u16::<BigEndian>()?;
    let version = reader.read_u16::<BigEndian>()?;
    let created = reader.read_u32::<BigEndian>()?;
    let modified = reader.read_u32::<BigEndian>()?;
    let backed_up = reader.read_u32::<BigEndian>()?;
    let modification_number = reader.read_u32::<BigEndian>()?;
    let app_info_id = reader.read_u32::<BigEndian>()?;
    let sort_info_id = reader.read_u32::<BigEndian>()?;
    let mut db_type = [0u8; 4];
    reader.read_exact(&mut db_type)?;
    let mut creator = [0u8; 4];
    reader.read_exact(&mut creator)?;
    let unique_id_seed = reader.read_u32::<BigEndian>()?;
    let next_record_list_id = reader.read_u32::<BigEndian>()?;
    let record_count = reader.read_u16::<BigEndian>()?;

    let header = PdbHeader {
        name: String::from_utf8_lossy(&name[..name_end]).into_owned(),
        attributes,
        version,
        created,
        modified,
        backed_up,
        modification_number,
        app_info_id,
        sort_info_id,
        db_type,
        creator,
        unique_id_seed,
        next_record_list_id,
        record_count,
    };
    trace!("PDB header: {:?}", header);
    Ok(header)
}

/// Reads `count` record entries and the two padding bytes after them.
pub fn parse_record_entries<R: Read>(reader: &mut R, count: u16) -> Result<Vec<RecordEntry>> {
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = reader.read_u32::<BigEndian>()?;
        let attributes = reader.read_u8()?;
        let unique_id = reader.read_u24::<BigEndian>()?;
        entries.push(RecordEntry {
            offset,
            attributes,
            unique_id,
        });
    }
    let mut padding = [0u8; 2];
    reader.read_exact(&mut padding)?;
    Ok(entries)
}

/// Parses the database header and record table from the start of `reader`.
pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<(PdbHeader, RecordTable)> {
    info!("Parsing Palm database header");

    reader.seek(SeekFrom::Start(0))?;
    let header = parse_header(reader)?;
    let type_creator = header.type_creator();
    if !KNOWN_TYPES.contains(&type_creator.as_str()) {
        warn!("Unexpected database type/creator '{}'", type_creator);
    }
    if header.record_count < 1 {
        return Err(MobiError::InvalidFormat(
            "Number of records in this file is less than 1".to_string(),
        ));
    }

    let entries = parse_record_entries(reader, header.record_count)?;
    let file_length = reader.seek(SeekFrom::End(0))?;
    let table = RecordTable::new(entries, file_length)?;

    debug!(
        "Database '{}' ({}): {} records, {} bytes",
        header.name,
        type_creator,
        table.len(),
        file_length
    );
    Ok((header, table))
}

/// A [`RecordSource`] over any seekable byte stream.
#[derive(Debug)]
pub struct RecordStore<R> {
    reader: R,
    table: RecordTable,
}

impl<R: Read + Seek> RecordStore<R> {
    pub fn new(reader: R, table: RecordTable) -> Self {
        Self { reader, table }
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> RecordSource for RecordStore<R> {
    fn record_count(&self) -> u32 {
        self.table.len()
    }

    fn span(&self, index: u32) -> Result<RecordSpan> {
        self.table.span(index)
    }

    fn read_record(&mut self, index: u32) -> Result<Vec<u8>> {
        let span = self.table.span(index)?;
        trace!("Reading record {} ({} bytes at {})", index, span.length, span.start);
        self.reader.seek(SeekFrom::Start(span.start))?;
        let mut bytes = vec![0u8; span.length as usize];
        self.reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}
