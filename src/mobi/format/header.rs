//! Record 0: PalmDOC header, MOBI header, EXTH metadata and full name.
//!
//! # Record Structure
//! ```text
//! [16 bytes] PalmDOC header
//! [N bytes]  MOBI header ("MOBI", header length N, ...)
//! [M bytes]  EXTH block, if EXTH flags bit 0x40 is set
//! [...]      full name at `full name offset`
//! ```

use log::{debug, info, trace, warn};

use crate::mobi::cursor::ByteCursor;
use crate::mobi::types::error::{MobiError, Result};
use crate::mobi::types::models::{
    Exth, ExthRecord, ExthValueKind, Magic, MobiHeader, PalmDocHeader, TextEncoding,
};
use crate::mobi::types::tags;

const PALMDOC_LENGTH: usize = 16;

/// Size of the MOBI header layout this reader knows about, measured from the magic.
const KNOWN_MOBI_LENGTH: usize = 232;

/// Everything decoded from record 0.
#[derive(Debug, Clone)]
pub struct RecordZero {
    pub palmdoc: PalmDocHeader,
    pub mobi: MobiHeader,
    pub exth: Option<Exth>,
    pub full_name: String,
}

/// Parses record 0 of a Mobipocket book.
///
/// # Errors
/// - [`MobiError::Encrypted`] when the PalmDOC header declares encryption
/// - [`MobiError::MagicMismatch`] when the MOBI or EXTH marker is missing
pub fn parse(record0: &[u8]) -> Result<RecordZero> {
    info!("Parsing record 0 headers");
    let mut cursor = ByteCursor::new(record0);

    let palmdoc = parse_palmdoc(&mut cursor)?;
    if palmdoc.encryption != 0 {
        return Err(MobiError::Encrypted(palmdoc.encryption));
    }

    let mobi = parse_mobi(&mut cursor)?;

    let exth = if mobi.has_exth() {
        cursor.seek(PALMDOC_LENGTH + mobi.header_length as usize, "EXTH offset")?;
        Some(parse_exth(&mut cursor)?)
    } else {
        None
    };

    let full_name = read_full_name(record0, &mobi)?;

    info!(
        "Record 0 parsed: '{}', encoding={:?}, version={}, index={:?}",
        full_name,
        mobi.encoding,
        mobi.file_version,
        mobi.index_record()
    );

    Ok(RecordZero {
        palmdoc,
        mobi,
        exth,
        full_name,
    })
}

pub fn parse_palmdoc(cursor: &mut ByteCursor<'_>) -> Result<PalmDocHeader> {
    let compression = cursor.read_u16("PalmDOC compression")?;
    cursor.read_u16("PalmDOC unused")?;
    let text_length = cursor.read_u32("PalmDOC text length")?;
    let text_record_count = cursor.read_u16("PalmDOC record count")?;
    let text_record_size = cursor.read_u16("PalmDOC record size")?;
    let encryption = cursor.read_u16("PalmDOC encryption")?;
    cursor.read_u16("PalmDOC unknown")?;

    let header = PalmDocHeader {
        compression,
        text_length,
        text_record_count,
        text_record_size,
        encryption,
    };
    debug!("PalmDOC header: {:?}", header);
    Ok(header)
}

/// Parses the MOBI header at the cursor.
///
/// Only `header length` bytes belong to the header; fields past that point
/// read as zero, which every consumer treats as "absent".
pub fn parse_mobi(cursor: &mut ByteCursor<'_>) -> Result<MobiHeader> {
    let start = cursor.position();
    cursor.expect_magic(Magic::MOBI, "MOBI header")?;
    let header_length = cursor.read_u32("MOBI header length")?;

    cursor.seek(start, "MOBI header")?;
    let declared = cursor.read_exact(header_length as usize, "MOBI header")?;
    if declared.len() < KNOWN_MOBI_LENGTH {
        warn!(
            "MOBI header is {} bytes, shorter than the {} byte layout; missing fields read as zero",
            declared.len(),
            KNOWN_MOBI_LENGTH
        );
    }
    let mut padded = vec![0u8; KNOWN_MOBI_LENGTH.max(declared.len())];
    padded[..declared.len()].copy_from_slice(declared);

    let mut c = ByteCursor::new(&padded);
    c.seek(8, "MOBI header")?;

    // Reads below stay inside `padded`, which is at least KNOWN_MOBI_LENGTH long.
    let mobi_type = c.read_u32("MOBI type")?;
    let encoding = TextEncoding::from(c.read_u32("MOBI text encoding")?);
    let unique_id = c.read_u32("MOBI unique id")?;
    let file_version = c.read_u32("MOBI file version")?;
    let orthographic_index = c.read_u32("MOBI orthographic index")?;
    let inflection_index = c.read_u32("MOBI inflection index")?;
    let index_names = c.read_u32("MOBI index names")?;
    let index_keys = c.read_u32("MOBI index keys")?;
    let mut extra_indices = [0u32; 6];
    for slot in extra_indices.iter_mut() {
        *slot = c.read_u32("MOBI extra index")?;
    }
    let first_non_book_record = c.read_u32("MOBI first non-book record")?;
    let full_name_offset = c.read_u32("MOBI full name offset")?;
    let full_name_length = c.read_u32("MOBI full name length")?;
    let locale = c.read_u32("MOBI locale")?;
    let input_language = c.read_u32("MOBI input language")?;
    let output_language = c.read_u32("MOBI output language")?;
    let min_version = c.read_u32("MOBI min version")?;
    let first_image_record = c.read_u32("MOBI first image record")?;
    let huffman_record_offset = c.read_u32("MOBI huffman record offset")?;
    let huffman_record_count = c.read_u32("MOBI huffman record count")?;
    let huffman_table_offset = c.read_u32("MOBI huffman table offset")?;
    let huffman_table_length = c.read_u32("MOBI huffman table length")?;
    let exth_flags = c.read_u32("MOBI EXTH flags")?;

    c.seek(152, "MOBI DRM offset")?;
    let drm_offset = c.read_u32("MOBI DRM offset")?;
    let drm_count = c.read_u32("MOBI DRM count")?;
    let drm_size = c.read_u32("MOBI DRM size")?;
    let drm_flags = c.read_u32("MOBI DRM flags")?;

    c.seek(176, "MOBI content records")?;
    let first_content_record = c.read_u16("MOBI first content record")?;
    let last_content_record = c.read_u16("MOBI last content record")?;
    c.read_u32("MOBI header")?;
    let fcis_record = c.read_u32("MOBI FCIS record")?;
    c.read_u32("MOBI header")?;
    let flis_record = c.read_u32("MOBI FLIS record")?;

    c.seek(212, "MOBI compilation sections")?;
    let first_compilation_section = c.read_u32("MOBI compilation section")?;
    let compilation_section_count = c.read_u32("MOBI compilation section count")?;
    c.read_u32("MOBI header")?;
    let extra_record_data_flags = c.read_u32("MOBI extra record data flags")?;
    let index_record = c.read_u32("MOBI INDX record")?;

    let header = MobiHeader {
        header_length,
        mobi_type,
        encoding,
        unique_id,
        file_version,
        orthographic_index,
        inflection_index,
        index_names,
        index_keys,
        extra_indices,
        first_non_book_record,
        full_name_offset,
        full_name_length,
        locale,
        input_language,
        output_language,
        min_version,
        first_image_record,
        huffman_record_offset,
        huffman_record_count,
        huffman_table_offset,
        huffman_table_length,
        exth_flags,
        drm_offset,
        drm_count,
        drm_size,
        drm_flags,
        first_content_record,
        last_content_record,
        fcis_record,
        flis_record,
        first_compilation_section,
        compilation_section_count,
        extra_record_data_flags,
        index_record,
    };

    debug!(
        "MOBI header: {} bytes, type {}, encoding {:?}, EXTH flags {:#x}",
        header.header_length, header.mobi_type, header.encoding, header.exth_flags
    );
    trace!("MOBI header: {:?}", header);
    Ok(header)
}

/// Parses an EXTH block at the cursor.
///
/// ```text
/// [4 bytes] "EXTH"
/// [4 bytes] header length
/// [4 bytes] record count
/// records:  type (u32), length (u32, includes these 8 bytes), value
/// ```
pub fn parse_exth(cursor: &mut ByteCursor<'_>) -> Result<Exth> {
    cursor.expect_magic(Magic::EXTH, "EXTH")?;
    let header_length = cursor.read_u32("EXTH header length")?;
    let record_count = cursor.read_u32("EXTH record count")?;

    let mut records = Vec::new();
    for _ in 0..record_count {
        let record_type = cursor.read_u32("EXTH record type")?;
        let length = cursor.read_u32("EXTH record length")?;
        let value_length = length.checked_sub(8).ok_or_else(|| {
            MobiError::InvalidFormat(format!(
                "EXTH record {} declares length {}, less than its own 8-byte header",
                record_type, length
            ))
        })?;
        let value = cursor.read_exact(value_length as usize, "EXTH record value")?.to_vec();
        trace!("EXTH record {} ({} bytes)", record_type, value.len());
        records.push(ExthRecord { record_type, value });
    }

    debug!("EXTH parsed: {} records", records.len());
    Ok(Exth {
        header_length,
        records,
    })
}

/// The book title stored in record 0.
pub fn read_full_name(record0: &[u8], mobi: &MobiHeader) -> Result<String> {
    if mobi.full_name_offset == MobiHeader::NOT_PRESENT || mobi.full_name_length == 0 {
        return Ok(String::new());
    }
    let mut cursor = ByteCursor::new(record0);
    cursor.seek(mobi.full_name_offset as usize, "full name offset")?;
    let bytes = cursor.read_exact(mobi.full_name_length as usize, "full name")?;
    Ok(mobi.encoding.decode(bytes))
}

impl ExthRecord {
    pub fn name(&self) -> Option<&'static str> {
        tags::exth_tag_info(self.record_type).map(|(name, _)| name)
    }

    pub fn kind(&self) -> ExthValueKind {
        tags::exth_tag_info(self.record_type).map_or(ExthValueKind::Binary, |(_, kind)| kind)
    }

    /// Big-endian integer value, for numeric records of up to four bytes.
    pub fn as_u32(&self) -> Option<u32> {
        if self.value.is_empty() || self.value.len() > 4 {
            return None;
        }
        Some(self.value.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }

    pub fn as_text(&self, encoding: TextEncoding) -> String {
        encoding.decode(&self.value)
    }
}

impl Exth {
    /// Text of the first record with the given name, e.g. `"author"`.
    pub fn text(&self, name: &str, encoding: TextEncoding) -> Option<String> {
        self.records
            .iter()
            .find(|r| r.name() == Some(name))
            .map(|r| r.as_text(encoding))
    }
}
