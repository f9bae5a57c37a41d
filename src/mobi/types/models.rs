//! Core data structures for Mobipocket container components.
//!
//! This module defines the plain data records produced by the decoders:
//! - Palm database header and record table entries
//! - PalmDOC / MOBI / EXTH headers from record 0
//! - INDX index structures (header, tag table, offset table, entries)
//!
//! All structures are decoded field by field from big-endian bytes; none of
//! them mirrors an on-disk memory layout.

use std::fmt;

use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1252};

/// A 4-byte ASCII marker opening a sub-structure.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Magic(pub [u8; 4]);

impl Magic {
    pub const INDX: Magic = Magic(*b"INDX");
    pub const TAGX: Magic = Magic(*b"TAGX");
    pub const IDXT: Magic = Magic(*b"IDXT");
    pub const MOBI: Magic = Magic(*b"MOBI");
    pub const EXTH: Magic = Magic(*b"EXTH");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Magic({})", self)
    }
}

/// Index sub-structures that are recognised but deliberately not decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Wide-character ordering tables (also implied by a UTF-16 index).
    Ordt,
    /// Ligature tables.
    Ligt,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Ordt => write!(f, "ORDT"),
            FieldKind::Ligt => write!(f, "LIGT"),
        }
    }
}

/// Text encoding marker used by the MOBI header and INDX records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Cp1252,
    Utf8,
    Utf16,
    Unknown(u32),
}

impl TextEncoding {
    pub const CP1252_MARKER: u32 = 1252;
    pub const UTF8_MARKER: u32 = 65001;
    pub const UTF16_MARKER: u32 = 65002;

    /// The `encoding_rs` codec for this marker. Unknown markers fall back to windows-1252,
    /// which is what readers of the format have always assumed.
    pub fn codec(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16 => UTF_16LE,
            TextEncoding::Cp1252 | TextEncoding::Unknown(_) => WINDOWS_1252,
        }
    }

    /// Decode bytes into an owned string, dropping trailing NUL padding.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let (text, _, _) = self.codec().decode(bytes);
        text.trim_end_matches('\0').to_owned()
    }
}

impl From<u32> for TextEncoding {
    fn from(value: u32) -> Self {
        match value {
            Self::CP1252_MARKER => Self::Cp1252,
            Self::UTF8_MARKER => Self::Utf8,
            Self::UTF16_MARKER => Self::Utf16,
            other => Self::Unknown(other),
        }
    }
}

// --- Palm database ---

/// The fixed 78-byte Palm database header at the start of the file.
#[derive(Debug, Clone)]
pub struct PdbHeader {
    pub name: String,
    pub attributes: u16,
    pub version: u16,
    pub created: u32,
    pub modified: u32,
    pub backed_up: u32,
    pub modification_number: u32,
    pub app_info_id: u32,
    pub sort_info_id: u32,
    pub db_type: [u8; 4],
    pub creator: [u8; 4],
    pub unique_id_seed: u32,
    pub next_record_list_id: u32,
    pub record_count: u16,
}

impl PdbHeader {
    /// `type` and `creator` concatenated, e.g. `BOOKMOBI`.
    pub fn type_creator(&self) -> String {
        let mut tc = Vec::with_capacity(8);
        tc.extend_from_slice(&self.db_type);
        tc.extend_from_slice(&self.creator);
        String::from_utf8_lossy(&tc).into_owned()
    }
}

/// One 8-byte entry of the record table following the database header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordEntry {
    pub offset: u32,
    pub attributes: u8,
    pub unique_id: u32,
}

/// Location of one record in the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    pub start: u64,
    pub length: u64,
}

// --- Record 0 ---

/// The 16-byte PalmDOC header opening record 0.
#[derive(Debug, Clone)]
pub struct PalmDocHeader {
    pub compression: u16,
    pub text_length: u32,
    pub text_record_count: u16,
    pub text_record_size: u16,
    pub encryption: u16,
}

/// The MOBI header following the PalmDOC header in record 0.
///
/// Offsets and record numbers use `0xFFFFFFFF` for "not present" just like the
/// file does; use the accessor methods for the optional views.
#[derive(Debug, Clone)]
pub struct MobiHeader {
    pub header_length: u32,
    pub mobi_type: u32,
    pub encoding: TextEncoding,
    pub unique_id: u32,
    pub file_version: u32,
    pub orthographic_index: u32,
    pub inflection_index: u32,
    pub index_names: u32,
    pub index_keys: u32,
    pub extra_indices: [u32; 6],
    pub first_non_book_record: u32,
    pub full_name_offset: u32,
    pub full_name_length: u32,
    pub locale: u32,
    pub input_language: u32,
    pub output_language: u32,
    pub min_version: u32,
    pub first_image_record: u32,
    pub huffman_record_offset: u32,
    pub huffman_record_count: u32,
    pub huffman_table_offset: u32,
    pub huffman_table_length: u32,
    pub exth_flags: u32,
    pub drm_offset: u32,
    pub drm_count: u32,
    pub drm_size: u32,
    pub drm_flags: u32,
    pub first_content_record: u16,
    pub last_content_record: u16,
    pub fcis_record: u32,
    pub flis_record: u32,
    pub first_compilation_section: u32,
    pub compilation_section_count: u32,
    pub extra_record_data_flags: u32,
    pub index_record: u32,
}

impl MobiHeader {
    /// Sentinel the format uses for absent offsets and record numbers.
    pub const NOT_PRESENT: u32 = 0xFFFF_FFFF;

    /// Bit 6 of the EXTH flags announces an EXTH block after the header.
    pub fn has_exth(&self) -> bool {
        self.exth_flags & 0x40 != 0
    }

    /// Record number of the first INDX record, if the book carries an index.
    pub fn index_record(&self) -> Option<u32> {
        match self.index_record {
            0 | Self::NOT_PRESENT => None,
            n => Some(n),
        }
    }
}

/// Kind of value stored in an EXTH record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExthValueKind {
    Text,
    Numeric,
    Binary,
}

/// One EXTH metadata record.
#[derive(Debug, Clone)]
pub struct ExthRecord {
    pub record_type: u32,
    pub value: Vec<u8>,
}

/// Metadata block following the MOBI header.
#[derive(Debug, Clone, Default)]
pub struct Exth {
    pub header_length: u32,
    pub records: Vec<ExthRecord>,
}

impl Exth {
    /// First record of the given type.
    pub fn get(&self, record_type: u32) -> Option<&ExthRecord> {
        self.records.iter().find(|r| r.record_type == record_type)
    }
}

// --- INDX ---

/// Discriminant separating self-contained index records from chained ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    Normal,
    Inflection,
    Other(u32),
}

impl From<u32> for IndexType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Normal,
            2 => Self::Inflection,
            other => Self::Other(other),
        }
    }
}

/// Fixed header of one INDX record. All offsets are relative to the record start.
#[derive(Debug, Clone)]
pub struct IndexHeader {
    pub header_length: u32,
    pub index_type: IndexType,
    pub idxt_offset: u32,
    pub idxt_count: u32,
    pub encoding: u32,
    pub language: u32,
    pub total_entries: u32,
    pub ordt_offset: u32,
    pub ligt_offset: u32,
    pub ligt_count: u32,
    pub cncx_count: u32,
    pub ordt_type: u32,
    pub ordt_entries_count: u32,
    pub ordt1_offset: u32,
    pub ordt2_offset: u32,
    pub index_name_offset: u32,
    pub index_name_length: u32,
    /// Where the TAGX table starts, or 0 when this record carries none.
    pub tagx_offset: u32,
}

/// One row of a TAGX table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    pub tag: u8,
    pub values_per_entry: u8,
    pub bitmask: u8,
    /// Set on rows that only mark the end of a control byte.
    pub end_of_control_byte: bool,
}

/// A decoded TAGX table: the ordered descriptors plus the control byte count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTable {
    pub control_byte_count: u32,
    pub descriptors: Vec<TagDescriptor>,
}

/// How many values a resolved tag carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSize {
    /// Number of value groups, each `values_per_entry` integers long.
    Count(u32),
    /// Total payload bytes holding the tag's integers.
    ByteLength(u32),
}

/// A tag found present in an entry's control bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField {
    pub tag: u8,
    pub values_per_entry: u8,
    pub size: FieldSize,
}

/// One decoded `(tag, value)` pair of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub tag: u8,
    pub value: u32,
}

/// The CNCX trailer following the TAGX table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxTable {
    pub label: Vec<u8>,
    pub entry_count: u16,
}

/// Everything decoded from a single INDX record.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub header: IndexHeader,
    /// The TAGX table declared by this record itself.
    pub tag_table: Option<TagTable>,
    pub aux: Option<AuxTable>,
    pub offsets: Vec<u16>,
    pub entries: Vec<IndexEntry>,
}
