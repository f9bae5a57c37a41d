//! Custom error types for the mobi-reader crate.

use thiserror::Error;

use super::models::{FieldKind, Magic};

/// The primary error type for all operations in this crate.
///
/// Every decode failure is terminal for the structure being decoded: no
/// partially populated result is ever handed back alongside an error.
#[derive(Debug, Error)]
pub enum MobiError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The expected 4-byte marker was not found at the given offset.
    #[error("Magic mismatch for {context} at offset {offset}: expected {expected}, found {found:02x?}")]
    MagicMismatch {
        context: &'static str,
        expected: Magic,
        found: Vec<u8>,
        offset: usize,
    },

    /// Fewer bytes are available than a field requires.
    #[error("Truncated input while reading {context} at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        context: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The TAGX header declares a length too small to hold its own fixed fields.
    #[error("TAGX header too short: {length} bytes (minimum 12)")]
    HeaderTooShort { length: u32 },

    /// The index declares a sub-structure this reader does not decode.
    #[error("Unsupported index field kind: {0}")]
    UnsupportedFieldKind(FieldKind),

    /// A length-prefixed tag value did not consume exactly its declared byte length.
    #[error("Length mismatch for tag {tag}: declared {expected} bytes, consumed {consumed}")]
    LengthMismatch { tag: u8, expected: u32, consumed: u32 },

    /// A variable-width integer does not fit in 32 bits.
    #[error("Variable-width integer overflows u32 after {consumed} bytes")]
    IntegerOverflow { consumed: usize },

    /// A record number beyond the record table was requested.
    #[error("Record {index} out of range (record count {count})")]
    OutOfRange { index: u32, count: u32 },

    /// An inflection index chain ran past the permitted number of records.
    #[error("Index chain starting at record {start} exceeds {limit} records")]
    RecursionLimitExceeded { start: u32, limit: usize },

    /// An IDXT offset points outside the record's entry region.
    #[error("Index entry {entry} spans {start}..{end}, outside the entry region of {limit} bytes")]
    EntryOutOfBounds {
        entry: usize,
        start: usize,
        end: usize,
        limit: usize,
    },

    /// A record has entries to decode but neither carries nor inherits a TAGX table.
    #[error("Index record {record} has entries but no tag table")]
    MissingTagTable { record: u32 },

    /// Decoding one index entry failed.
    #[error("Index record {record}, entry {entry} at offset {offset}: {source}")]
    Entry {
        record: u32,
        entry: usize,
        offset: usize,
        #[source]
        source: Box<MobiError>,
    },

    /// The Palm database record table is not strictly increasing.
    #[error("Record offsets not increasing: record {index} starts at {offset}, previous at {previous}")]
    UnorderedRecordOffsets { index: u32, offset: u32, previous: u32 },

    /// The document records are encrypted (DRM).
    #[error("Records are encrypted (encryption type {0})")]
    Encrypted(u16),

    /// The file is structurally invalid in a way not covered above.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// A convenience `Result` type alias using the crate's `MobiError` type.
pub type Result<T> = std::result::Result<T, MobiError>;
