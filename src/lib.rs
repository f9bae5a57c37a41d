//! # mobi-reader
//!
//! A reader for Mobipocket e-books (.mobi, .prc and .azw containers).
//! Decodes the Palm database, the record 0 headers and the INDX index
//! records, following inflection chains across records.
//!
//! **Note:** Text decompression (PalmDOC LZ77, HUFF/CDIC) is not implemented;
//! text records are returned still compressed.
pub mod mobi;

// Re-export the main types for convenience
pub use mobi::{
    MobiError,
    MobiReader,
    ReaderOptions,
    Result,
    models::{
        Exth,
        IndexEntry,
        IndexRecord,
        MobiHeader,
        PalmDocHeader,
        PdbHeader,
        TextEncoding,
    },
};
