use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use log::info;

use super::format::header::{self, RecordZero};
use super::format::index;
use super::format::pdb::{self, RecordSource, RecordStore};
use super::format::text;
use super::types::error::{MobiError, Result};
use super::types::models::*;

/// Options controlling how much of a book is decoded up front.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Decode the INDX chain while opening the book.
    pub parse_index: bool,
    /// Upper bound on the number of records an inflection chain may span.
    pub max_index_chain: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            parse_index: true,
            max_index_chain: 4096,
        }
    }
}

/// The main reader for Mobipocket (.mobi / .prc / .azw) books.
///
/// Opening a book parses the database header, record 0 and, unless disabled
/// in [`ReaderOptions`], the INDX chain the MOBI header points to.
#[derive(Debug)]
pub struct MobiReader<R> {
    store: RecordStore<R>,
    options: ReaderOptions,
    pub pdb: PdbHeader,
    pub palmdoc: PalmDocHeader,
    pub mobi: MobiHeader,
    pub exth: Option<Exth>,
    pub full_name: String,

    index_entries: Vec<IndexEntry>,
}

impl MobiReader<File> {
    /// Read a book from the given path.
    ///
    /// # Errors
    /// Returns an error if:
    /// - File cannot be opened
    /// - The database header or record table is invalid
    /// - Record 0 is encrypted or lacks a MOBI header
    /// - The index chain fails to decode (when index parsing is enabled)
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening MOBI file: {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file, options)
    }
}

impl<R: Read + Seek> MobiReader<R> {
    /// Read a book from any seekable source.
    pub fn from_reader(mut reader: R, options: ReaderOptions) -> Result<Self> {
        let (pdb_header, table) = pdb::parse(&mut reader)?;
        let mut store = RecordStore::new(reader, table);

        let record0 = store.read_record(0)?;
        let RecordZero {
            palmdoc,
            mobi,
            exth,
            full_name,
        } = header::parse(&record0)?;

        let index_entries = match mobi.index_record() {
            Some(start) if options.parse_index => {
                index::parse_index_chain(&mut store, start, options.max_index_chain)?
            }
            _ => Vec::new(),
        };

        info!(
            "MOBI file opened: {} records, {} text records, {} index values",
            store.record_count(),
            palmdoc.text_record_count,
            index_entries.len()
        );

        Ok(Self {
            store,
            options,
            pdb: pdb_header,
            palmdoc,
            mobi,
            exth,
            full_name,
            index_entries,
        })
    }

    /// Returns the number of records in the database.
    pub fn record_count(&self) -> u32 {
        self.store.record_count()
    }

    /// Location of record `index` in the file.
    pub fn record_span(&self, index: u32) -> Result<RecordSpan> {
        self.store.span(index)
    }

    /// Raw bytes of record `index`.
    pub fn read_record(&mut self, index: u32) -> Result<Vec<u8>> {
        self.store.read_record(index)
    }

    /// Compressed text record `n` (1-based, as stored) without its trailing entries.
    pub fn read_text_record(&mut self, n: u16) -> Result<Vec<u8>> {
        if n == 0 || n > self.palmdoc.text_record_count {
            return Err(MobiError::OutOfRange {
                index: n as u32,
                count: self.palmdoc.text_record_count as u32 + 1,
            });
        }
        let record = self.store.read_record(n as u32)?;
        let text = text::strip_trailing_entries(&record, self.mobi.extra_record_data_flags)?;
        Ok(text.to_vec())
    }

    /// Index values decoded while opening the book.
    pub fn index_entries(&self) -> &[IndexEntry] {
        &self.index_entries
    }

    /// Decode the index chain now, regardless of [`ReaderOptions::parse_index`].
    ///
    /// Returns an empty list when the book carries no index.
    pub fn read_index(&mut self) -> Result<Vec<IndexEntry>> {
        match self.mobi.index_record() {
            Some(start) => index::parse_index_chain(&mut self.store, start, self.options.max_index_chain),
            None => Ok(Vec::new()),
        }
    }

    /// Decode a single INDX record without following its chain.
    pub fn read_index_record(&mut self, record: u32) -> Result<IndexRecord> {
        let bytes = self.store.read_record(record)?;
        index::parse_index_record(&bytes, record, None)
    }

    /// Best available title: the full name, then EXTH updated title, then the database name.
    pub fn title(&self) -> String {
        if !self.full_name.is_empty() {
            return self.full_name.clone();
        }
        self.exth
            .as_ref()
            .and_then(|exth| exth.text("updated_title", self.mobi.encoding))
            .unwrap_or_else(|| self.pdb.name.clone())
    }

    pub fn author(&self) -> Option<String> {
        self.exth.as_ref()?.text("author", self.mobi.encoding)
    }

    /// Decode text with the book's declared encoding.
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        self.mobi.encoding.decode(bytes)
    }
}
