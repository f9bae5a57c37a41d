//! File format parsing layer for Mobipocket books.
//!
//! This module bridges raw record bytes and the high-level
//! [`MobiReader`](crate::mobi::reader::MobiReader).
//!
//! # Module Organization
//!
//! - [`pdb`]: Palm database header and record table
//! - [`header`]: PalmDOC, MOBI and EXTH headers in record 0
//! - [`index`]: INDX records and their TAGX/IDXT/CNCX sub-structures
//! - [`text`]: trailing entries framing the compressed text records
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  PDB Header     │ ← pdb::parse()
//! │  Record Table   │
//! ├─────────────────┤
//! │  Record 0       │ ← header::parse()
//! ├─────────────────┤
//! │  Text Records   │ ← text::strip_trailing_entries()
//! ├─────────────────┤
//! │  INDX Records   │ ← index::parse_index_chain()
//! ├─────────────────┤
//! │  Other Records  │   (images, FLIS, FCIS, ...)
//! └─────────────────┘
//! ```

pub mod header;
pub mod index;
pub mod pdb;
pub mod text;
