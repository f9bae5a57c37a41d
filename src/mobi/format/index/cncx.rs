//! CNCX trailer that follows the TAGX table when the INDX header declares CNCX records.
//!
//! ```text
//! [1 byte]  label length
//! [N bytes] label
//! [1 byte]  terminator (0x00)
//! [2 bytes] entry count (big-endian)
//! ```

use log::debug;

use crate::mobi::cursor::ByteCursor;
use crate::mobi::types::error::Result;
use crate::mobi::types::models::{AuxTable, TextEncoding};

pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<AuxTable> {
    let length = cursor.read_u8("CNCX label length")? as usize;
    let label = cursor.read_exact(length, "CNCX label")?.to_vec();
    cursor.read_u8("CNCX terminator")?;
    let entry_count = cursor.read_u16("CNCX entry count")?;

    debug!("CNCX parsed: {} label bytes, {} entries", label.len(), entry_count);
    Ok(AuxTable { label, entry_count })
}

impl AuxTable {
    /// The label decoded with the index encoding.
    pub fn label_text(&self, encoding: TextEncoding) -> String {
        encoding.decode(&self.label)
    }
}
