//! IDXT: offsets of the entries inside an index record.

use log::debug;

use crate::mobi::cursor::ByteCursor;
use crate::mobi::types::error::Result;
use crate::mobi::types::models::Magic;

/// Decode `count` big-endian u16 offsets following the IDXT marker.
///
/// The count is not stored in the table itself; it comes from the INDX header.
/// Up to two bytes of alignment padding after the table are skipped.
pub fn parse(cursor: &mut ByteCursor<'_>, count: u32) -> Result<Vec<u16>> {
    cursor.expect_magic(Magic::IDXT, "IDXT")?;

    let offsets = (0..count)
        .map(|_| cursor.read_u16("IDXT offset"))
        .collect::<Result<Vec<u16>>>()?;
    cursor.skip_padding(2);

    debug!("IDXT parsed: {} offsets", offsets.len());
    Ok(offsets)
}
