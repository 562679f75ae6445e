//! Wire layout of a coalesced blob.
//!
//! The (possibly decrypted) payload is a little-endian count of entries,
//! then per entry a length-prefixed UTF-8 file name and length-prefixed
//! UTF-8 contents. Encrypted blobs prefix the payload with [`MAGIC`];
//! trailing zero padding from block alignment is ignored on read because
//! every read is count-driven.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

/// Marker prefixed to encrypted blobs.
pub const MAGIC: u32 = 0xC0DE_DBAD;

/// One file carried in a coalesced blob: its base name and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub contents: String,
}

/// Serialize entries to the plain (unencrypted) payload.
pub fn serialize(entries: &[Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    // Writes to a Vec cannot fail.
    let _ = out.write_u32::<LittleEndian>(entries.len() as u32);
    for entry in entries {
        let _ = out.write_u32::<LittleEndian>(entry.name.len() as u32);
        out.extend_from_slice(entry.name.as_bytes());
        let _ = out.write_u32::<LittleEndian>(entry.contents.len() as u32);
        out.extend_from_slice(entry.contents.as_bytes());
    }
    out
}

/// Parse a plain payload back into its entries.
pub fn deserialize(payload: &[u8]) -> Result<Vec<Entry>> {
    let mut cursor = Cursor::new(payload);
    let count = cursor.read_u32::<LittleEndian>()?;
    let mut entries = Vec::with_capacity(count.min(4096) as usize);
    for _ in 0..count {
        let name = read_string(&mut cursor, payload)?;
        let contents = read_string(&mut cursor, payload)?;
        entries.push(Entry { name, contents });
    }
    Ok(entries)
}

fn read_string(cursor: &mut Cursor<&[u8]>, payload: &[u8]) -> Result<String> {
    let length = cursor.read_u32::<LittleEndian>()? as usize;
    let start = cursor.position() as usize;
    let end = start
        .checked_add(length)
        .filter(|end| *end <= payload.len())
        .ok_or_else(|| {
            Error::Malformed(format!("string length {length} exceeds payload size"))
        })?;
    cursor.set_position(end as u64);
    String::from_utf8(payload[start..end].to_vec())
        .map_err(|_| Error::Malformed("string is not valid UTF-8".to_string()))
}
