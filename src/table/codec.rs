//! Binary encoding of melt tables for the tables file.
//!
//! All integers are little-endian and records carry no padding:
//!
//! ```text
//! header   48 bytes  ASCII notice, zero padded; byte 45 holds FORMAT_VERSION
//! count     4 bytes  u32, number of table entries that follow
//! entry    15 bytes  packed record (see [`PackedRecord`])
//!        4096 bytes  values block (PERSISTED_VALUES_LEN, whatever values_size is)
//! ```
//!
//! The `u32` count and the 4096-byte values block together make up format version 1. Files
//! with a 16-bit count or 1600-byte values blocks carry 0 in the version byte and are refused.

use std::io::{Read, Write};

use crate::{
    foundation::core::{
        HEADER_SIZE, MAX_BUFFER_SIZE, PERSISTED_VALUES_LEN, StateFlags, TableUuid,
    },
    foundation::error::{MeltError, MeltResult},
    table::model::MeltTable,
};

/// Size of one packed record on disk.
pub const RECORD_SIZE: usize = 15;

const NOTICE_OPEN: &[u8] = b"|-This file cannot be read in HUMAN mode.";
const NOTICE_CLOSE: &[u8] = b"-|";

/// Version of the layout described in the module docs.
pub const FORMAT_VERSION: u8 = 1;
/// Last padding byte of the notice, just before the closing marker.
const VERSION_OFFSET: usize = HEADER_SIZE - NOTICE_CLOSE.len() - 1;

/// Fixed-layout metadata of one table, independent of its in-memory layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRecord {
    /// Raw table UUID; 0 is invalid.
    pub uuid: u64,
    /// Offsets walk cursor.
    pub position: u16,
    /// 1 when the table had no owners at encode time.
    pub death_mark: u8,
    /// Used bytes of the values block.
    pub values_size: u16,
    /// Slice count of the table.
    pub offsets_size: u16,
}

impl PackedRecord {
    /// Snapshot the persisted fields of `table`.
    pub fn from_table(table: &MeltTable) -> Self {
        Self {
            uuid: table.uuid.get(),
            position: table.position,
            death_mark: u8::from(table.reference_count == 0),
            values_size: table.values_size,
            offsets_size: table.offsets_size,
        }
    }

    /// Little-endian wire form.
    pub fn to_bytes(self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..8].copy_from_slice(&self.uuid.to_le_bytes());
        out[8..10].copy_from_slice(&self.position.to_le_bytes());
        out[10] = self.death_mark;
        out[11..13].copy_from_slice(&self.values_size.to_le_bytes());
        out[13..15].copy_from_slice(&self.offsets_size.to_le_bytes());
        out
    }

    /// Inverse of [`PackedRecord::to_bytes`].
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let mut uuid = [0u8; 8];
        uuid.copy_from_slice(&bytes[0..8]);
        Self {
            uuid: u64::from_le_bytes(uuid),
            position: u16_at(8),
            death_mark: bytes[10],
            values_size: u16_at(11),
            offsets_size: u16_at(13),
        }
    }

    /// Rebuild a runtime table around a values block read from disk.
    ///
    /// The table starts unreferenced and `DIRTY`; `DEAD` follows the death mark. Offsets are
    /// never stored, so a zeroed buffer is allocated.
    pub fn into_table(self, values_block: &[u8]) -> MeltResult<MeltTable> {
        let uuid = TableUuid::new(self.uuid)
            .ok_or_else(|| MeltError::validation("table record has uuid 0"))?;
        let cap = MAX_BUFFER_SIZE as u16;
        if self.values_size > cap || self.offsets_size > cap {
            return Err(MeltError::validation(format!(
                "table {uuid} record sizes {}/{} exceed buffer capacity {MAX_BUFFER_SIZE}",
                self.values_size, self.offsets_size
            )));
        }

        let mut values = vec![0u8; MAX_BUFFER_SIZE].into_boxed_slice();
        let n = values_block.len().min(MAX_BUFFER_SIZE);
        values[..n].copy_from_slice(&values_block[..n]);

        let mut table = MeltTable::with_values(uuid, values);
        table.position = self.position;
        table.values_size = self.values_size;
        table.offsets_size = self.offsets_size;
        table.flags = if self.death_mark != 0 {
            StateFlags::DIRTY | StateFlags::DEAD
        } else {
            StateFlags::DIRTY
        };
        Ok(table)
    }
}

/// The 48-byte notice written at the start of every tables file.
pub fn header_notice() -> [u8; HEADER_SIZE] {
    let mut out = [0u8; HEADER_SIZE];
    out[..NOTICE_OPEN.len()].copy_from_slice(NOTICE_OPEN);
    out[VERSION_OFFSET] = FORMAT_VERSION;
    out[HEADER_SIZE - NOTICE_CLOSE.len()..].copy_from_slice(NOTICE_CLOSE);
    out
}

/// Write the notice and the `u32` table count.
pub fn write_header(w: &mut dyn Write, count: u32) -> MeltResult<()> {
    w.write_all(&header_notice())
        .map_err(|e| MeltError::io("write tables header", e))?;
    w.write_all(&count.to_le_bytes())
        .map_err(|e| MeltError::io("write table count", e))
}

/// Write one entry: packed record followed by the fixed-size values block.
pub fn write_entry(w: &mut dyn Write, table: &MeltTable) -> MeltResult<()> {
    let record = PackedRecord::from_table(table);
    w.write_all(&record.to_bytes())
        .map_err(|e| MeltError::io(format!("write record of table {}", table.uuid), e))?;
    w.write_all(&table.values[..PERSISTED_VALUES_LEN])
        .map_err(|e| MeltError::io(format!("write values of table {}", table.uuid), e))
}

/// Read the notice and the table count.
///
/// Only the version byte of the notice is checked; a different version is a
/// [`MeltError::Validation`] error.
pub fn read_header(r: &mut dyn Read) -> MeltResult<u32> {
    let mut notice = [0u8; HEADER_SIZE];
    r.read_exact(&mut notice)
        .map_err(|e| MeltError::io("read tables header", e))?;
    let version = notice[VERSION_OFFSET];
    if version != FORMAT_VERSION {
        return Err(MeltError::validation(format!(
            "unsupported tables file version {version}, expected {FORMAT_VERSION}"
        )));
    }
    let mut count = [0u8; 4];
    r.read_exact(&mut count)
        .map_err(|e| MeltError::io("read table count", e))?;
    Ok(u32::from_le_bytes(count))
}

/// Read one entry. `index` is only used for error messages.
pub fn read_entry(r: &mut dyn Read, index: u32) -> MeltResult<MeltTable> {
    let mut record = [0u8; RECORD_SIZE];
    r.read_exact(&mut record)
        .map_err(|e| MeltError::io(format!("read record of table at index {index}"), e))?;
    let mut values = vec![0u8; PERSISTED_VALUES_LEN];
    r.read_exact(&mut values).map_err(|e| {
        MeltError::io(format!("read values of table at index {index}"), e)
    })?;
    PackedRecord::from_bytes(&record).into_table(&values)
}

#[cfg(test)]
#[path = "../../tests/unit/table/codec.rs"]
mod tests;
